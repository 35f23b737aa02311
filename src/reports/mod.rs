//! PDF reports: single training, ISO week and calendar month.

pub mod documents;
pub mod layout;
pub mod pdf;
pub mod text;

use thiserror::Error;

pub use documents::{monthly_report, training_report, weekly_report, MonthlyReportData, Summary};
pub use layout::{paginate, Block, Page, PageGeometry, TextStyle};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF rendering failed: {0}")]
    Render(String),
    #[error("Report task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A finished report ready to be sent as a download.
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Lay out and render blocks off the async runtime.
pub async fn build_pdf(
    title: String,
    file_name: String,
    blocks: Vec<Block>,
) -> Result<ReportFile, ReportError> {
    let bytes = tokio::task::spawn_blocking(move || {
        let geometry = PageGeometry::a4();
        let pages = paginate(&blocks, geometry);
        pdf::render(&text::transliterate(&title), &pages, geometry)
    })
    .await??;

    Ok(ReportFile { file_name, bytes })
}
