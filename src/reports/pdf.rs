use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::reports::layout::{Page, PageGeometry};
use crate::reports::ReportError;

/// Render laid-out pages into a PDF document.
pub fn render(title: &str, pages: &[Page], geometry: PageGeometry) -> Result<Vec<u8>, ReportError> {
    let width = Mm(geometry.width);
    let height = Mm(geometry.height);

    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "Tresc");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|err| ReportError::Render(err.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|err| ReportError::Render(err.to_string()))?;

    for (index, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, "Tresc")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for line in &page.lines {
            let font = if line.style.bold() { &bold } else { &regular };
            layer.use_text(
                line.text.as_str(),
                line.style.font_size(),
                Mm(line.x),
                Mm(line.y),
                font,
            );
        }
    }

    doc.save_to_bytes()
        .map_err(|err| ReportError::Render(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::layout::{paginate, Block, TextStyle};

    #[test]
    fn test_render_produces_pdf() {
        let blocks = vec![
            Block::new().text(TextStyle::Title, "Raport tygodniowy"),
            Block::new().text(TextStyle::Body, "Liczba treningów: 3"),
        ];
        let geometry = PageGeometry::a4();
        let pages = paginate(&blocks, geometry);

        let bytes = render("Raport", &pages, geometry).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
