use chrono::{Datelike, NaiveDate};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{month_bounds, week_bounds, MediaEntity};
use crate::reports::{
    build_pdf, monthly_report, training_report, weekly_report, MonthlyReportData, ReportFile,
};
use crate::services::media_service::attachments_for;
use crate::services::{GoalService, PersonalRecordService, TrainingService};
use crate::validation::{invalid_field, query_date, MAX_YEAR, MIN_YEAR};

#[derive(Clone)]
pub struct ReportService {
    trainings: TrainingService,
    goals: GoalService,
    records: PersonalRecordService,
    db: sqlx::PgPool,
}

impl ReportService {
    pub fn new(
        db: sqlx::PgPool,
        trainings: TrainingService,
        goals: GoalService,
        records: PersonalRecordService,
    ) -> Self {
        Self {
            trainings,
            goals,
            records,
            db,
        }
    }

    pub async fn training_report(
        &self,
        user_id: Uuid,
        training_id: Uuid,
        today: NaiveDate,
    ) -> Result<ReportFile, ApiError> {
        let training = self.trainings.get_training(user_id, training_id).await?;
        let attachments = attachments_for(&self.db, MediaEntity::Training, training.id)
            .await?
            .len();

        let file_name = format!("trening-{}.pdf", training.date);
        let blocks = training_report(&training, attachments, today);
        let report = build_pdf("Raport treningu".to_string(), file_name, blocks).await?;

        info!(user_id = %user_id, training_id = %training_id, "Training report generated");
        Ok(report)
    }

    /// Report for the ISO week containing `date`.
    pub async fn weekly_report(&self, user_id: Uuid, date: NaiveDate) -> Result<ReportFile, ApiError> {
        let date = query_date("date", date)?;
        let (from, to) = week_bounds(date)
            .ok_or_else(|| invalid_field("date", "date_range", "week is out of range"))?;
        let trainings = self.trainings.trainings_between(user_id, from, to).await?;

        let week = from.iso_week();
        let file_name = format!("raport-tygodniowy-{}-W{:02}.pdf", week.year(), week.week());
        let blocks = weekly_report(from, to, &trainings);
        let report = build_pdf("Raport tygodniowy".to_string(), file_name, blocks).await?;

        info!(user_id = %user_id, week = %format!("{}-W{:02}", week.year(), week.week()), "Weekly report generated");
        Ok(report)
    }

    pub async fn monthly_report(
        &self,
        user_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<ReportFile, ApiError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(invalid_field(
                "year",
                "date_range",
                format!("must be between {MIN_YEAR} and {MAX_YEAR}"),
            )
            .into());
        }
        let (from, to) = month_bounds(year, month)
            .ok_or_else(|| invalid_field("month", "range", "must be between 1 and 12"))?;

        let data = MonthlyReportData {
            year,
            month,
            from,
            to,
            trainings: self.trainings.trainings_between(user_id, from, to).await?,
            goals: self.goals.goals_for_period(user_id, from, to).await?,
            records: self.records.records_between(user_id, from, to).await?,
        };

        let file_name = format!("raport-miesieczny-{year}-{month:02}.pdf");
        let blocks = monthly_report(&data);
        let report = build_pdf("Raport miesięczny".to_string(), file_name, blocks).await?;

        info!(user_id = %user_id, year, month, "Monthly report generated");
        Ok(report)
    }
}
