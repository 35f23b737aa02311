use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::MediaAttachment;
use crate::validation::{
    check_date, latest_training_date, normalize_optional, validate_with, Validate, ValidationErrors,
};

pub const MAX_REFLECTION_CHARS: usize = 2000;

/// A logged workout, always loaded together with its type name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Training {
    pub id: Uuid,
    pub user_id: Uuid,
    pub training_type_id: Uuid,
    pub training_type_name: String,
    pub date: NaiveDate,
    pub duration_minutes: i32,
    /// Perceived effort, 1-10
    pub intensity: i16,
    /// Overall satisfaction, 1-5
    pub rating: i16,
    pub energy_level: Option<i16>,
    pub calories: Option<i32>,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
    pub what_went_well: Option<String>,
    pub what_to_improve: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TrainingDetail {
    #[serde(flatten)]
    pub training: Training,
    pub media: Vec<MediaAttachment>,
}

#[derive(Debug, Serialize)]
pub struct TrainingList {
    pub items: Vec<Training>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TrainingInput {
    pub training_type_id: Uuid,
    pub date: NaiveDate,
    #[validate(range(min = 1, max = 1440, message = "must be between 1 and 1440 minutes"))]
    pub duration_minutes: i32,
    #[validate(range(min = 1, max = 10, message = "must be between 1 and 10"))]
    pub intensity: i16,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub rating: i16,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub energy_level: Option<i16>,
    #[validate(range(min = 0, max = 20000, message = "must be between 0 and 20000"))]
    pub calories: Option<i32>,
    #[validate(range(min = 0.0, max = 1000.0, message = "must be between 0 and 1000 km"))]
    pub distance_km: Option<f64>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub notes: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub what_went_well: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub what_to_improve: Option<String>,
}

impl TrainingInput {
    pub fn validated(self, today: NaiveDate) -> Result<Self, ValidationErrors> {
        let input = Self {
            notes: normalize_optional(self.notes),
            what_went_well: normalize_optional(self.what_went_well),
            what_to_improve: normalize_optional(self.what_to_improve),
            ..self
        };

        validate_with(&input, |errors| {
            check_date(errors, "date", input.date, Some(latest_training_date(today)));
        })?;

        Ok(input)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TrainingQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub type_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> TrainingInput {
        TrainingInput {
            training_type_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            duration_minutes: 60,
            intensity: 7,
            rating: 4,
            energy_level: Some(3),
            calories: Some(450),
            distance_km: Some(10.5),
            notes: Some("  Interwały 6x400m  ".to_string()),
            what_went_well: Some("".to_string()),
            what_to_improve: None,
        }
    }

    #[test]
    fn test_valid_training_is_normalized() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let training = input().validated(today).unwrap();

        assert_eq!(training.notes.as_deref(), Some("Interwały 6x400m"));
        assert_eq!(training.what_went_well, None);
    }

    #[test]
    fn test_training_ranges() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let mut bad = input();
        bad.duration_minutes = 0;
        bad.intensity = 11;
        bad.rating = 0;
        bad.energy_level = Some(6);
        bad.distance_km = Some(1000.5);
        bad.notes = Some("ą".repeat(MAX_REFLECTION_CHARS + 1));

        let errors = bad.validated(today).unwrap_err();
        let fields = errors.field_errors();
        for field in ["duration_minutes", "intensity", "rating", "energy_level", "distance_km", "notes"] {
            assert!(fields.contains_key(field), "expected error for {field}");
        }
        assert!(!fields.contains_key("calories"));
    }

    #[test]
    fn test_training_date_may_be_tomorrow_but_not_later() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        let mut tomorrow = input();
        tomorrow.date = NaiveDate::from_ymd_opt(2024, 5, 11).unwrap();
        assert!(tomorrow.validated(today).is_ok());

        let mut later = input();
        later.date = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        assert!(later.validated(today).unwrap_err().field_errors().contains_key("date"));
    }

    #[test]
    fn test_reflections_are_counted_in_characters() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let mut polish = input();
        polish.what_to_improve = Some("ż".repeat(MAX_REFLECTION_CHARS));

        assert!(polish.validated(today).is_ok());
    }

    #[test]
    fn test_out_of_range_years_are_rejected() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let mut ancient = input();
        ancient.date = NaiveDate::from_ymd_opt(1024, 5, 10).unwrap();

        let errors = ancient.validated(today).unwrap_err();
        assert_eq!(errors.field_errors()["date"][0].code, "date_range");
    }
}
