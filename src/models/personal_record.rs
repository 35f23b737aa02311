use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::MediaAttachment;
use crate::validation::{check_date, normalize_optional, validate_with, Validate, ValidationErrors};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PersonalRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_name: String,
    pub result_value: f64,
    pub unit: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PersonalRecordDetail {
    #[serde(flatten)]
    pub record: PersonalRecord,
    pub media: Vec<MediaAttachment>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PersonalRecordInput {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub activity_name: String,
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
    pub result_value: f64,
    #[validate(length(min = 1, max = 20, message = "must be between 1 and 20 characters"))]
    pub unit: String,
    pub date: NaiveDate,
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub notes: Option<String>,
}

impl PersonalRecordInput {
    pub fn validated(self, today: NaiveDate) -> Result<Self, ValidationErrors> {
        let input = Self {
            activity_name: self.activity_name.trim().to_string(),
            unit: self.unit.trim().to_string(),
            notes: normalize_optional(self.notes),
            ..self
        };

        validate_with(&input, |errors| check_date(errors, "date", input.date, Some(today)))?;

        Ok(input)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PersonalRecordQuery {
    pub activity: Option<String>,
}

/// Per-activity overview for the records page.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivitySummary {
    pub activity_name: String,
    pub records: i64,
    pub max_value: f64,
    pub min_value: f64,
    pub last_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personal_record_validation() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let input = PersonalRecordInput {
            activity_name: " Martwy ciąg ".to_string(),
            result_value: 140.0,
            unit: "kg".to_string(),
            date: today,
            notes: None,
        };
        let valid = input.clone().validated(today).unwrap();
        assert_eq!(valid.activity_name, "Martwy ciąg");

        let errors = PersonalRecordInput {
            result_value: 0.0,
            unit: " ".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            ..input
        }
        .validated(today)
        .unwrap_err();

        let fields = errors.field_errors();
        assert!(fields.contains_key("result_value"));
        assert!(fields.contains_key("unit"));
        assert_eq!(fields["date"][0].code, "future_date");
        assert!(!fields.contains_key("activity_name"));
    }
}
