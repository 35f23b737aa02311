use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{normalize_optional, Validate, ValidationErrors};

/// A category label for trainings. Defaults have no owner and are read-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainingType {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TrainingTypeInput {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub name: String,
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    pub icon: Option<String>,
}

impl TrainingTypeInput {
    /// Trim fields and check lengths.
    pub fn validated(self) -> Result<Self, ValidationErrors> {
        let input = Self {
            name: self.name.trim().to_string(),
            description: normalize_optional(self.description),
            icon: normalize_optional(self.icon),
        };

        input.validate()?;
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_type_input_is_trimmed() {
        let input = TrainingTypeInput {
            name: "  Wspinaczka ".to_string(),
            description: Some("   ".to_string()),
            icon: None,
        }
        .validated()
        .unwrap();

        assert_eq!(input.name, "Wspinaczka");
        assert_eq!(input.description, None);
    }

    #[test]
    fn test_training_type_name_limits() {
        let errors = TrainingTypeInput {
            name: "x".repeat(51),
            description: None,
            icon: None,
        }
        .validated()
        .unwrap_err();
        assert!(errors.field_errors().contains_key("name"));

        let errors = TrainingTypeInput {
            name: "   ".to_string(),
            description: None,
            icon: None,
        }
        .validated()
        .unwrap_err();
        assert_eq!(errors.field_errors()["name"][0].code, "length");
    }
}
