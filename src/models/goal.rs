use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::validation::{
    check_date, field_error, normalize_optional, validate_with, Validate, ValidationErrors,
};

/// At most this many goals may be `active` at once.
pub const MAX_ACTIVE_GOALS: i64 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Achieved,
    Abandoned,
}

#[derive(Error, Debug)]
#[error("unknown goal status: {0}")]
pub struct UnknownGoalStatus(String);

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Achieved => "achieved",
            GoalStatus::Abandoned => "abandoned",
        }
    }
}

impl TryFrom<String> for GoalStatus {
    type Error = UnknownGoalStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(GoalStatus::Active),
            "achieved" => Ok(GoalStatus::Achieved),
            "abandoned" => Ok(GoalStatus::Abandoned),
            _ => Err(UnknownGoalStatus(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub unit: Option<String>,
    pub deadline: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub status: GoalStatus,
    pub achieved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn progress_percentage(&self) -> Option<f64> {
        progress_percentage(self.current_value, self.target_value)
    }
}

#[derive(Debug, Serialize)]
pub struct GoalResponse {
    #[serde(flatten)]
    pub goal: Goal,
    pub progress_percentage: Option<f64>,
    pub days_remaining: Option<i64>,
}

impl GoalResponse {
    pub fn new(goal: Goal, today: NaiveDate) -> Self {
        let progress_percentage = goal.progress_percentage();
        let days_remaining = match goal.status {
            GoalStatus::Active => goal.deadline.map(|deadline| (deadline - today).num_days()),
            _ => None,
        };

        Self {
            goal,
            progress_percentage,
            days_remaining,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GoalInput {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub title: String,
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
    pub target_value: Option<f64>,
    #[validate(range(min = 0.0, message = "must be 0 or greater"))]
    pub current_value: Option<f64>,
    #[validate(length(max = 20, message = "must be at most 20 characters"))]
    pub unit: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub status: Option<GoalStatus>,
}

impl GoalInput {
    /// `today` is only used for new goals, whose deadline may not already be gone.
    pub fn validated(self, new_goal_today: Option<NaiveDate>) -> Result<Self, ValidationErrors> {
        let input = Self {
            title: self.title.trim().to_string(),
            description: normalize_optional(self.description),
            unit: normalize_optional(self.unit),
            ..self
        };

        validate_with(&input, |errors| {
            if input.target_value.is_some() && input.unit.is_none() {
                errors.add("unit", field_error("required", "is required when a target value is set"));
            }
            if let Some(deadline) = input.deadline {
                // existing goals may keep a deadline that has since passed
                check_date(errors, "deadline", deadline, None);
                if new_goal_today.is_some_and(|today| deadline < today) {
                    errors.add("deadline", field_error("past_date", "cannot be in the past"));
                }
            }
        })?;

        Ok(input)
    }
}

#[derive(Debug, Deserialize)]
pub struct GoalProgressInput {
    pub current_value: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct GoalQuery {
    pub status: Option<GoalStatus>,
}

/// Progress towards the target, capped at 100. Absent without a positive target.
pub fn progress_percentage(current: Option<f64>, target: Option<f64>) -> Option<f64> {
    let target = target.filter(|target| *target > 0.0)?;
    let current = current.unwrap_or(0.0);
    Some(((current / target) * 100.0).clamp(0.0, 100.0))
}

/// An active goal whose target has been reached becomes achieved.
pub fn resolve_status(requested: GoalStatus, current: Option<f64>, target: Option<f64>) -> GoalStatus {
    match (requested, current, target) {
        (GoalStatus::Active, Some(current), Some(target)) if current >= target => GoalStatus::Achieved,
        (status, _, _) => status,
    }
}

/// Keep the original achievement time while a goal stays achieved.
pub fn resolve_achieved_at(
    status: GoalStatus,
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match status {
        GoalStatus::Achieved => Some(previous.unwrap_or(now)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_goal_progress_calculation() {
        assert_eq!(progress_percentage(Some(200.0), Some(400.0)), Some(50.0));
        assert_eq!(progress_percentage(Some(400.0), Some(400.0)), Some(100.0));
        assert_eq!(progress_percentage(Some(450.0), Some(400.0)), Some(100.0));
        assert_eq!(progress_percentage(None, Some(10.0)), Some(0.0));
        assert_eq!(progress_percentage(Some(5.0), None), None);
    }

    #[test]
    fn test_reaching_target_achieves_goal() {
        assert_eq!(
            resolve_status(GoalStatus::Active, Some(42.2), Some(42.2)),
            GoalStatus::Achieved
        );
        assert_eq!(
            resolve_status(GoalStatus::Active, Some(20.0), Some(42.2)),
            GoalStatus::Active
        );
        assert_eq!(
            resolve_status(GoalStatus::Abandoned, Some(50.0), Some(42.2)),
            GoalStatus::Abandoned
        );
        assert_eq!(resolve_status(GoalStatus::Active, None, None), GoalStatus::Active);
    }

    #[test]
    fn test_achieved_at_is_sticky() {
        let earlier = Utc::now() - chrono::Duration::days(3);
        let now = Utc::now();

        assert_eq!(resolve_achieved_at(GoalStatus::Achieved, Some(earlier), now), Some(earlier));
        assert_eq!(resolve_achieved_at(GoalStatus::Achieved, None, now), Some(now));
        assert_eq!(resolve_achieved_at(GoalStatus::Active, Some(earlier), now), None);
    }

    #[test]
    fn test_goal_validation() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let input = GoalInput {
            title: "  Maraton poniżej 4h ".to_string(),
            description: None,
            target_value: Some(240.0),
            current_value: None,
            unit: None,
            deadline: NaiveDate::from_ymd_opt(2024, 5, 1),
            status: None,
        };

        let errors = input.clone().validated(Some(today)).unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields["unit"][0].code, "required");
        assert_eq!(fields["deadline"][0].code, "past_date");

        // existing goals may keep a past deadline
        let errors = input.validated(None).unwrap_err();
        assert!(!errors.field_errors().contains_key("deadline"));
    }

    #[test]
    fn test_goal_value_ranges() {
        let input = GoalInput {
            title: "Przysiad".to_string(),
            description: None,
            target_value: Some(0.0),
            current_value: Some(-1.0),
            unit: Some("kg".to_string()),
            deadline: NaiveDate::from_ymd_opt(12000, 1, 1),
            status: None,
        };

        let errors = input.validated(None).unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("target_value"));
        assert!(fields.contains_key("current_value"));
        assert_eq!(fields["deadline"][0].code, "date_range");
        assert!(!fields.contains_key("unit"));
    }

    #[test]
    fn test_days_remaining_only_for_active_goals() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let goal = Goal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "10 km".to_string(),
            description: None,
            target_value: Some(10.0),
            current_value: Some(4.0),
            unit: Some("km".to_string()),
            deadline: NaiveDate::from_ymd_opt(2024, 6, 11),
            status: GoalStatus::Active,
            achieved_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response = GoalResponse::new(goal.clone(), today);
        assert_eq!(response.days_remaining, Some(10));
        assert_eq!(response.progress_percentage, Some(40.0));

        let abandoned = Goal {
            status: GoalStatus::Abandoned,
            ..goal
        };
        assert_eq!(GoalResponse::new(abandoned, today).days_remaining, None);
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [GoalStatus::Active, GoalStatus::Achieved, GoalStatus::Abandoned] {
            assert_eq!(GoalStatus::try_from(status.as_str().to_string()).unwrap(), status);
        }
        assert!(GoalStatus::try_from("paused".to_string()).is_err());
    }
}
