//! Request validation shared by the resource handlers.
//!
//! Per-field rules are derived with `validator`; the helpers here cover the
//! checks that need context (today's date) or span several fields.

use std::borrow::Cow;

use chrono::{Datelike, NaiveDate};
pub use validator::{Validate, ValidationError, ValidationErrors};

/// Dates outside these years are rejected before any calendar arithmetic.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 9999;

pub fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// A single failed field, for checks made outside a derived `validate()`.
pub fn invalid_field(
    field: &'static str,
    code: &'static str,
    message: impl Into<Cow<'static, str>>,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, field_error(code, message));
    errors
}

/// Run the derived rules, then let `extra` add context-dependent errors.
pub fn validate_with<T, F>(input: &T, extra: F) -> Result<(), ValidationErrors>
where
    T: Validate,
    F: FnOnce(&mut ValidationErrors),
{
    let mut errors = match input.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };
    extra(&mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn is_plausible_date(date: NaiveDate) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

/// Record an error when `date` is outside the supported years or after `latest`.
pub fn check_date(errors: &mut ValidationErrors, field: &'static str, date: NaiveDate, latest: Option<NaiveDate>) {
    if !is_plausible_date(date) {
        errors.add(
            field,
            field_error("date_range", format!("year must be between {MIN_YEAR} and {MAX_YEAR}")),
        );
    } else if latest.is_some_and(|latest| date > latest) {
        errors.add(field, field_error("future_date", "cannot be in the future"));
    }
}

/// Dates taken from query strings.
pub fn query_date(field: &'static str, date: NaiveDate) -> Result<NaiveDate, ValidationErrors> {
    if is_plausible_date(date) {
        Ok(date)
    } else {
        Err(invalid_field(
            field,
            "date_range",
            format!("year must be between {MIN_YEAR} and {MAX_YEAR}"),
        ))
    }
}

/// Trim, and turn blank strings into `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp list paging parameters to `1..=100` items and a non-negative offset.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

/// Trainings may be logged for tomorrow at most (time zones of the client).
pub fn latest_training_date(today: NaiveDate) -> NaiveDate {
    today.succ_opt().unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_check_date() {
        let mut errors = ValidationErrors::new();
        check_date(&mut errors, "date", d(2024, 5, 10), Some(d(2024, 5, 10)));
        assert!(errors.is_empty());

        check_date(&mut errors, "date", d(2024, 5, 11), Some(d(2024, 5, 10)));
        check_date(&mut errors, "deadline", d(1899, 12, 31), None);
        let fields = errors.field_errors();
        assert_eq!(fields["date"][0].code, "future_date");
        assert_eq!(fields["deadline"][0].code, "date_range");
    }

    #[test]
    fn test_query_date_rejects_extreme_years() {
        assert_eq!(query_date("date", d(2024, 5, 10)).unwrap(), d(2024, 5, 10));
        assert!(query_date("date", NaiveDate::MAX).is_err());
        assert!(query_date("date", NaiveDate::MIN).is_err());

        let parsed: NaiveDate = "+262142-12-31".parse().unwrap();
        let errors = query_date("date", parsed).unwrap_err();
        assert!(errors.field_errors().contains_key("date"));
    }

    #[test]
    fn test_invalid_field_carries_message() {
        let errors = invalid_field("month", "range", "must be between 1 and 12");
        let fields = errors.field_errors();
        assert_eq!(
            fields["month"][0].message.as_deref(),
            Some("must be between 1 and 12")
        );
    }

    #[test]
    fn test_latest_training_date() {
        assert_eq!(latest_training_date(d(2024, 2, 28)), d(2024, 2, 29));
        assert_eq!(latest_training_date(NaiveDate::MAX), NaiveDate::MAX);
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(None, None), (20, 0));
        assert_eq!(page_bounds(Some(0), Some(-5)), (1, 0));
        assert_eq!(page_bounds(Some(500), Some(40)), (100, 40));
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(
            normalize_optional(Some(" notatka ".to_string())),
            Some("notatka".to_string())
        );
        assert_eq!(normalize_email("  Jan@Example.COM "), "jan@example.com");
    }
}
