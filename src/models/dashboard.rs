use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{GoalResponse, PersonalRecord, Training};

/// Aggregates over a date range, as computed by the database.
#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct PeriodTotals {
    pub trainings: i64,
    pub total_minutes: i64,
    pub average_rating: Option<f64>,
    pub average_intensity: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodStats {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(flatten)]
    pub totals: PeriodTotals,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TypeDistribution {
    pub training_type_id: Uuid,
    pub training_type_name: String,
    pub trainings: i64,
    pub total_minutes: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Streaks {
    pub current: i64,
    pub longest: i64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub week: PeriodStats,
    pub month: PeriodStats,
    pub total_trainings: i64,
    pub streaks: Streaks,
    pub month_by_type: Vec<TypeDistribution>,
    pub active_goals: Vec<GoalResponse>,
    pub recent_trainings: Vec<Training>,
    pub recent_personal_records: Vec<PersonalRecord>,
}

/// Monday and Sunday of the ISO week containing `date`; `None` at the edges of the calendar.
pub fn week_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let monday =
        date.checked_sub_signed(Duration::days(date.weekday().num_days_from_monday() as i64))?;
    let sunday = monday.checked_add_signed(Duration::days(6))?;
    Some((monday, sunday))
}

/// First and last day of the month; `None` for an invalid year/month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Streaks of consecutive training days.
///
/// `days` must be distinct and sorted ascending. The current streak counts
/// back from today, or from yesterday when nothing was logged today yet.
pub fn compute_streaks(days: &[NaiveDate], today: NaiveDate) -> Streaks {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &day in days {
        run = match previous {
            Some(prev) if day - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }

    let mut current = 0;
    let relevant = days.iter().rev().skip_while(|day| **day > today);
    let mut expected = match days.iter().rev().find(|day| **day <= today) {
        Some(&last) if last == today || Some(last) == today.pred_opt() => last,
        _ => return Streaks { current, longest },
    };
    for &day in relevant {
        if day != expected {
            break;
        }
        current += 1;
        match day.pred_opt() {
            Some(prev) => expected = prev,
            None => break,
        }
    }

    Streaks { current, longest }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_week_bounds() {
        // 2024-05-15 is a Wednesday
        assert_eq!(week_bounds(d(2024, 5, 15)), Some((d(2024, 5, 13), d(2024, 5, 19))));
        assert_eq!(week_bounds(d(2024, 5, 13)), Some((d(2024, 5, 13), d(2024, 5, 19))));
        assert_eq!(week_bounds(d(2024, 5, 19)), Some((d(2024, 5, 13), d(2024, 5, 19))));
        assert_eq!(week_bounds(d(2025, 1, 1)), Some((d(2024, 12, 30), d(2025, 1, 5))));
    }

    #[test]
    fn test_calendar_edges_do_not_panic() {
        let far_future: NaiveDate = "+262142-12-31".parse().unwrap();
        assert_eq!(week_bounds(far_future), None);
        assert_eq!(week_bounds(NaiveDate::MAX), None);
        assert_eq!(month_bounds(NaiveDate::MAX.year(), 12), None);

        let streaks = compute_streaks(&[NaiveDate::MIN], NaiveDate::MIN);
        assert_eq!(streaks, Streaks { current: 1, longest: 1 });
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(2024, 2), Some((d(2024, 2, 1), d(2024, 2, 29))));
        assert_eq!(month_bounds(2023, 12), Some((d(2023, 12, 1), d(2023, 12, 31))));
        assert_eq!(month_bounds(2023, 13), None);
    }

    #[test]
    fn test_streak_ending_today() {
        let days = [d(2024, 5, 1), d(2024, 5, 2), d(2024, 5, 8), d(2024, 5, 9), d(2024, 5, 10)];
        assert_eq!(
            compute_streaks(&days, d(2024, 5, 10)),
            Streaks { current: 3, longest: 3 }
        );
    }

    #[test]
    fn test_streak_ending_yesterday_still_counts() {
        let days = [d(2024, 5, 8), d(2024, 5, 9)];
        assert_eq!(compute_streaks(&days, d(2024, 5, 10)).current, 2);
    }

    #[test]
    fn test_broken_streak() {
        let days = [d(2024, 5, 1), d(2024, 5, 2), d(2024, 5, 3), d(2024, 5, 7)];
        assert_eq!(
            compute_streaks(&days, d(2024, 5, 10)),
            Streaks { current: 0, longest: 3 }
        );
    }

    #[test]
    fn test_future_entries_are_ignored_for_current_streak() {
        let days = [d(2024, 5, 9), d(2024, 5, 10), d(2024, 5, 11)];
        let streaks = compute_streaks(&days, d(2024, 5, 10));
        assert_eq!(streaks.current, 2);
        assert_eq!(streaks.longest, 3);
    }

    #[test]
    fn test_no_trainings() {
        assert_eq!(compute_streaks(&[], d(2024, 5, 10)), Streaks::default());
    }
}
