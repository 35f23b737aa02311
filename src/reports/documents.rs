//! Report content: which blocks make up each report.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{week_bounds, Goal, GoalStatus, PersonalRecord, Training};
use crate::reports::layout::{Block, TextStyle};

const MONTHS: [&str; 12] = [
    "styczeń",
    "luty",
    "marzec",
    "kwiecień",
    "maj",
    "czerwiec",
    "lipiec",
    "sierpień",
    "wrzesień",
    "październik",
    "listopad",
    "grudzień",
];

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSummary {
    pub name: String,
    pub trainings: usize,
    pub minutes: i64,
}

/// Aggregates over a list of trainings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub trainings: usize,
    pub total_minutes: i64,
    pub average_rating: Option<f64>,
    pub average_intensity: Option<f64>,
    pub total_distance_km: f64,
    pub total_calories: i64,
    pub by_type: Vec<TypeSummary>,
}

impl Summary {
    pub fn from_trainings(trainings: &[Training]) -> Self {
        if trainings.is_empty() {
            return Self::default();
        }

        let count = trainings.len();
        let mut by_type: BTreeMap<&str, TypeSummary> = BTreeMap::new();
        for training in trainings {
            let entry = by_type
                .entry(training.training_type_name.as_str())
                .or_insert_with(|| TypeSummary {
                    name: training.training_type_name.clone(),
                    trainings: 0,
                    minutes: 0,
                });
            entry.trainings += 1;
            entry.minutes += i64::from(training.duration_minutes);
        }
        let mut by_type: Vec<TypeSummary> = by_type.into_values().collect();
        by_type.sort_by(|a, b| b.trainings.cmp(&a.trainings).then_with(|| a.name.cmp(&b.name)));

        Self {
            trainings: count,
            total_minutes: trainings.iter().map(|t| i64::from(t.duration_minutes)).sum(),
            average_rating: Some(
                trainings.iter().map(|t| f64::from(t.rating)).sum::<f64>() / count as f64,
            ),
            average_intensity: Some(
                trainings.iter().map(|t| f64::from(t.intensity)).sum::<f64>() / count as f64,
            ),
            total_distance_km: trainings.iter().filter_map(|t| t.distance_km).sum(),
            total_calories: trainings
                .iter()
                .filter_map(|t| t.calories)
                .map(i64::from)
                .sum(),
            by_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub trainings: usize,
    pub minutes: i64,
}

/// ISO weeks overlapping `from..=to`, clipped to that range.
pub fn weekly_breakdown(from: NaiveDate, to: NaiveDate, trainings: &[Training]) -> Vec<WeekSummary> {
    let mut weeks = Vec::new();
    let Some((mut monday, _)) = week_bounds(from) else {
        return weeks;
    };

    while monday <= to {
        let week_from = monday.max(from);
        let week_to = monday
            .checked_add_signed(Duration::days(6))
            .map_or(to, |sunday| sunday.min(to));
        let in_week: Vec<&Training> = trainings
            .iter()
            .filter(|t| t.date >= week_from && t.date <= week_to)
            .collect();

        weeks.push(WeekSummary {
            from: week_from,
            to: week_to,
            trainings: in_week.len(),
            minutes: in_week.iter().map(|t| i64::from(t.duration_minutes)).sum(),
        });
        match monday.checked_add_signed(Duration::days(7)) {
            Some(next) => monday = next,
            None => break,
        }
    }

    weeks
}

pub struct MonthlyReportData {
    pub year: i32,
    pub month: u32,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub trainings: Vec<Training>,
    pub goals: Vec<Goal>,
    pub records: Vec<PersonalRecord>,
}

pub fn month_name(month: u32) -> &'static str {
    MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

pub fn format_minutes(minutes: i64) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h} h"),
        (h, m) => format!("{h} h {m} min"),
    }
}

/// Up to two decimals, without trailing zeros.
pub fn format_number(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn summary_block(summary: &Summary) -> Block {
    let mut block = Block::new()
        .text(TextStyle::Heading, "Podsumowanie")
        .field("Liczba treningów", Some(summary.trainings.to_string()))
        .field("Łączny czas", Some(format_minutes(summary.total_minutes)))
        .field("Średnia ocena", summary.average_rating.map(|v| format!("{}/5", format_number(v))))
        .field(
            "Średnia intensywność",
            summary.average_intensity.map(|v| format!("{}/10", format_number(v))),
        );
    if summary.total_distance_km > 0.0 {
        block = block.field("Dystans", Some(format!("{} km", format_number(summary.total_distance_km))));
    }
    if summary.total_calories > 0 {
        block = block.field("Kalorie", Some(format!("{} kcal", summary.total_calories)));
    }
    block
}

fn type_block(summary: &Summary) -> Block {
    let heading = Block::new().text(TextStyle::Heading, "Rodzaje treningów");
    if summary.by_type.is_empty() {
        return heading.text(TextStyle::Body, "Brak danych.");
    }
    summary.by_type.iter().fold(heading, |block, entry| {
        block.indented_text(
            TextStyle::Body,
            4.0,
            &format!(
                "{}: {} ({})",
                entry.name,
                entry.trainings,
                format_minutes(entry.minutes)
            ),
        )
    })
}

fn training_block(training: &Training) -> Block {
    Block::new()
        .text(
            TextStyle::Heading,
            &format!("{} - {}", format_date(training.date), training.training_type_name),
        )
        .field("Czas trwania", Some(format_minutes(i64::from(training.duration_minutes))))
        .field("Intensywność", Some(format!("{}/10", training.intensity)))
        .field("Ocena", Some(format!("{}/5", training.rating)))
        .field("Poziom energii", training.energy_level.map(|v| format!("{v}/5")))
        .field("Dystans", training.distance_km.map(|v| format!("{} km", format_number(v))))
        .field("Kalorie", training.calories.map(|v| format!("{v} kcal")))
        .field("Notatki", training.notes.clone())
        .field("Co poszło dobrze", training.what_went_well.clone())
        .field("Co poprawić", training.what_to_improve.clone())
}

fn reflection_block(heading: &str, text: &Option<String>) -> Option<Block> {
    text.as_deref().map(|text| {
        Block::new()
            .splittable()
            .text(TextStyle::Heading, heading)
            .text(TextStyle::Body, text)
    })
}

/// Blocks of a single-training report.
pub fn training_report(training: &Training, attachments: usize, generated: NaiveDate) -> Vec<Block> {
    let mut blocks = vec![
        Block::new()
            .text(TextStyle::Title, "Raport treningu")
            .text(
                TextStyle::Small,
                &format!("{} - {}", format_date(training.date), training.training_type_name),
            )
            .space_after(6.0),
        Block::new()
            .text(TextStyle::Heading, "Szczegóły")
            .field("Data", Some(format_date(training.date)))
            .field("Rodzaj", Some(training.training_type_name.clone()))
            .field("Czas trwania", Some(format_minutes(i64::from(training.duration_minutes))))
            .field("Intensywność", Some(format!("{}/10", training.intensity)))
            .field("Ocena", Some(format!("{}/5", training.rating)))
            .field("Poziom energii", training.energy_level.map(|v| format!("{v}/5")))
            .field("Dystans", training.distance_km.map(|v| format!("{} km", format_number(v))))
            .field("Kalorie", training.calories.map(|v| format!("{v} kcal"))),
    ];

    blocks.extend(
        [
            reflection_block("Notatki", &training.notes),
            reflection_block("Co poszło dobrze", &training.what_went_well),
            reflection_block("Co poprawić", &training.what_to_improve),
        ]
        .into_iter()
        .flatten(),
    );

    blocks.push(
        Block::new()
            .text(TextStyle::Small, &format!("Załączniki: {attachments}"))
            .text(TextStyle::Small, &format!("Wygenerowano: {}", format_date(generated))),
    );
    blocks
}

/// Blocks of the report for the ISO week `from..=to`.
pub fn weekly_report(from: NaiveDate, to: NaiveDate, trainings: &[Training]) -> Vec<Block> {
    let summary = Summary::from_trainings(trainings);
    let week = from.iso_week();

    let mut blocks = vec![
        Block::new()
            .text(TextStyle::Title, "Raport tygodniowy")
            .text(
                TextStyle::Small,
                &format!(
                    "Tydzień {}/{}: {} - {}",
                    week.week(),
                    week.year(),
                    format_date(from),
                    format_date(to)
                ),
            )
            .space_after(6.0),
        summary_block(&summary),
        type_block(&summary),
        Block::new().text(TextStyle::Heading, "Treningi").space_after(1.0),
    ];

    if trainings.is_empty() {
        blocks.push(Block::new().text(TextStyle::Body, "Brak treningów w tym tygodniu."));
    } else {
        blocks.extend(trainings.iter().map(training_block));
    }
    blocks
}

/// Blocks of the report for a calendar month.
pub fn monthly_report(data: &MonthlyReportData) -> Vec<Block> {
    let summary = Summary::from_trainings(&data.trainings);

    let mut blocks = vec![
        Block::new()
            .text(TextStyle::Title, "Raport miesięczny")
            .text(
                TextStyle::Small,
                &format!(
                    "{} {}: {} - {}",
                    month_name(data.month),
                    data.year,
                    format_date(data.from),
                    format_date(data.to)
                ),
            )
            .space_after(6.0),
        summary_block(&summary),
    ];

    let weeks = weekly_breakdown(data.from, data.to, &data.trainings);
    blocks.push(weeks.iter().fold(
        Block::new().text(TextStyle::Heading, "Tygodnie"),
        |block, week| {
            block.indented_text(
                TextStyle::Body,
                4.0,
                &format!(
                    "{} - {}: {} treningów, {}",
                    format_date(week.from),
                    format_date(week.to),
                    week.trainings,
                    format_minutes(week.minutes)
                ),
            )
        },
    ));
    blocks.push(type_block(&summary));

    let list = Block::new().splittable().text(TextStyle::Heading, "Treningi");
    blocks.push(if data.trainings.is_empty() {
        list.text(TextStyle::Body, "Brak treningów w tym miesiącu.")
    } else {
        data.trainings.iter().fold(list, |block, t| {
            block.indented_text(
                TextStyle::Body,
                4.0,
                &format!(
                    "{} - {} - {} - intensywność {}/10 - ocena {}/5",
                    format_date(t.date),
                    t.training_type_name,
                    format_minutes(i64::from(t.duration_minutes)),
                    t.intensity,
                    t.rating
                ),
            )
        })
    });

    let goals = Block::new().splittable().text(TextStyle::Heading, "Cele");
    blocks.push(if data.goals.is_empty() {
        goals.text(TextStyle::Body, "Brak celów.")
    } else {
        data.goals.iter().fold(goals, |block, goal| {
            let status = match goal.status {
                GoalStatus::Active => "w trakcie",
                GoalStatus::Achieved => "osiągnięty",
                GoalStatus::Abandoned => "porzucony",
            };
            let progress = goal
                .progress_percentage()
                .map(|p| format!(" ({}%)", format_number(p)))
                .unwrap_or_default();
            block.indented_text(TextStyle::Body, 4.0, &format!("{}: {status}{progress}", goal.title))
        })
    });

    let records = Block::new().splittable().text(TextStyle::Heading, "Rekordy osobiste");
    blocks.push(if data.records.is_empty() {
        records.text(TextStyle::Body, "Brak nowych rekordów.")
    } else {
        data.records.iter().fold(records, |block, record| {
            block.indented_text(
                TextStyle::Body,
                4.0,
                &format!(
                    "{} - {}: {} {}",
                    format_date(record.date),
                    record.activity_name,
                    format_number(record.result_value),
                    record.unit
                ),
            )
        })
    });

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn training(date: NaiveDate, type_name: &str, minutes: i32, rating: i16) -> Training {
        Training {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            training_type_id: Uuid::new_v4(),
            training_type_name: type_name.to_string(),
            date,
            duration_minutes: minutes,
            intensity: 6,
            rating,
            energy_level: None,
            calories: Some(300),
            distance_km: None,
            notes: Some("Spokojne tempo".to_string()),
            what_went_well: None,
            what_to_improve: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn all_text(blocks: &[Block]) -> String {
        blocks
            .iter()
            .flat_map(|block| block.lines.iter().map(|line| line.text.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_summary_from_trainings() {
        let trainings = vec![
            training(d(2024, 5, 13), "Bieganie", 45, 4),
            training(d(2024, 5, 14), "Siłownia", 60, 5),
            training(d(2024, 5, 16), "Bieganie", 30, 3),
        ];
        let summary = Summary::from_trainings(&trainings);

        assert_eq!(summary.trainings, 3);
        assert_eq!(summary.total_minutes, 135);
        assert_eq!(summary.average_rating, Some(4.0));
        assert_eq!(summary.total_calories, 900);
        assert_eq!(summary.by_type[0].name, "Bieganie");
        assert_eq!(summary.by_type[0].trainings, 2);
        assert_eq!(summary.by_type[0].minutes, 75);
    }

    #[test]
    fn test_weekly_breakdown_clips_to_month() {
        let trainings = vec![
            training(d(2024, 5, 1), "Rower", 90, 4),
            training(d(2024, 5, 31), "Joga", 40, 5),
        ];
        let weeks = weekly_breakdown(d(2024, 5, 1), d(2024, 5, 31), &trainings);

        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[0].from, d(2024, 5, 1));
        assert_eq!(weeks[0].to, d(2024, 5, 5));
        assert_eq!(weeks[0].minutes, 90);
        assert_eq!(weeks[4].from, d(2024, 5, 27));
        assert_eq!(weeks[4].to, d(2024, 5, 31));
        assert_eq!(weeks[4].trainings, 1);
    }

    #[test]
    fn test_weekly_breakdown_stops_at_calendar_end() {
        let from = NaiveDate::MAX - Duration::days(30);
        let weeks = weekly_breakdown(from, NaiveDate::MAX, &[]);

        assert!(weeks.len() >= 5);
        assert_eq!(weeks[0].from, from);
        assert_eq!(weeks.last().map(|week| week.to), Some(NaiveDate::MAX));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_minutes(45), "45 min");
        assert_eq!(format_minutes(120), "2 h");
        assert_eq!(format_minutes(95), "1 h 35 min");
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(42.5), "42.5");
        assert_eq!(format_number(3.25), "3.25");
        assert_eq!(month_name(5), "maj");
    }

    #[test]
    fn test_empty_week_report() {
        let text = all_text(&weekly_report(d(2024, 5, 13), d(2024, 5, 19), &[]));
        assert!(text.contains("Raport tygodniowy"));
        assert!(text.contains("Tydzien 20/2024"));
        assert!(text.contains("Brak treningow w tym tygodniu."));
    }

    #[test]
    fn test_monthly_report_sections() {
        let data = MonthlyReportData {
            year: 2024,
            month: 5,
            from: d(2024, 5, 1),
            to: d(2024, 5, 31),
            trainings: vec![training(d(2024, 5, 10), "Pływanie", 50, 4)],
            goals: Vec::new(),
            records: Vec::new(),
        };
        let text = all_text(&monthly_report(&data));

        for section in ["Podsumowanie", "Tygodnie", "Rodzaje treningow", "Treningi", "Cele", "Rekordy osobiste"] {
            assert!(text.contains(section), "missing section {section}");
        }
        assert!(text.contains("maj 2024"));
        assert!(text.contains("Plywanie"));
    }

    #[test]
    fn test_training_report_splits_reflections_into_own_blocks() {
        let mut t = training(d(2024, 5, 10), "Bieganie", 60, 5);
        t.what_to_improve = Some("Lepsza rozgrzewka".to_string());
        let blocks = training_report(&t, 2, d(2024, 5, 11));

        assert_eq!(blocks.len(), 5);
        assert!(!blocks[2].keep_together);
        assert!(all_text(&blocks).contains("Zalaczniki: 2"));
    }
}
