use chrono::{Datelike, Duration, NaiveDate};
use clap::ValueEnum;
use serde::Deserialize;

use crate::error::{OpsError, Result};
use crate::models::DateRange;

/// Named windows offered by the dashboard filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    Last7,
    Last30,
    ThisYear,
    LastYear,
    /// Spans the dates present in the loaded data.
    All,
}

impl Preset {
    /// Resolves the preset relative to `reference`. `All` has no data to look
    /// at here and falls back to the reference month.
    pub fn resolve(self, reference: NaiveDate) -> DateRange {
        self.resolve_with(reference, std::iter::empty())
    }

    pub fn resolve_with<I>(self, reference: NaiveDate, dataset: I) -> DateRange
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        match self {
            Preset::Today => single_day(reference),
            Preset::Yesterday => single_day(reference - Duration::days(1)),
            Preset::ThisWeek => week_bounds(reference),
            Preset::LastWeek => week_bounds(reference - Duration::days(7)),
            Preset::ThisMonth => month_bounds(reference),
            Preset::LastMonth => month_bounds(first_of_month(reference) - Duration::days(1)),
            Preset::Last7 => DateRange {
                start: reference - Duration::days(6),
                end: reference,
            },
            Preset::Last30 => DateRange {
                start: reference - Duration::days(29),
                end: reference,
            },
            Preset::ThisYear => year_bounds(reference),
            Preset::LastYear => year_bounds(first_of_year(reference) - Duration::days(1)),
            Preset::All => {
                let mut bounds: Option<(NaiveDate, NaiveDate)> = None;
                for date in dataset {
                    bounds = Some(match bounds {
                        Some((min, max)) => (min.min(date), max.max(date)),
                        None => (date, date),
                    });
                }
                match bounds {
                    Some((start, end)) => DateRange { start, end },
                    None => month_bounds(reference),
                }
            }
        }
    }
}

/// Calendar period used to bucket evolution charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Period {
    Week,
    Month,
}

impl Period {
    /// Sortable bucket key: `2024-W07` for ISO weeks, `2024-02` for months.
    pub fn key(&self, date: NaiveDate) -> String {
        match self {
            Period::Week => iso_week_label(date),
            Period::Month => format!("{:04}-{:02}", date.year(), date.month()),
        }
    }
}

pub fn iso_week_label(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Parses and validates a user-supplied range.
pub fn parse_range(start: &str, end: &str) -> Result<DateRange> {
    let start_date = parse_iso_date(start).ok_or_else(|| OpsError::InvalidDate(start.to_string()))?;
    let end_date = parse_iso_date(end).ok_or_else(|| OpsError::InvalidDate(end.to_string()))?;
    if start_date > end_date {
        return Err(OpsError::InvertedRange {
            start: start_date,
            end: end_date,
        });
    }
    Ok(DateRange {
        start: start_date,
        end: end_date,
    })
}

/// Every day from `start` to `end` inclusive. Malformed or inverted input
/// yields an empty list; callers reject that before allocating.
pub fn enumerate_days(start: &str, end: &str) -> Vec<NaiveDate> {
    match (parse_iso_date(start), parse_iso_date(end)) {
        (Some(start), Some(end)) => days_between(start, end),
        _ => Vec::new(),
    }
}

pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day <= end).collect()
}

/// Sunday that opens the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

pub fn week_bounds(date: NaiveDate) -> DateRange {
    let start = week_start(date);
    DateRange {
        start,
        end: start + Duration::days(6),
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

/// Day zero of the following month.
pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    let into_next_month = first_of_month(date) + Duration::days(31);
    first_of_month(into_next_month) - Duration::days(1)
}

pub fn month_bounds(date: NaiveDate) -> DateRange {
    DateRange {
        start: first_of_month(date),
        end: last_of_month(date),
    }
}

fn first_of_year(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.ordinal0()))
}

fn year_bounds(date: NaiveDate) -> DateRange {
    let start = first_of_year(date);
    let length = if NaiveDate::from_ymd_opt(date.year(), 2, 29).is_some() {
        366
    } else {
        365
    };
    DateRange {
        start,
        end: start + Duration::days(length - 1),
    }
}

fn single_day(date: NaiveDate) -> DateRange {
    DateRange {
        start: date,
        end: date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange { start, end }
    }

    #[test]
    fn enumerates_inclusive_days() {
        assert_eq!(enumerate_days("2024-01-01", "2024-01-01"), vec![date(2024, 1, 1)]);
        assert!(enumerate_days("2024-01-05", "2024-01-01").is_empty());
        assert_eq!(
            enumerate_days("2024-02-28", "2024-03-01"),
            vec![date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)]
        );
        assert_eq!(enumerate_days("2023-02-28", "2023-03-01").len(), 2);
    }

    #[test]
    fn malformed_days_yield_nothing() {
        assert!(enumerate_days("2024-13-01", "2024-12-31").is_empty());
        assert!(enumerate_days("01/02/2024", "2024-02-05").is_empty());
        assert!(enumerate_days("", "").is_empty());
    }

    #[test]
    fn parse_range_rejects_inverted_and_malformed() {
        assert!(matches!(
            parse_range("2024-01-05", "2024-01-01"),
            Err(OpsError::InvertedRange { .. })
        ));
        assert!(matches!(
            parse_range("2024-1-5x", "2024-01-01"),
            Err(OpsError::InvalidDate(_))
        ));
        let ok = parse_range(" 2024-01-01 ", "2024-01-31").unwrap();
        assert_eq!(ok.day_count(), 31);
    }

    #[test]
    fn this_month_handles_leap_years() {
        assert_eq!(
            Preset::ThisMonth.resolve(date(2024, 2, 15)),
            range(date(2024, 2, 1), date(2024, 2, 29))
        );
        assert_eq!(
            Preset::ThisMonth.resolve(date(2023, 2, 15)),
            range(date(2023, 2, 1), date(2023, 2, 28))
        );
        assert_eq!(
            Preset::ThisMonth.resolve(date(2024, 12, 31)),
            range(date(2024, 12, 1), date(2024, 12, 31))
        );
    }

    #[test]
    fn last_month_crosses_year_boundary() {
        assert_eq!(
            Preset::LastMonth.resolve(date(2024, 1, 10)),
            range(date(2023, 12, 1), date(2023, 12, 31))
        );
        assert_eq!(
            Preset::LastMonth.resolve(date(2024, 3, 31)),
            range(date(2024, 2, 1), date(2024, 2, 29))
        );
    }

    #[test]
    fn weeks_run_sunday_to_saturday() {
        let wednesday = date(2024, 5, 15);
        assert_eq!(wednesday.weekday(), Weekday::Wed);

        let week = Preset::ThisWeek.resolve(wednesday);
        assert_eq!(week, range(date(2024, 5, 12), date(2024, 5, 18)));
        assert_eq!(week.start.weekday(), Weekday::Sun);
        assert_eq!(week.end.weekday(), Weekday::Sat);
        assert_eq!(week.day_count(), 7);

        let sunday = date(2024, 5, 12);
        assert_eq!(Preset::ThisWeek.resolve(sunday).start, sunday);

        assert_eq!(
            Preset::LastWeek.resolve(wednesday),
            range(date(2024, 5, 5), date(2024, 5, 11))
        );
    }

    #[test]
    fn rolling_windows_include_reference() {
        let reference = date(2024, 3, 1);
        assert_eq!(Preset::Today.resolve(reference), range(reference, reference));
        assert_eq!(
            Preset::Yesterday.resolve(reference),
            range(date(2024, 2, 29), date(2024, 2, 29))
        );
        assert_eq!(Preset::Last7.resolve(reference), range(date(2024, 2, 24), reference));
        assert_eq!(Preset::Last7.resolve(reference).day_count(), 7);
        assert_eq!(Preset::Last30.resolve(reference).day_count(), 30);
    }

    #[test]
    fn years_span_january_to_december() {
        assert_eq!(
            Preset::ThisYear.resolve(date(2024, 7, 4)),
            range(date(2024, 1, 1), date(2024, 12, 31))
        );
        assert_eq!(
            Preset::LastYear.resolve(date(2024, 1, 1)),
            range(date(2023, 1, 1), date(2023, 12, 31))
        );
    }

    #[test]
    fn all_uses_dataset_bounds_or_this_month() {
        let reference = date(2024, 2, 15);
        let dataset = vec![date(2024, 1, 9), date(2023, 11, 2), date(2024, 2, 3)];
        assert_eq!(
            Preset::All.resolve_with(reference, dataset),
            range(date(2023, 11, 2), date(2024, 2, 3))
        );
        assert_eq!(Preset::All.resolve(reference), Preset::ThisMonth.resolve(reference));
    }

    #[test]
    fn period_keys_sort_chronologically() {
        assert_eq!(Period::Month.key(date(2024, 2, 9)), "2024-02");
        assert_eq!(Period::Week.key(date(2024, 2, 14)), "2024-W07");
        assert_eq!(iso_week_label(date(2024, 12, 30)), "2025-W01");
        assert!(Period::Week.key(date(2024, 1, 8)) < Period::Week.key(date(2024, 3, 4)));
    }
}
