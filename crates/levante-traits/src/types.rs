//! Common types and date helpers used throughout the levante pipeline.
//!
//! Every table in the pipeline is indexed by calendar date only — no
//! time-of-day component survives past the ingestion boundary.

use polars::prelude::*;

use crate::{LevanteError, Result};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// Days from 0001-01-01 (CE) to the Unix epoch, 1970-01-01.
///
/// Polars stores `Date` columns as days since the Unix epoch while chrono
/// counts days from CE, so every conversion between the two crosses this
/// offset.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Convert a calendar date to days since the Unix epoch.
#[must_use]
pub fn date_to_epoch_days(date: Date) -> i32 {
    use chrono::Datelike;
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

/// Convert days since the Unix epoch back to a calendar date.
#[must_use]
pub fn date_from_epoch_days(days: i32) -> Option<Date> {
    Date::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
}

/// Parse a date string in YYYY-MM-DD format.
///
/// # Errors
///
/// Returns [`LevanteError::InvalidDate`] if the string does not parse.
pub fn parse_date(date_str: &str) -> Result<Date> {
    Date::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|e| LevanteError::InvalidDate(format!("{date_str}: {e}")))
}

/// All calendar dates in `[start, end]` inclusive, ascending.
///
/// An inverted range yields an empty vector.
#[must_use]
pub fn date_range(start: Date, end: Date) -> Vec<Date> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

/// Build a Polars `Date` column from calendar dates.
#[must_use]
pub fn dates_to_column(name: &str, dates: &[Date]) -> Column {
    let days: Vec<i32> = dates.iter().map(|d| date_to_epoch_days(*d)).collect();
    Int32Chunked::from_vec(name.into(), days)
        .into_series()
        .cast(&DataType::Date)
        .expect("i32 to Date cast is infallible")
        .into_column()
}

/// Extract a `Date` column from a DataFrame as calendar dates.
///
/// # Errors
///
/// Returns an error if the column is absent, not of `Date` dtype, or
/// contains a null entry.
pub fn column_dates(df: &DataFrame, name: &str) -> Result<Vec<Date>> {
    let col = df
        .column(name)
        .map_err(|_| LevanteError::MissingColumn(name.to_string()))?;
    let dates = col.as_materialized_series().date()?;
    dates
        .into_iter()
        .map(|d: Option<i32>| {
            d.and_then(date_from_epoch_days)
                .ok_or_else(|| LevanteError::InvalidData(format!("null or out-of-range {name}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_day_round_trip() {
        let date = Date::from_ymd_opt(2021, 6, 15).unwrap();
        let days = date_to_epoch_days(date);
        assert_eq!(date_from_epoch_days(days), Some(date));
    }

    #[test]
    fn test_epoch_origin() {
        let epoch = Date::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(date_to_epoch_days(epoch), 0);
    }

    #[test]
    fn test_parse_date() {
        use chrono::Datelike;
        let date = parse_date("2024-01-15").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("not-a-date").is_err());
        assert!(parse_date("2024-13-01").is_err());
    }

    #[test]
    fn test_date_range_inclusive() {
        let start = Date::from_ymd_opt(2021, 2, 27).unwrap();
        let end = Date::from_ymd_opt(2021, 3, 2).unwrap();
        let dates = date_range(start, end);
        assert_eq!(dates.len(), 4);
        assert_eq!(dates[0], start);
        assert_eq!(dates[3], end);
    }

    #[test]
    fn test_date_range_inverted_is_empty() {
        let start = Date::from_ymd_opt(2021, 3, 2).unwrap();
        let end = Date::from_ymd_opt(2021, 2, 27).unwrap();
        assert!(date_range(start, end).is_empty());
    }

    #[test]
    fn test_date_column_round_trip() {
        let dates = vec![
            Date::from_ymd_opt(2020, 1, 1).unwrap(),
            Date::from_ymd_opt(2020, 1, 2).unwrap(),
        ];
        let df = DataFrame::new(vec![dates_to_column("date", &dates)]).unwrap();
        let extracted = column_dates(&df, "date").unwrap();
        assert_eq!(extracted, dates);
    }

    #[test]
    fn test_column_dates_missing_column() {
        let df = DataFrame::default();
        assert!(column_dates(&df, "date").is_err());
    }
}
