//! Wide→long feature reshaping.
//!
//! The merged dataset carries one `<metric>_<ccy>` column per currency;
//! models want one observation per (date, currency). The currency list is
//! discovered from the `avg_tone_*` columns — their complete absence is a
//! caller-configuration error and the one fatal condition in this crate.

use levante_traits::types::column_dates;
use levante_traits::{Date, LevanteError, Result};
use ndarray::Array2;
use polars::prelude::*;

/// One (date, currency) observation in model feature space.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    /// Observation date.
    pub date: Date,
    /// Currency ticker, uppercase.
    pub currency: String,
    /// Mean event tone for the day.
    pub avg_tone: f64,
    /// Event count for the day.
    pub event_count: f64,
    /// Tone dispersion for the day.
    pub tone_dispersion: f64,
    /// Realized next-day return, when known.
    pub next_day_return: Option<f64>,
}

/// Reshape a wide feature table into long form, one row per
/// (date, currency).
///
/// Missing feature cells become `0.0` (a day without events carries no
/// signal, not a hole). The realized-return column for a currency is
/// resolved from `<ccy>_ret`, the bare uppercase ticker, or a shared
/// `next_day_return` column, in that order.
///
/// # Errors
///
/// Returns [`LevanteError::NoFeatureColumns`] when the table has no
/// `avg_tone_*` columns at all, and an error if the date column is
/// missing.
pub fn wide_to_long(wide: &DataFrame) -> Result<Vec<FeatureRow>> {
    let mut currencies: Vec<String> = wide
        .get_column_names()
        .iter()
        .filter_map(|name| name.as_str().strip_prefix("avg_tone_"))
        .map(str::to_string)
        .collect();
    currencies.sort();
    if currencies.is_empty() {
        return Err(LevanteError::NoFeatureColumns);
    }

    let date_col = if wide.column("event_date").is_ok() {
        "event_date"
    } else {
        "date"
    };
    let dates = column_dates(wide, date_col)?;

    let shared_returns = optional_f64(wide, "next_day_return")?;

    let mut rows = Vec::with_capacity(dates.len() * currencies.len());
    for ccy in &currencies {
        let tones = optional_f64(wide, &format!("avg_tone_{ccy}"))?;
        let counts = optional_f64(wide, &format!("event_count_{ccy}"))?;
        let dispersions = optional_f64(wide, &format!("tone_dispersion_{ccy}"))?;

        let returns = match optional_f64(wide, &format!("{ccy}_ret"))? {
            Some(r) => Some(r),
            None => optional_f64(wide, &ccy.to_ascii_uppercase())?,
        }
        .or_else(|| shared_returns.clone());

        for (i, date) in dates.iter().enumerate() {
            rows.push(FeatureRow {
                date: *date,
                currency: ccy.to_ascii_uppercase(),
                avg_tone: cell(&tones, i),
                event_count: cell(&counts, i),
                tone_dispersion: cell(&dispersions, i),
                next_day_return: returns.as_ref().and_then(|r| r[i]),
            });
        }
    }
    Ok(rows)
}

/// Feature matrix for a set of rows, columns in
/// [`levante_traits::FEATURE_ORDER`].
#[must_use]
pub fn feature_matrix(rows: &[FeatureRow]) -> Array2<f64> {
    let mut matrix = Array2::zeros((rows.len(), 3));
    for (i, row) in rows.iter().enumerate() {
        matrix[[i, 0]] = row.avg_tone;
        matrix[[i, 1]] = row.event_count;
        matrix[[i, 2]] = row.tone_dispersion;
    }
    matrix
}

fn optional_f64(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
    match df.column(name) {
        Ok(column) => Ok(Some(
            column.as_materialized_series().f64()?.into_iter().collect(),
        )),
        Err(_) => Ok(None),
    }
}

fn cell(values: &Option<Vec<Option<f64>>>, i: usize) -> f64 {
    values
        .as_ref()
        .and_then(|v| v.get(i).copied().flatten())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use levante_traits::types::dates_to_column;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn wide_frame() -> DataFrame {
        let dates = vec![date(2021, 3, 1), date(2021, 3, 2)];
        DataFrame::new(vec![
            dates_to_column("event_date", &dates),
            Series::new("avg_tone_try".into(), vec![-2.0, 0.5]).into_column(),
            Series::new("event_count_try".into(), vec![4.0, 3.0]).into_column(),
            Series::new("tone_dispersion_try".into(), vec![0.5, 0.1]).into_column(),
            Float64Chunked::from_slice_options("try_ret".into(), &[Some(0.01), None])
                .into_series()
                .into_column(),
            Series::new("avg_tone_brl".into(), vec![1.0, 1.5]).into_column(),
            Series::new("brl_ret".into(), vec![0.02, 0.03]).into_column(),
        ])
        .unwrap()
    }

    #[test]
    fn test_wide_to_long_shapes_and_values() {
        let rows = wide_to_long(&wide_frame()).unwrap();
        // 2 currencies × 2 dates, currencies alphabetical.
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].currency, "BRL");
        assert_eq!(rows[2].currency, "TRY");

        let try_d1 = &rows[2];
        assert_eq!(try_d1.date, date(2021, 3, 1));
        assert_relative_eq!(try_d1.avg_tone, -2.0);
        assert_relative_eq!(try_d1.event_count, 4.0);
        assert_relative_eq!(try_d1.tone_dispersion, 0.5);
        assert_eq!(try_d1.next_day_return, Some(0.01));
        assert_eq!(rows[3].next_day_return, None);
    }

    #[test]
    fn test_missing_feature_columns_fill_zero() {
        let rows = wide_to_long(&wide_frame()).unwrap();
        // BRL has no event_count/dispersion columns at all.
        let brl = &rows[0];
        assert_relative_eq!(brl.event_count, 0.0);
        assert_relative_eq!(brl.tone_dispersion, 0.0);
        assert_relative_eq!(brl.avg_tone, 1.0);
    }

    #[test]
    fn test_no_feature_columns_is_fatal() {
        let df = df! { "date" => &[1i32], "x" => &[2.0] }.unwrap();
        assert!(matches!(
            wide_to_long(&df),
            Err(LevanteError::NoFeatureColumns)
        ));
    }

    #[test]
    fn test_feature_matrix_order() {
        let rows = vec![FeatureRow {
            date: date(2021, 3, 1),
            currency: "TRY".to_string(),
            avg_tone: 1.0,
            event_count: 2.0,
            tone_dispersion: 3.0,
            next_day_return: None,
        }];
        let matrix = feature_matrix(&rows);
        assert_eq!(matrix.shape(), &[1, 3]);
        // [avg_tone, event_count, tone_dispersion]
        assert_relative_eq!(matrix[[0, 0]], 1.0);
        assert_relative_eq!(matrix[[0, 1]], 2.0);
        assert_relative_eq!(matrix[[0, 2]], 3.0);
    }
}
