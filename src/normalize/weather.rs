//! Weather-table normalization and per-date aggregation.

use anyhow::Result;
use polars::prelude::*;
use tracing::{info, warn};

use crate::schema;

use super::{coerce_to_date, date_from_ymd_columns, has_column, is_numeric_dtype};

/// Derives the `DATE` key, canonicalizes the station column, and
/// collapses the table to one row per date holding the mean of every
/// numeric column.
///
/// With no numeric columns or no derivable date the raw table passes
/// through unaggregated, which makes the later merge many-to-many; that
/// condition is logged, not raised.
pub fn normalize_weather(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;

    derive_weather_date(&mut df)?;
    canonicalize_station(&mut df)?;

    let numeric_cols: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .collect();

    if numeric_cols.is_empty() || !has_column(&df, schema::DATE) {
        warn!(
            "No numeric weather columns or no date column; using raw weather for merge (may be many-to-many)"
        );
        return Ok(df);
    }

    let means: Vec<Expr> = numeric_cols.iter().map(|n| col(n.as_str()).mean()).collect();
    let aggregated = df
        .lazy()
        .group_by([col(schema::DATE)])
        .agg(means)
        .sort([schema::DATE], SortMultipleOptions::default())
        .collect()?;

    info!(
        rows = aggregated.height(),
        cols = aggregated.width(),
        "Aggregated weather rows (by date)"
    );
    Ok(aggregated)
}

/// Same date derivation as the flight side, targeting `DATE`.
fn derive_weather_date(df: &mut DataFrame) -> Result<()> {
    let has_ymd = has_column(df, schema::YEAR)
        && has_column(df, schema::MONTH)
        && has_column(df, schema::DAY);

    if !has_column(df, schema::DATE) && has_ymd {
        let date = date_from_ymd_columns(df, schema::DATE)?;
        df.with_column(date)?;
    } else if has_column(df, schema::DATE) {
        let date = coerce_to_date(df.column(schema::DATE)?, schema::DATE)?;
        df.with_column(date)?;
    }
    Ok(())
}

fn canonicalize_station(df: &mut DataFrame) -> Result<()> {
    if has_column(df, schema::STATION) && !has_column(df, schema::ORIGIN) {
        // Assumes station codes share the flight ORIGIN code space; this
        // is not verified against the flight table.
        warn!("Renaming STATION to ORIGIN on unverified code-space match");
        df.rename(schema::STATION, schema::ORIGIN.into())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use polars::df;

    #[test]
    fn test_aggregates_to_mean_per_date() {
        let raw = df!(
            "DATE" => ["2022-01-01", "2022-01-01", "2022-01-02"],
            "TMAX" => [50.0f64, 60.0, 40.0],
            "PRCP" => [0.0f64, 1.0, 0.5]
        )
        .unwrap();
        let out = normalize_weather(raw).unwrap();

        assert_eq!(out.height(), 2);
        let tmax: Vec<Option<f64>> = out.column("TMAX").unwrap().f64().unwrap().to_vec();
        assert_eq!(tmax, vec![Some(55.0), Some(40.0)]);
    }

    #[test]
    fn test_one_row_per_distinct_date() {
        let raw = df!(
            "DATE" => ["2022-02-01", "2022-02-01", "2022-02-01", "2022-02-02"],
            "TMAX" => [1.0f64, 2.0, 3.0, 4.0]
        )
        .unwrap();
        let out = normalize_weather(raw).unwrap();
        assert_eq!(out.height(), 2);

        let dates: Vec<Option<NaiveDate>> = out
            .column("DATE")
            .unwrap()
            .date()
            .unwrap()
            .as_date_iter()
            .collect();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2022, 2, 1));
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2022, 2, 2));
    }

    #[test]
    fn test_date_from_ymd_fallback() {
        let raw = df!(
            "YEAR" => [2022i64, 2022],
            "MONTH" => [3i64, 3],
            "DAY" => [5i64, 5],
            "TMIN" => [10.0f64, 20.0]
        )
        .unwrap();
        let out = normalize_weather(raw).unwrap();
        assert_eq!(out.height(), 1);
        let tmin: Vec<Option<f64>> = out.column("TMIN").unwrap().f64().unwrap().to_vec();
        assert_eq!(tmin, vec![Some(15.0)]);
    }

    #[test]
    fn test_station_renamed_to_origin() {
        let raw = df!(
            "DATE" => ["2022-01-01"],
            "STATION" => ["BOS"],
            "TMAX" => [50.0f64]
        )
        .unwrap();
        let out = normalize_weather(raw).unwrap();
        // aggregation keeps only DATE + numeric columns, so check before
        // aggregation via a frame with no numerics
        let raw2 = df!("STATION" => ["BOS"], "NOTE" => ["x"]).unwrap();
        let out2 = normalize_weather(raw2).unwrap();
        assert!(has_column(&out2, "ORIGIN"));
        assert!(!has_column(&out2, "STATION"));
        assert!(!has_column(&out, "STATION"));
    }

    #[test]
    fn test_no_numeric_columns_passes_through() {
        let raw = df!(
            "DATE" => ["2022-01-01", "2022-01-01"],
            "CONDITION" => ["rain", "snow"]
        )
        .unwrap();
        let out = normalize_weather(raw).unwrap();
        assert_eq!(out.height(), 2);
        assert!(has_column(&out, "CONDITION"));
    }
}
