//! Flight-table normalization.
//!
//! Takes the raw upper-cased flight table and derives the canonical
//! columns downstream stages rely on. Every step is best-effort: a step
//! whose prerequisite columns are absent is skipped (or produces nulls),
//! never an error. After this pass `DEP_DELAY_MIN` and `CANCELLED_FLAG`
//! are guaranteed to exist, the latter with no nulls.

use anyhow::Result;
use polars::prelude::*;
use tracing::info;

use crate::schema;

use super::{
    coerce_numeric, coerce_to_date, coerce_to_datetime, date_from_ymd_columns,
    find_column_containing, has_column,
};
use super::time::hhmm_to_datetime;

pub fn normalize_flights(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;

    derive_flight_date(&mut df)?;
    coerce_time_hour(&mut df)?;
    derive_timestamps(&mut df)?;
    derive_delay_minutes(&mut df)?;
    derive_cancelled_flag(&mut df)?;
    canonicalize_airline(&mut df)?;

    let keep: Vec<&str> = schema::FLIGHT_KEEP_COLUMNS
        .iter()
        .copied()
        .filter(|c| has_column(&df, c))
        .collect();
    let out = df.select(keep)?;

    info!(rows = out.height(), cols = out.width(), "Flights after prep");
    Ok(out)
}

/// FL_DATE comes from YEAR/MONTH/DAY when those exist and no FL_DATE
/// column does; otherwise an existing FL_DATE is coerced in place.
fn derive_flight_date(df: &mut DataFrame) -> Result<()> {
    let has_ymd = has_column(df, schema::YEAR)
        && has_column(df, schema::MONTH)
        && has_column(df, schema::DAY);

    if has_ymd && !has_column(df, schema::FL_DATE) {
        let date = date_from_ymd_columns(df, schema::FL_DATE)?;
        df.with_column(date)?;
    } else if has_column(df, schema::FL_DATE) {
        let date = coerce_to_date(df.column(schema::FL_DATE)?, schema::FL_DATE)?;
        df.with_column(date)?;
    }
    Ok(())
}

fn coerce_time_hour(df: &mut DataFrame) -> Result<()> {
    if has_column(df, schema::TIME_HOUR) {
        let ts = coerce_to_datetime(df.column(schema::TIME_HOUR)?, schema::TIME_HOUR)?;
        df.with_column(ts)?;
    }
    Ok(())
}

fn derive_timestamps(df: &mut DataFrame) -> Result<()> {
    if !has_column(df, schema::FL_DATE) {
        return Ok(());
    }
    for (raw, derived) in schema::TIME_COLUMN_MAP {
        if !has_column(df, raw) {
            continue;
        }
        let ts = hhmm_to_datetime(
            df.column(schema::FL_DATE)?,
            Some(df.column(raw)?),
            derived,
        )?;
        df.with_column(ts)?;
    }
    Ok(())
}

/// DEP_DELAY_MIN: explicit DEP_DELAY column when present, else the
/// difference of the two derived departure timestamps, else all-null.
fn derive_delay_minutes(df: &mut DataFrame) -> Result<()> {
    if has_column(df, schema::DEP_DELAY) {
        let delay = coerce_numeric(df.column(schema::DEP_DELAY)?, schema::DEP_DELAY_MIN);
        df.with_column(delay)?;
        return Ok(());
    }

    if has_column(df, schema::ACTUAL_DEP_DATETIME) && has_column(df, schema::SCHED_DEP_DATETIME) {
        let actual = df.column(schema::ACTUAL_DEP_DATETIME)?.datetime()?;
        let sched = df.column(schema::SCHED_DEP_DATETIME)?.datetime()?;
        let minutes = actual
            .as_datetime_iter()
            .zip(sched.as_datetime_iter())
            .map(|(a, s)| {
                let (a, s) = (a?, s?);
                Some((a - s).num_seconds() as f64 / 60.0)
            });
        let delay =
            Float64Chunked::from_iter_options(schema::DEP_DELAY_MIN.into(), minutes)
                .into_series();
        df.with_column(delay)?;
        return Ok(());
    }

    let delay = Float64Chunked::full_null(schema::DEP_DELAY_MIN.into(), df.height());
    df.with_column(delay.into_series())?;
    Ok(())
}

/// CANCELLED_FLAG from the first column containing "CANCEL", else
/// inferred from missing actual departure + arrival timestamps.
fn derive_cancelled_flag(df: &mut DataFrame) -> Result<()> {
    let flags: Vec<i32> = if let Some(cancel_col) = find_column_containing(df, schema::CANCEL_MARKER)
    {
        let nums = coerce_numeric(df.column(&cancel_col)?, schema::CANCELLED_FLAG);
        nums.f64()?
            .into_iter()
            .map(|v| match v {
                Some(x) if x != 0.0 => 1,
                _ => 0,
            })
            .collect()
    } else {
        let dep_missing = null_mask(df, schema::ACTUAL_DEP_DATETIME)?;
        let arr_missing = null_mask(df, schema::ACTUAL_ARR_DATETIME)?;
        dep_missing
            .into_iter()
            .zip(arr_missing)
            .map(|(d, a)| (d && a) as i32)
            .collect()
    };

    let flag = Int32Chunked::from_vec(schema::CANCELLED_FLAG.into(), flags);
    df.with_column(flag.into_series())?;
    Ok(())
}

/// Per-row null mask for a column; an absent column counts as all-missing.
fn null_mask(df: &DataFrame, name: &str) -> Result<Vec<bool>> {
    if !has_column(df, name) {
        return Ok(vec![true; df.height()]);
    }
    Ok(df
        .column(name)?
        .is_null()
        .into_iter()
        .map(|v| v.unwrap_or(true))
        .collect())
}

fn canonicalize_airline(df: &mut DataFrame) -> Result<()> {
    if has_column(df, schema::AIRLINE) {
        return Ok(());
    }
    for candidate in schema::AIRLINE_PRIORITY {
        if has_column(df, candidate) {
            df.rename(candidate, schema::AIRLINE.into())?;
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use polars::df;

    #[test]
    fn test_date_from_ymd_when_no_fl_date() {
        let raw = df!(
            "YEAR" => [2022i64, 2022],
            "MONTH" => [1i64, 6],
            "DAY" => [2i64, 30]
        )
        .unwrap();
        let out = normalize_flights(raw).unwrap();
        let dates: Vec<Option<NaiveDate>> = out
            .column("FL_DATE")
            .unwrap()
            .date()
            .unwrap()
            .as_date_iter()
            .collect();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2022, 1, 2));
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2022, 6, 30));
    }

    #[test]
    fn test_existing_fl_date_coerced_with_invalid_null() {
        let raw = df!("FL_DATE" => ["2022-01-02", "not-a-date"]).unwrap();
        let out = normalize_flights(raw).unwrap();
        let dates: Vec<Option<NaiveDate>> = out
            .column("FL_DATE")
            .unwrap()
            .date()
            .unwrap()
            .as_date_iter()
            .collect();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2022, 1, 2));
        assert_eq!(dates[1], None);
    }

    #[test]
    fn test_delay_prefers_explicit_column() {
        let raw = df!(
            "FL_DATE" => ["2022-01-02", "2022-01-02"],
            "CRS_DEP_TIME" => [900i64, 900],
            "DEP_TIME" => [915i64, 930],
            "DEP_DELAY" => ["-3", "oops"]
        )
        .unwrap();
        let out = normalize_flights(raw).unwrap();
        let delay: Vec<Option<f64>> = out.column("DEP_DELAY_MIN").unwrap().f64().unwrap().to_vec();
        assert_eq!(delay, vec![Some(-3.0), None]);
    }

    #[test]
    fn test_delay_computed_from_timestamps() {
        let raw = df!(
            "FL_DATE" => ["2022-01-02", "2022-01-02"],
            "CRS_DEP_TIME" => [900i64, 2330],
            "DEP_TIME" => [915i64, 2345]
        )
        .unwrap();
        let out = normalize_flights(raw).unwrap();
        let delay: Vec<Option<f64>> = out.column("DEP_DELAY_MIN").unwrap().f64().unwrap().to_vec();
        assert_eq!(delay, vec![Some(15.0), Some(15.0)]);
    }

    #[test]
    fn test_delay_all_null_without_sources() {
        let raw = df!("FL_DATE" => ["2022-01-02"]).unwrap();
        let out = normalize_flights(raw).unwrap();
        let col = out.column("DEP_DELAY_MIN").unwrap();
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn test_explicit_cancel_column_coerced_to_0_or_1() {
        let raw = df!(
            "FL_DATE" => ["2022-01-02", "2022-01-02", "2022-01-02", "2022-01-02"],
            "CANCELLED" => [Some("1"), Some("0"), None, Some("2")]
        )
        .unwrap();
        let out = normalize_flights(raw).unwrap();
        let flags: Vec<Option<i32>> =
            out.column("CANCELLED_FLAG").unwrap().i32().unwrap().to_vec();
        assert_eq!(flags, vec![Some(1), Some(0), Some(0), Some(1)]);
    }

    #[test]
    fn test_inferred_cancellation_from_missing_actuals() {
        let raw = df!(
            "FL_DATE" => ["2022-01-02", "2022-01-02", "2022-01-02"],
            "CRS_DEP_TIME" => [900i64, 900, 900],
            "DEP_TIME" => [Some("915"), None, None],
            "ARR_TIME" => [Some("1030"), Some("1040"), None]
        )
        .unwrap();
        let out = normalize_flights(raw).unwrap();
        let flags: Vec<Option<i32>> =
            out.column("CANCELLED_FLAG").unwrap().i32().unwrap().to_vec();
        // cancelled only when both actual timestamps are missing
        assert_eq!(flags, vec![Some(0), Some(0), Some(1)]);
        assert_eq!(out.column("CANCELLED_FLAG").unwrap().null_count(), 0);
    }

    #[test]
    fn test_airline_rename_priority() {
        let raw = df!(
            "FL_DATE" => ["2022-01-02"],
            "CARRIER" => ["AA"],
            "OP_CARRIER" => ["ZZ"]
        )
        .unwrap();
        let out = normalize_flights(raw).unwrap();
        let airline: Vec<Option<&str>> = out
            .column("AIRLINE")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(airline, vec![Some("AA")]);
    }

    #[test]
    fn test_existing_airline_not_overridden() {
        let raw = df!(
            "FL_DATE" => ["2022-01-02"],
            "AIRLINE" => ["B6"],
            "CARRIER" => ["AA"]
        )
        .unwrap();
        let out = normalize_flights(raw).unwrap();
        let airline: Vec<Option<&str>> = out
            .column("AIRLINE")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(airline, vec![Some("B6")]);
    }

    #[test]
    fn test_projection_drops_unknown_columns() {
        let raw = df!(
            "FL_DATE" => ["2022-01-02"],
            "UNRELATED" => ["x"],
            "DEST" => ["BOS"]
        )
        .unwrap();
        let out = normalize_flights(raw).unwrap();
        assert!(!has_column(&out, "UNRELATED"));
        assert!(has_column(&out, "DEST"));
        assert!(has_column(&out, "DEP_DELAY_MIN"));
        assert!(has_column(&out, "CANCELLED_FLAG"));
    }
}
