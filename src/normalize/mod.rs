//! Schema normalization for the flight and weather tables.
//!
//! This module holds the shared best-effort coercions both normalizers
//! are built from. Every coercion maps an unusable value to a null
//! instead of raising; hard errors are reserved for structural problems
//! (a column that vanished mid-operation).

pub mod flights;
pub mod time;
pub mod weather;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Days between 0001-01-01 (CE) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%z",
];

pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

pub(crate) fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|n| n.as_str() == name)
}

/// First column whose name contains `needle`, in frame order.
pub(crate) fn find_column_containing(df: &DataFrame, needle: &str) -> Option<String> {
    df.get_column_names()
        .iter()
        .find(|n| n.as_str().contains(needle))
        .map(|n| n.as_str().to_string())
}

/// Builds a `Date` series from an iterator of optional calendar dates.
pub(crate) fn date_series(
    name: &str,
    values: impl Iterator<Item = Option<NaiveDate>>,
) -> Series {
    let days = values.map(|d| d.map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE));
    Int32Chunked::from_iter_options(name.into(), days)
        .into_date()
        .into_series()
}

/// Builds a millisecond `Datetime` series from optional naive timestamps.
pub(crate) fn datetime_series(
    name: &str,
    values: impl Iterator<Item = Option<NaiveDateTime>>,
) -> Series {
    let millis = values.map(|dt| dt.map(|dt| dt.and_utc().timestamp_millis()));
    Int64Chunked::from_iter_options(name.into(), millis)
        .into_datetime(TimeUnit::Milliseconds, None)
        .into_series()
}

/// Element-wise numeric coercion to `Float64`; anything that is not a
/// number (or a string spelling one) becomes null.
pub(crate) fn coerce_numeric(column: &Column, name: &str) -> Series {
    let values = column.as_materialized_series().iter().map(|av| match av {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(v as f64),
        AnyValue::Int16(v) => Some(v as f64),
        AnyValue::Int32(v) => Some(v as f64),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(v as f64),
        AnyValue::UInt16(v) => Some(v as f64),
        AnyValue::UInt32(v) => Some(v as f64),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(v as f64),
        AnyValue::Float64(v) => Some(v),
        AnyValue::Boolean(v) => Some(v as i64 as f64),
        AnyValue::String(s) => s.trim().parse::<f64>().ok(),
        AnyValue::StringOwned(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });
    Float64Chunked::from_iter_options(name.into(), values).into_series()
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    parse_datetime_str(s).map(|dt| dt.date())
}

fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    None
}

/// Coerces an arbitrary column to a `Date` column named `name`; invalid
/// entries become null and a non-coercible dtype yields an all-null
/// column of the same height.
pub(crate) fn coerce_to_date(column: &Column, name: &str) -> PolarsResult<Series> {
    match column.dtype() {
        DataType::Date => Ok(column
            .as_materialized_series()
            .clone()
            .with_name(name.into())),
        DataType::Datetime(_, _) => Ok(column
            .cast(&DataType::Date)?
            .as_materialized_series()
            .clone()
            .with_name(name.into())),
        DataType::String => {
            let ca = column.str()?;
            Ok(date_series(name, ca.iter().map(|s| s.and_then(parse_date_str))))
        }
        _ => Ok(Int32Chunked::full_null(name.into(), column.len())
            .into_date()
            .into_series()),
    }
}

/// Coerces an arbitrary column to a millisecond `Datetime` column named
/// `name`, with the same null-on-invalid posture as [`coerce_to_date`].
pub(crate) fn coerce_to_datetime(column: &Column, name: &str) -> PolarsResult<Series> {
    match column.dtype() {
        DataType::Datetime(_, _) => Ok(column
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            .as_materialized_series()
            .clone()
            .with_name(name.into())),
        DataType::Date => Ok(column
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            .as_materialized_series()
            .clone()
            .with_name(name.into())),
        DataType::String => {
            let ca = column.str()?;
            let values = ca.iter().map(|s| {
                s.and_then(|s| {
                    parse_datetime_str(s)
                        .or_else(|| parse_date_str(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
                })
            });
            Ok(datetime_series(name, values))
        }
        _ => Ok(Int64Chunked::full_null(name.into(), column.len())
            .into_datetime(TimeUnit::Milliseconds, None)
            .into_series()),
    }
}

fn int_in_range(v: Option<f64>, lo: i64, hi: i64) -> Option<i64> {
    let v = v?;
    if !v.is_finite() || v.fract() != 0.0 {
        return None;
    }
    let i = v as i64;
    (lo..=hi).contains(&i).then_some(i)
}

/// Builds a `Date` series named `name` out of `YEAR`/`MONTH`/`DAY`
/// columns; any invalid component nulls the row.
pub(crate) fn date_from_ymd_columns(df: &DataFrame, name: &str) -> PolarsResult<Series> {
    let year = coerce_numeric(df.column(crate::schema::YEAR)?, crate::schema::YEAR);
    let month = coerce_numeric(df.column(crate::schema::MONTH)?, crate::schema::MONTH);
    let day = coerce_numeric(df.column(crate::schema::DAY)?, crate::schema::DAY);

    let year = year.f64()?.to_vec();
    let month = month.f64()?.to_vec();
    let day = day.f64()?.to_vec();

    let dates = year
        .into_iter()
        .zip(month)
        .zip(day)
        .map(|((y, m), d)| {
            let y = int_in_range(y, 1, 9999)?;
            let m = int_in_range(m, 1, 12)?;
            let d = int_in_range(d, 1, 31)?;
            NaiveDate::from_ymd_opt(y as i32, m as u32, d as u32)
        });

    Ok(date_series(name, dates))
}
