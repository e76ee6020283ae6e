//! Reconstruction of full timestamps from HHMM time-of-day codes.
//!
//! Flight feeds encode times of day as `hour * 100 + minute` integers
//! (530, 1530, 0, ...), frequently round-tripped through floats, so the
//! raw column may hold ints, floats, or strings with a `.0` remnant.
//! Validation happens per element; nothing in here can fail a whole
//! batch, so an invalid code nulls exactly one row.

use chrono::NaiveDate;
use polars::prelude::*;

use super::datetime_series;

/// Strips a trailing all-zero decimal part (`"915.0"` -> `"915"`), the
/// artifact of numeric-to-string coercion.
fn strip_decimal_remnant(s: &str) -> &str {
    if let Some((head, tail)) = s.split_once('.') {
        if !tail.is_empty() && tail.bytes().all(|b| b == b'0') {
            return head;
        }
    }
    s
}

/// Normalizes one raw time-code value to its zero-padded string form, or
/// `None` when the value cannot carry a time code at all.
fn code_to_string(av: &AnyValue) -> Option<String> {
    let raw = match av {
        AnyValue::Null => return None,
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => v.to_string(),
        AnyValue::Float64(v) => v.to_string(),
        _ => return None,
    };
    let stripped = strip_decimal_remnant(&raw);
    Some(format!("{:0>4}", stripped))
}

/// Decomposes a padded code into (hour, minute) when it is all digits.
///
/// Only the first four digits participate; hour is the first two, minute
/// the next two. No range check here — out-of-range pairs fall out of
/// the checked chrono constructor as a missing timestamp.
fn split_code(padded: &str) -> Option<(u32, u32)> {
    if padded.len() < 4 || !padded.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hh = padded[0..2].parse::<u32>().ok()?;
    let mm = padded[2..4].parse::<u32>().ok()?;
    Some((hh, mm))
}

/// Combines a calendar-date column with an HHMM code column into a
/// millisecond `Datetime` series named `name`.
///
/// A row's timestamp is null when the date is null, the code is missing
/// or non-numeric, or the decomposed hour/minute pair is out of range.
/// An absent code column (`times == None`) yields an all-null series
/// aligned to the date column.
pub fn hhmm_to_datetime(
    dates: &Column,
    times: Option<&Column>,
    name: &str,
) -> PolarsResult<Series> {
    let date_ca = dates.date()?;

    let Some(times) = times else {
        return Ok(Int64Chunked::full_null(name.into(), dates.len())
            .into_datetime(TimeUnit::Milliseconds, None)
            .into_series());
    };

    let time_series = times.as_materialized_series().rechunk();
    let values = date_ca
        .as_date_iter()
        .zip(time_series.iter())
        .map(|(date, code)| {
            let date: NaiveDate = date?;
            let padded = code_to_string(&code)?;
            let (hh, mm) = split_code(&padded)?;
            date.and_hms_opt(hh, mm, 0)
        })
        .collect::<Vec<_>>();

    Ok(datetime_series(name, values.into_iter()))
}
