//! Derived analytic columns on the merged table.

use anyhow::Result;
use polars::prelude::*;
use tracing::info;

use crate::normalize::{coerce_numeric, has_column};
use crate::schema;

/// Minutes of departure delay above which a flight counts as long-delayed.
pub const LONG_DELAY_MINUTES: f64 = 15.0;

/// Adds `YEAR_MONTH` (date truncated to month), re-coerces
/// `DEP_DELAY_MIN` to numeric, and adds the strict `LONG_DELAY_FLAG`.
///
/// A missing `FL_DATE` column degrades `YEAR_MONTH` to all-null; a
/// missing delay column degrades the flag to all zeros. Null delays are
/// never long delays.
pub fn add_derived_features(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;

    if has_column(&df, schema::FL_DATE) {
        df = df
            .lazy()
            .with_column(
                col(schema::FL_DATE)
                    .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
                    .dt()
                    .truncate(lit("1mo"))
                    .cast(DataType::Date)
                    .alias(schema::YEAR_MONTH),
            )
            .collect()?;
    } else {
        let ym = Int32Chunked::full_null(schema::YEAR_MONTH.into(), df.height())
            .into_date()
            .into_series();
        df.with_column(ym)?;
    }

    if has_column(&df, schema::DEP_DELAY_MIN) {
        let delay = coerce_numeric(df.column(schema::DEP_DELAY_MIN)?, schema::DEP_DELAY_MIN);
        df.with_column(delay)?;
    }

    let flags: Vec<i32> = if has_column(&df, schema::DEP_DELAY_MIN) {
        df.column(schema::DEP_DELAY_MIN)?
            .f64()?
            .into_iter()
            .map(|v| match v {
                Some(d) if d > LONG_DELAY_MINUTES => 1,
                _ => 0,
            })
            .collect()
    } else {
        vec![0; df.height()]
    };
    df.with_column(Int32Chunked::from_vec(schema::LONG_DELAY_FLAG.into(), flags).into_series())?;

    info!(rows = df.height(), cols = df.width(), "Derived features added");
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use polars::df;

    fn with_dates(dates: &[&str], delays: &[Option<f64>]) -> DataFrame {
        let raw = df!(
            "FL_DATE" => dates,
            "DEP_DELAY" => delays.to_vec()
        )
        .unwrap();
        crate::normalize::flights::normalize_flights(raw).unwrap()
    }

    #[test]
    fn test_year_month_truncates_to_month_start() {
        let df = with_dates(&["2022-03-15", "2022-03-01", "2022-11-30"], &[Some(1.0); 3]);
        let out = add_derived_features(df).unwrap();
        let ym: Vec<Option<NaiveDate>> = out
            .column("YEAR_MONTH")
            .unwrap()
            .date()
            .unwrap()
            .as_date_iter()
            .collect();
        assert_eq!(ym[0], NaiveDate::from_ymd_opt(2022, 3, 1));
        assert_eq!(ym[1], NaiveDate::from_ymd_opt(2022, 3, 1));
        assert_eq!(ym[2], NaiveDate::from_ymd_opt(2022, 11, 1));
    }

    #[test]
    fn test_long_delay_strictly_greater_than_15() {
        let df = with_dates(
            &["2022-01-01", "2022-01-01", "2022-01-01", "2022-01-01"],
            &[Some(15.0), Some(15.0001), Some(-5.0), None],
        );
        let out = add_derived_features(df).unwrap();
        let flags: Vec<Option<i32>> =
            out.column("LONG_DELAY_FLAG").unwrap().i32().unwrap().to_vec();
        assert_eq!(flags, vec![Some(0), Some(1), Some(0), Some(0)]);
        assert_eq!(out.column("LONG_DELAY_FLAG").unwrap().null_count(), 0);
    }

    #[test]
    fn test_missing_fl_date_gives_null_year_month() {
        let df = df!("DEP_DELAY_MIN" => [20.0f64]).unwrap();
        let out = add_derived_features(df).unwrap();
        assert_eq!(out.column("YEAR_MONTH").unwrap().null_count(), 1);
        let flags: Vec<Option<i32>> =
            out.column("LONG_DELAY_FLAG").unwrap().i32().unwrap().to_vec();
        assert_eq!(flags, vec![Some(1)]);
    }
}
