//! Output persistence, summary statistics, and the artifact listing.

pub mod charts;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::normalize::has_column;
use crate::{schema, util};

/// Writes the full merged/derived table as a CSV into the output dir.
pub fn write_merged_csv(out_dir: &Path, df: &DataFrame) -> Result<PathBuf> {
    let path = out_dir.join("cleaned_flights_merged.csv");
    let mut file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut out = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut out)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), "Saved cleaned merged CSV");
    Ok(path)
}

/// Console summary over the final table.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub mean_dep_delay_min: Option<f64>,
    pub median_dep_delay_min: Option<f64>,
    pub pct_long_delays: Option<f64>,
    pub total_cancellations: Option<i64>,
}

pub fn summarize(df: &DataFrame) -> Result<Summary> {
    let (mean_delay, median_delay) = if has_column(df, schema::DEP_DELAY_MIN) {
        let ca = df.column(schema::DEP_DELAY_MIN)?.f64()?;
        (ca.mean(), ca.median())
    } else {
        (None, None)
    };

    let pct_long = if has_column(df, schema::LONG_DELAY_FLAG) {
        let flags: Vec<f64> = df
            .column(schema::LONG_DELAY_FLAG)?
            .i32()?
            .into_iter()
            .flatten()
            .map(|v| v as f64)
            .collect();
        util::mean(&flags).map(|m| m * 100.0)
    } else {
        None
    };

    let total_cancellations = if has_column(df, schema::CANCELLED_FLAG) {
        df.column(schema::CANCELLED_FLAG)?.i32()?.sum().map(i64::from)
    } else {
        None
    };

    Ok(Summary {
        rows: df.height(),
        mean_dep_delay_min: mean_delay,
        median_dep_delay_min: median_delay,
        pct_long_delays: pct_long,
        total_cancellations,
    })
}

/// Logs the summary line by line, plus the full record as pretty JSON at
/// debug level.
pub fn print_summary(summary: &Summary) -> Result<()> {
    info!(rows = summary.rows, "Merged rows");
    if let Some(m) = summary.mean_dep_delay_min {
        info!(mean_dep_delay_min = %format!("{m:.2}"), "Mean departure delay");
    }
    if let Some(m) = summary.median_dep_delay_min {
        info!(median_dep_delay_min = %format!("{m:.2}"), "Median departure delay");
    }
    if let Some(p) = summary.pct_long_delays {
        info!(pct_long_delays = %format!("{p:.2}"), "Percent long delays (>15 min)");
    }
    if let Some(c) = summary.total_cancellations {
        info!(total_cancellations = c, "Total cancellations recorded");
    }
    debug!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Logs a sorted listing of every artifact in the output directory.
pub fn list_artifacts(out_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(out_dir)? {
        let entry = entry?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    info!(out_dir = %out_dir.display(), count = names.len(), "Output files saved");
    for name in &names {
        info!(artifact = %name, "Artifact");
    }
    Ok(names)
}
