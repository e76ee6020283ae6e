//! The end-to-end run: load, normalize, merge, derive, report.

use anyhow::Result;
use tracing::info;

use crate::config::RunConfig;
use crate::features::add_derived_features;
use crate::loader::load_table;
use crate::merge::merge_flights_weather;
use crate::normalize::{flights::normalize_flights, weather::normalize_weather};
use crate::report::{self, Summary, charts};

/// Runs the whole pipeline for one year of data.
///
/// Missing input files abort immediately; every later stage degrades to
/// nulls or skipped charts instead of failing the run.
pub fn run(cfg: &RunConfig) -> Result<Summary> {
    cfg.ensure_out_dir()?;

    let flights_raw = load_table(&cfg.flights_path)?;
    let weather_raw = load_table(&cfg.weather_path)?;

    let flights = normalize_flights(flights_raw)?;
    let weather = normalize_weather(weather_raw)?;

    let merged = merge_flights_weather(flights, weather)?;
    let full = add_derived_features(merged)?;

    report::write_merged_csv(&cfg.out_dir, &full)?;
    charts::render_all(&cfg.out_dir, &full);

    let summary = report::summarize(&full)?;
    report::print_summary(&summary)?;
    report::list_artifacts(&cfg.out_dir)?;

    info!("Pipeline finished");
    Ok(summary)
}
