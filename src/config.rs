//! Run configuration: input locations and the output directory.
//!
//! There are no CLI flags or environment knobs for the pipeline; paths
//! are fixed constants surfaced as an explicit value so the entry point
//! and tests can pass their own.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// File and directory layout for a single pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub flights_path: PathBuf,
    pub weather_path: PathBuf,
    pub out_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            flights_path: PathBuf::from("flights2022.csv"),
            weather_path: PathBuf::from("flights_weather2022.csv"),
            out_dir: PathBuf::from("flight_analysis_outputs"),
        }
    }
}

impl RunConfig {
    /// Creates the output directory if it does not exist. Idempotent.
    pub fn ensure_out_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("Failed to create output dir {}", self.out_dir.display()))
    }
}
