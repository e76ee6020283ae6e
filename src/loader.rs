//! CSV table loading.

use anyhow::{Context, Result, bail};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Reads a delimited table into a [`DataFrame`] with upper-cased column
/// names.
///
/// The only validation performed is an existence check on the path; a
/// missing file is fatal. Parse behavior (schema inference, missing-value
/// handling, ragged rows) is whatever the polars CSV reader does.
pub fn load_table(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        bail!("CSV not found: {}", path.display());
    }

    let path_str = path
        .to_str()
        .with_context(|| format!("Non-UTF-8 path: {}", path.display()))?;

    let mut df = LazyCsvReader::new(PlPath::new(path_str))
        .with_has_header(true)
        .finish()
        .with_context(|| format!("Failed to open CSV reader for {}", path.display()))?
        .collect()
        .with_context(|| format!("Failed to parse CSV {}", path.display()))?;

    let upper: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.as_str().to_uppercase())
        .collect();
    df.set_column_names(upper)?;

    info!(
        path = %path.display(),
        rows = df.height(),
        cols = df.width(),
        "Loaded table"
    );

    Ok(df)
}
