//! Date-level merge of normalized flights with aggregated weather.

use anyhow::Result;
use polars::prelude::*;
use tracing::info;

use crate::normalize::has_column;
use crate::schema;

/// Left-joins every flight row against at most one weather-aggregate row
/// on calendar-date equality.
///
/// Flight rows are never dropped or duplicated (given the one-row-per-date
/// aggregate invariant); unmatched rows carry nulls in the weather
/// columns, and weather-side name collisions get the `_WX` suffix. When
/// either side lacks its date column the merge degrades to a copy of the
/// flight table.
pub fn merge_flights_weather(flights: DataFrame, weather: DataFrame) -> Result<DataFrame> {
    if !has_column(&flights, schema::FL_DATE) || !has_column(&weather, schema::DATE) {
        info!("No weather DATE to merge on; proceeding with flights only");
        return Ok(flights);
    }

    let merged = flights
        .lazy()
        .join(
            weather.lazy(),
            [col(schema::FL_DATE)],
            [col(schema::DATE)],
            JoinArgs {
                how: JoinType::Left,
                suffix: Some(schema::WEATHER_SUFFIX.into()),
                maintain_order: MaintainOrderJoin::Left,
                ..Default::default()
            },
        )
        .collect()?;

    info!(
        rows = merged.height(),
        cols = merged.width(),
        "Merged on FL_DATE == DATE"
    );
    Ok(merged)
}
