//! The five exploratory charts.
//!
//! Each chart is attempted independently: a failure (or an empty data
//! prep) logs and skips that chart only. Data preparation is separated
//! from rendering so the aggregation logic is testable without a
//! drawing backend.

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::normalize::{coerce_numeric, has_column, is_numeric_dtype};
use crate::{schema, util};

/// Rolling window length for the daily-cancellations overlay.
const ROLLING_WINDOW: usize = 30;
/// At most this many numeric columns enter the correlation heatmap.
const HEATMAP_MAX_COLS: usize = 20;
/// Scatter plots above this many points are subsampled (plot only).
const SCATTER_SAMPLE_CAP: usize = 2000;
const SCATTER_SEED: u64 = 1;

const CHART_SIZE: (u32, u32) = (1000, 560);

/// Renders every chart, isolating failures per chart.
pub fn render_all(out_dir: &Path, df: &DataFrame) {
    let charts: &[(&str, fn(&Path, &DataFrame) -> Result<Option<PathBuf>>)] = &[
        ("monthly_avg_dep_delay", monthly_avg_dep_delay),
        ("daily_cancellations_rolling", daily_cancellations_rolling),
        ("airline_avg_dep_delay_top15", airline_avg_dep_delay_top15),
        ("correlation_heatmap", correlation_heatmap),
        ("dep_delay_vs_temperature", dep_delay_vs_temperature),
    ];

    for &(name, render) in charts {
        match render(out_dir, df) {
            Ok(Some(path)) => info!(chart = name, path = %path.display(), "Saved chart"),
            Ok(None) => info!(chart = name, "Chart skipped: no usable data"),
            Err(e) => warn!(chart = name, error = %e, "Chart failed"),
        }
    }
}

fn padded_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let pad = ((max - min) * 0.05).max(1.0);
    (min - pad, max + pad)
}

fn date_range(dates: &[NaiveDate]) -> (NaiveDate, NaiveDate) {
    let start = *dates.first().unwrap_or(&NaiveDate::MIN);
    let mut end = *dates.last().unwrap_or(&NaiveDate::MAX);
    if end <= start {
        end = start + Duration::days(1);
    }
    (start, end)
}

// --- 1. Monthly average departure delay -----------------------------------

pub(crate) fn monthly_mean_delay_series(df: &DataFrame) -> Result<Vec<(NaiveDate, f64)>> {
    if !has_column(df, schema::YEAR_MONTH) || !has_column(df, schema::DEP_DELAY_MIN) {
        return Ok(Vec::new());
    }

    let agg = df
        .clone()
        .lazy()
        .filter(col(schema::YEAR_MONTH).is_not_null())
        .group_by([col(schema::YEAR_MONTH)])
        .agg([col(schema::DEP_DELAY_MIN).mean().alias("MEAN_DELAY")])
        .filter(col("MEAN_DELAY").is_not_null())
        .sort([schema::YEAR_MONTH], SortMultipleOptions::default())
        .collect()?;

    let months = agg.column(schema::YEAR_MONTH)?.date()?.as_date_iter();
    let means = agg.column("MEAN_DELAY")?.f64()?;
    Ok(months
        .zip(means.into_iter())
        .filter_map(|(m, v)| Some((m?, v?)))
        .collect())
}

fn monthly_avg_dep_delay(out_dir: &Path, df: &DataFrame) -> Result<Option<PathBuf>> {
    let series = monthly_mean_delay_series(df)?;
    if series.is_empty() {
        return Ok(None);
    }

    let path = out_dir.join("monthly_avg_dep_delay.png");
    let dates: Vec<NaiveDate> = series.iter().map(|(d, _)| *d).collect();
    let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    let (x0, x1) = date_range(&dates);
    let (y0, y1) = padded_range(&values);

    let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Average Departure Delay (minutes)", ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc("Average Departure Delay (min)")
        .draw()?;
    chart.draw_series(LineSeries::new(series, &BLUE))?;
    root.present()?;
    drop(chart);
    drop(root);

    Ok(Some(path))
}

// --- 2. Daily cancellations with rolling mean -----------------------------

/// Per-date cancellation totals with a trailing rolling mean that uses at
/// least one observation and shrinks at the series start.
pub(crate) fn daily_cancellation_series(
    df: &DataFrame,
) -> Result<(Vec<NaiveDate>, Vec<f64>, Vec<f64>)> {
    if !has_column(df, schema::FL_DATE) || !has_column(df, schema::CANCELLED_FLAG) {
        return Ok((Vec::new(), Vec::new(), Vec::new()));
    }

    let daily = df
        .clone()
        .lazy()
        .filter(col(schema::FL_DATE).is_not_null())
        .group_by([col(schema::FL_DATE)])
        .agg([col(schema::CANCELLED_FLAG)
            .sum()
            .cast(DataType::Float64)
            .alias("CANCELLATIONS")])
        .sort([schema::FL_DATE], SortMultipleOptions::default())
        .with_column(
            col("CANCELLATIONS")
                .rolling_mean(RollingOptionsFixedWindow {
                    window_size: ROLLING_WINDOW,
                    min_periods: 1,
                    ..Default::default()
                })
                .alias("ROLLING_MEAN"),
        )
        .collect()?;

    let dates: Vec<NaiveDate> = daily
        .column(schema::FL_DATE)?
        .date()?
        .as_date_iter()
        .flatten()
        .collect();
    let counts: Vec<f64> = daily
        .column("CANCELLATIONS")?
        .f64()?
        .into_iter()
        .flatten()
        .collect();
    let rolling: Vec<f64> = daily
        .column("ROLLING_MEAN")?
        .f64()?
        .into_iter()
        .flatten()
        .collect();
    Ok((dates, counts, rolling))
}

fn daily_cancellations_rolling(out_dir: &Path, df: &DataFrame) -> Result<Option<PathBuf>> {
    let (dates, counts, rolling) = daily_cancellation_series(df)?;
    if dates.is_empty() {
        return Ok(None);
    }

    let path = out_dir.join("daily_cancellations_rolling.png");
    let (x0, x1) = date_range(&dates);
    let (y0, y1) = padded_range(&counts);

    let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Daily Cancellations with 30-day Rolling Mean", ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0.min(0.0)..y1)?;
    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Cancellations (count)")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            dates.iter().copied().zip(counts.iter().copied()),
            &BLUE,
        ))?
        .label("Daily cancellations (count)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], BLUE));
    chart
        .draw_series(LineSeries::new(
            dates.iter().copied().zip(rolling.iter().copied()),
            &RED,
        ))?
        .label("30-day rolling mean")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    drop(chart);
    drop(root);

    Ok(Some(path))
}

// --- 3. Top airlines by average delay -------------------------------------

pub(crate) fn airline_mean_delay_top(df: &DataFrame, limit: usize) -> Result<Vec<(String, f64)>> {
    if !has_column(df, schema::AIRLINE) || !has_column(df, schema::DEP_DELAY_MIN) {
        return Ok(Vec::new());
    }

    let agg = df
        .clone()
        .lazy()
        .filter(col(schema::AIRLINE).is_not_null())
        .group_by([col(schema::AIRLINE)])
        .agg([col(schema::DEP_DELAY_MIN).mean().alias("MEAN_DELAY")])
        .filter(col("MEAN_DELAY").is_not_null())
        .sort(
            ["MEAN_DELAY"],
            SortMultipleOptions::default().with_order_descending(true),
        )
        .limit(limit as IdxSize)
        .collect()?;

    let airlines = agg.column(schema::AIRLINE)?.str()?;
    let means = agg.column("MEAN_DELAY")?.f64()?;
    Ok(airlines
        .into_iter()
        .zip(means.into_iter())
        .filter_map(|(a, v)| Some((a?.to_string(), v?)))
        .collect())
}

fn airline_avg_dep_delay_top15(out_dir: &Path, df: &DataFrame) -> Result<Option<PathBuf>> {
    let top = airline_mean_delay_top(df, 15)?;
    if top.is_empty() {
        return Ok(None);
    }

    let path = out_dir.join("airline_avg_dep_delay_top15.png");
    let n = top.len() as i32;
    let values: Vec<f64> = top.iter().map(|(_, v)| *v).collect();
    let (lo, hi) = padded_range(&values);

    let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Top 15 Airlines by Average Departure Delay (min)", ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(80)
        .build_cartesian_2d(lo.min(0.0)..hi.max(0.0), 0..n)?;

    let labels: Vec<String> = top.iter().map(|(a, _)| a.clone()).collect();
    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Average Dep Delay (min)")
        .y_labels(top.len())
        .y_label_formatter(&|idx: &i32| {
            // bar i sits in band [i, i+1); rank 0 is drawn topmost
            labels
                .get((n - 1 - *idx) as usize)
                .cloned()
                .unwrap_or_default()
        })
        .draw()?;

    chart.draw_series(top.iter().enumerate().map(|(i, (_, v))| {
        let row = n - 1 - i as i32;
        Rectangle::new([(0.0, row), (*v, row + 1)], BLUE.filled())
    }))?;
    root.present()?;
    drop(chart);
    drop(root);

    Ok(Some(path))
}

// --- 4. Correlation heatmap ------------------------------------------------

/// Pairwise Pearson correlations over at most the first `max_cols`
/// numeric columns; `None` cells mark undefined correlations.
pub(crate) fn correlation_matrix(
    df: &DataFrame,
    max_cols: usize,
) -> Result<(Vec<String>, Vec<Vec<Option<f64>>>)> {
    let numeric: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .take(max_cols)
        .collect();

    if numeric.len() < 2 {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut values: Vec<Vec<Option<f64>>> = Vec::with_capacity(numeric.len());
    for name in &numeric {
        values.push(coerce_numeric(df.column(name)?, name).f64()?.to_vec());
    }

    let n = numeric.len();
    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let r = util::pearson(&values[i], &values[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    Ok((numeric, matrix))
}

fn correlation_color(r: f64) -> RGBColor {
    let r = r.clamp(-1.0, 1.0);
    if r >= 0.0 {
        let fade = (255.0 * (1.0 - r)) as u8;
        RGBColor(255, fade, fade)
    } else {
        let fade = (255.0 * (1.0 + r)) as u8;
        RGBColor(fade, fade, 255)
    }
}

fn correlation_heatmap(out_dir: &Path, df: &DataFrame) -> Result<Option<PathBuf>> {
    let (names, matrix) = correlation_matrix(df, HEATMAP_MAX_COLS)?;
    if names.is_empty() {
        return Ok(None);
    }

    let path = out_dir.join("correlation_heatmap.png");
    let n = names.len() as i32;

    let root = BitMapBackend::new(&path, (900, 820)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Correlation matrix (numeric features)", ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(140)
        .y_label_area_size(140)
        .build_cartesian_2d(0..n, 0..n)?;

    let x_names = names.clone();
    let y_names = names.clone();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(names.len())
        .y_labels(names.len())
        .x_label_formatter(&move |idx: &i32| {
            x_names.get(*idx as usize).cloned().unwrap_or_default()
        })
        .y_label_formatter(&move |idx: &i32| {
            y_names.get(*idx as usize).cloned().unwrap_or_default()
        })
        .draw()?;

    chart.draw_series(matrix.iter().enumerate().flat_map(|(i, row)| {
        row.iter().enumerate().map(move |(j, r)| {
            let color = match r {
                Some(r) => correlation_color(*r),
                None => RGBColor(210, 210, 210),
            };
            Rectangle::new(
                [(j as i32, i as i32), (j as i32 + 1, i as i32 + 1)],
                color.filled(),
            )
        })
    }))?;
    root.present()?;
    drop(chart);
    drop(root);

    Ok(Some(path))
}

// --- 5. Delay vs temperature scatter ---------------------------------------

/// First column whose name contains a temperature-indicating substring.
pub(crate) fn find_temperature_column(df: &DataFrame) -> Option<String> {
    df.get_column_names()
        .iter()
        .find(|name| {
            schema::TEMP_CANDIDATES
                .iter()
                .any(|c| name.as_str().contains(c))
        })
        .map(|name| name.as_str().to_string())
}

/// Joint (temperature, delay) sample for plotting; capped at
/// [`SCATTER_SAMPLE_CAP`] points with a fixed-seed draw.
pub(crate) fn delay_vs_temperature_sample(
    df: &DataFrame,
) -> Result<Option<(String, Vec<(f64, f64)>)>> {
    let Some(tcol) = find_temperature_column(df) else {
        return Ok(None);
    };
    if !has_column(df, schema::DEP_DELAY_MIN) {
        return Ok(None);
    }

    let temps = coerce_numeric(df.column(&tcol)?, &tcol);
    let delays = coerce_numeric(df.column(schema::DEP_DELAY_MIN)?, schema::DEP_DELAY_MIN);

    let mut pairs: Vec<(f64, f64)> = temps
        .f64()?
        .into_iter()
        .zip(delays.f64()?.into_iter())
        .filter_map(|(t, d)| Some((t?, d?)))
        .collect();

    if pairs.len() > SCATTER_SAMPLE_CAP {
        let mut rng = SmallRng::seed_from_u64(SCATTER_SEED);
        let mut picked =
            rand::seq::index::sample(&mut rng, pairs.len(), SCATTER_SAMPLE_CAP).into_vec();
        picked.sort_unstable();
        pairs = picked.into_iter().map(|i| pairs[i]).collect();
    }

    Ok(Some((tcol, pairs)))
}

fn dep_delay_vs_temperature(out_dir: &Path, df: &DataFrame) -> Result<Option<PathBuf>> {
    let Some((tcol, pairs)) = delay_vs_temperature_sample(df)? else {
        info!("No temperature-like column found; skipping delay vs temp scatter");
        return Ok(None);
    };
    if pairs.is_empty() {
        return Ok(None);
    }

    let path = out_dir.join(format!("dep_delay_vs_{tcol}.png"));
    let xs: Vec<f64> = pairs.iter().map(|(t, _)| *t).collect();
    let ys: Vec<f64> = pairs.iter().map(|(_, d)| *d).collect();
    let (x0, x1) = padded_range(&xs);
    let (y0, y1) = padded_range(&ys);

    let root = BitMapBackend::new(&path, (860, 640)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Departure Delay vs {tcol}"), ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_desc(tcol.as_str())
        .y_desc("Departure Delay (min)")
        .draw()?;
    chart.draw_series(
        pairs
            .iter()
            .map(|(t, d)| Circle::new((*t, *d), 3, BLUE.mix(0.4).filled())),
    )?;
    root.present()?;
    drop(chart);
    drop(root);

    Ok(Some(path))
}
