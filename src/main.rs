//! Entry point for the flight/weather analysis pipeline.
//!
//! Loads one year of flight and weather CSVs from fixed paths, produces
//! the cleaned merged table, the exploratory charts, and the console
//! summary. There are no CLI flags; see [`flightwx::config::RunConfig`].

use anyhow::Result;
use flightwx::config::RunConfig;
use flightwx::pipeline;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

fn main() -> Result<()> {
    // Logging setup: colored stderr + JSON rolling log file
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    std::fs::create_dir_all("logs")?;
    let file_appender = tracing_appender::rolling::daily("logs", "flightwx.log");
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cfg = RunConfig::default();
    pipeline::run(&cfg)?;

    Ok(())
}
