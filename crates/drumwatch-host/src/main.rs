//! Reference host for the Drumwatch coking-drum display.
//!
//! Renders the battery to a PNG image on startup, every refresh interval
//! (never more often than every 15 minutes) and whenever a tap line arrives
//! on stdin. Requests that arrive while a render is already pending are
//! merged into it.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `drumwatch-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Load the label typeface and build the unit roster
//! 4. Start the ticker and the stdin tap reader
//! 5. Render on each request until `Ctrl-C`

mod error;
mod refresh;
mod snapshot;

use std::path::Path;

use chrono::Utc;
use drumwatch_core::config::DrumwatchConfig;
use drumwatch_core::roster::Roster;
use drumwatch_render::{RenderContext, Typeface};
use drumwatch_types::Row;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::HostError;
use crate::refresh::RefreshSource;
use crate::snapshot::Snapshotter;

/// Name of the optional configuration file in the working directory.
const CONFIG_FILE: &str = "drumwatch-config.yaml";

/// Application entry point for the host.
///
/// # Errors
///
/// Returns an error if configuration, the typeface or the roster cannot be
/// loaded. Failures to write individual snapshots are logged and retried on
/// the next request.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("drumwatch-host starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    let interval = config.refresh.interval()?;
    info!(
        width = config.render.width,
        height = config.render.height,
        interval_secs = interval.as_secs(),
        output = %config.output.path.display(),
        flags = %config.output.flags_path.display(),
        "Configuration loaded"
    );

    // 3. Typeface and roster.
    let mut snapshotter = build_snapshotter(&config)?;

    // 4. Refresh sources.
    let (trigger, mut requests) = refresh::channel();
    trigger.request(RefreshSource::Startup);
    let ticker = tokio::spawn(refresh::run_ticker(trigger.clone(), interval));
    std::thread::spawn(move || refresh::run_taps(std::io::stdin().lock(), &trigger));

    // 5. Render loop.
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            request = requests.recv() => {
                let Some(source) = request else {
                    info!("all refresh sources closed");
                    break;
                };
                handle_request(&mut snapshotter, source).await;
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!(error = %e, "failed to listen for Ctrl-C");
                }
                info!("shutdown requested");
                break;
            }
        }
    }

    ticker.abort();
    info!("drumwatch-host shutdown complete");
    Ok(())
}

async fn handle_request(snapshotter: &mut Snapshotter, source: RefreshSource) {
    if !snapshotter.accepts(source) {
        info!(?source, "tap outside the display ignored");
        return;
    }
    let now = Utc::now().with_timezone(&snapshotter.time_zone());
    if let Err(e) = snapshotter.render(now).await {
        error!(?source, error = %e, "snapshot failed");
    }
}

/// Load the label typeface and the roster.
fn build_snapshotter(config: &DrumwatchConfig) -> Result<Snapshotter, HostError> {
    let typeface = Typeface::from_config(config.render.font_path.as_deref())?;
    let roster = Roster::coking_battery()?;
    info!(
        units = roster.units().count(),
        time_zone = %roster.time_zone(),
        "Roster loaded"
    );
    for group in [Row::Top, Row::Bottom].into_iter().filter_map(|row| roster.row(row)) {
        info!(
            row = ?group.row,
            title = group.title,
            units = group.units.len(),
            "Row configured"
        );
    }
    Ok(Snapshotter::new(config, RenderContext::new(roster, typeface)))
}

/// Load the configuration, reporting whether it came from a file.
fn load_config() -> Result<(DrumwatchConfig, bool), HostError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        Ok((DrumwatchConfig::from_file(config_path)?, true))
    } else {
        Ok((DrumwatchConfig::default(), false))
    }
}
