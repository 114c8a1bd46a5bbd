//! Run command - the sampling session.
//!
//! Prepares the data log, starts the gpsd reader and runs the sampling loop
//! until Ctrl-C or SIGTERM. On shutdown the loop finishes its current cycle,
//! the reader is stopped and the data log is closed.

use std::path::Path;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crowdbike::config::ConfigFile;
use crowdbike::position::{GpsdSource, PositionFeedReader, PositionFeedReaderConfig, SharedPosition};
use crowdbike::sampling::{SamplingLoop, SamplingSummary};
use crowdbike::storage::{AppendLog, CsvAppendLog};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the run command.
pub fn run(config_path: Option<&Path>, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, debug)?;
    runner.log_startup("run");
    let config = runner.config().clone();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    // Set up signal handler for graceful shutdown
    let cancellation = CancellationToken::new();
    let signal_token = cancellation.clone();
    ctrlc::set_handler(move || {
        signal_token.cancel();
    })
    .map_err(|e| CliError::SignalHandler(e.to_string()))?;

    let summary = runtime.block_on(run_session(config, cancellation))?;

    println!(
        "Stopped after {} records ({} overran the sampling period)",
        summary.records_written, summary.overruns
    );
    Ok(())
}

async fn run_session(
    config: ConfigFile,
    cancellation: CancellationToken,
) -> Result<SamplingSummary, CliError> {
    // The file for the UTC day the session starts on
    let path = config.data_log_path(Utc::now().date_naive());
    let mut log = CsvAppendLog::new(&path);
    log.ensure_initialized()?;
    println!("Logging to {}", path.display());

    let shared = SharedPosition::new();
    let reader_cancellation = cancellation.child_token();
    let reader_handle = PositionFeedReader::new(
        GpsdSource::new(config.gpsd_config()),
        shared.clone(),
        PositionFeedReaderConfig::default(),
    )
    .spawn(reader_cancellation.clone());

    let mut sampler = SamplingLoop::new(
        config.sampling_config()?,
        config.climate_sensor(),
        config.particulate_sensor(),
        shared,
        log,
    )?;
    let result = sampler.run(cancellation).await;

    reader_cancellation.cancel();
    match reader_handle.await {
        Ok(stats) => info!(
            updates = stats.updates,
            errors = stats.errors,
            stale_timeouts = stats.stale_timeouts,
            "Position reader finished"
        ),
        Err(e) => warn!(error = %e, "Position reader task failed"),
    }

    Ok(result?)
}
