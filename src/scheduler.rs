//! Cycle loop — repeats the batch processor at a fixed interval, forever.
//!
//! No backoff, no jitter, no max-iteration bound. The loop is a cancellable
//! task with an explicit shutdown flag rather than a bare sleep loop; the
//! default behavior (run until the process is killed) is unchanged.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::Error;
use crate::pipeline::processor::run_cycle;
use crate::provider::MailProvider;
use crate::report::print_report;

/// Settings for the repeating cycle loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Rule file, reloaded at the start of every cycle.
    pub rules_path: PathBuf,
    /// Explicit search query; `None` means unread messages.
    pub query: Option<String>,
    /// Seconds between cycle starts.
    pub interval_secs: u64,
    /// Content preview length for manual-review entries (0 disables).
    pub preview_length: usize,
}

/// Spawn the repeating cycle task.
///
/// Runs one cycle per tick and prints its report to stdout. Set the returned
/// flag to stop at the next tick. A fatal cycle error (unloadable rules)
/// terminates the task with `Err`.
pub fn spawn_cycle_loop(
    provider: Arc<dyn MailProvider>,
    config: LoopConfig,
) -> (JoinHandle<Result<(), Error>>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!(interval_secs = config.interval_secs, "Cycle loop started");

        let mut tick = tokio::time::interval(Duration::from_secs(config.interval_secs));

        loop {
            tick.tick().await;

            if shutdown.load(Ordering::Relaxed) {
                info!("Cycle loop shutting down");
                return Ok(());
            }

            let report = run_cycle(
                provider.as_ref(),
                &config.rules_path,
                config.query.as_deref(),
                config.preview_length,
            )
            .await?;

            if let Err(e) = print_report(&report, &mut std::io::stdout()) {
                error!(error = %e, "Failed to write cycle report");
            }
        }
    });

    (handle, shutdown_flag)
}
