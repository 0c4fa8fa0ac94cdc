//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Parse CLI-specific input, call the orchestrators or the library, and
//!   format the result for the terminal
//!
//! Pipeline rules (admission, visibility, ownership) stay in the library
//! crates; handlers only translate.

pub mod feed;
pub mod status;
pub mod studio;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use anchordesk_studio::{BroadcastOutcome, BroadcastPipeline};

/// Ctrl-C cancels a loading broadcast, or stops one that is on air.
///
/// Abort the returned handle once the broadcast returns.
pub(crate) fn stop_on_interrupt(pipeline: &Arc<BroadcastPipeline>) -> JoinHandle<()> {
    let pipeline = Arc::clone(pipeline);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        if pipeline.cancel_loading() {
            info!(target: "anchordesk.cli", "Interrupted while loading");
        } else {
            let kind = pipeline.stop();
            info!(target: "anchordesk.cli", ?kind, "Interrupted");
        }
    })
}

pub(crate) fn print_outcome(outcome: &BroadcastOutcome) {
    match outcome {
        BroadcastOutcome::Completed { report, chained } => {
            println!(
                "\nBroadcast complete: {} line(s) played, {} skipped.",
                report.played, report.skipped
            );
            if *chained > 0 {
                println!("{chained} queued broadcast(s) followed.");
            }
        }
        BroadcastOutcome::Stopped => println!("\nBroadcast stopped."),
        BroadcastOutcome::Canceled => println!("\nBroadcast loading canceled."),
    }
}
