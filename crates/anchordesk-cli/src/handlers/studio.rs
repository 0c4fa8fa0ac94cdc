//! Studio command handler.

use anyhow::Result;
use tracing::warn;

use anchordesk_core::{QueueItemStatus, Visibility};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::{print_outcome, stop_on_interrupt};

/// Generate, voice, and play a broadcast on `topic`.
///
/// `queued` topics start preparing immediately; those ready by the end of
/// the main broadcast play right after it.
pub async fn execute(
    ctx: &CliContext,
    topic: &str,
    queued: &[String],
    visibility: Option<&str>,
) -> Result<()> {
    let visibility = match visibility {
        Some(raw) => raw.parse::<Visibility>().map_err(CliError::Arguments)?,
        None => ctx.settings.default_visibility,
    };

    for follow_up in queued {
        match ctx.queue().enqueue(follow_up) {
            Ok(item) => println!("Queued #{}: {}", item.position + 1, item.topic),
            Err(err) => {
                warn!(target: "anchordesk.cli", topic = %follow_up, error = %err, "Queue rejected topic");
                println!("Skipped queued topic '{follow_up}': {}", err.user_message());
            }
        }
    }

    let interrupt = stop_on_interrupt(ctx.pipeline());
    let result = ctx.studio().start(topic, visibility).await;
    interrupt.abort();

    let outcome = result.map_err(CliError::from)?;
    print_outcome(&outcome);

    let leftover = ctx.queue().snapshot();
    if !leftover.is_empty() {
        let failed = leftover
            .iter()
            .filter(|item| item.status == QueueItemStatus::Error)
            .count();
        println!(
            "{} queued broadcast(s) not played ({failed} failed to prepare).",
            leftover.len()
        );
    }
    Ok(())
}
