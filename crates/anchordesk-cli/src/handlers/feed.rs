//! Feed command handlers: list, replay, share, delete.

use anyhow::Result;

use anchordesk_core::{FeedFilter, Visibility};

use crate::bootstrap::CliContext;
use crate::commands::FeedCommand;
use crate::error::CliError;
use crate::handlers::{print_outcome, stop_on_interrupt};
use crate::presentation::{print_separator, truncate_string};

pub async fn execute(ctx: &CliContext, command: FeedCommand) -> Result<()> {
    match command {
        FeedCommand::List { mine } => list(ctx, mine).await,
        FeedCommand::Play { id } => play(ctx, &id).await,
        FeedCommand::Share { id, private } => {
            let visibility = if private {
                Visibility::Private
            } else {
                Visibility::Public
            };
            share(ctx, &id, visibility).await
        }
        FeedCommand::Delete { id } => delete(ctx, &id).await,
    }
}

/// Broadcasts visible to the current user, newest first.
async fn list(ctx: &CliContext, mine: bool) -> Result<()> {
    let filter = FeedFilter {
        include_private: true,
        include_public: !mine,
    };
    let broadcasts = ctx
        .library()
        .list(Some(ctx.user()), filter)
        .await
        .map_err(CliError::from)?;

    if broadcasts.is_empty() {
        println!("No broadcasts yet.");
        println!("Use 'anchordesk studio <topic>' to record one.");
        return Ok(());
    }

    println!(
        "{:<36} {:<8} {:<12} {:<17} Topic",
        "ID", "Access", "Owner", "Recorded"
    );
    print_separator(110);
    for broadcast in &broadcasts {
        println!(
            "{:<36} {:<8} {:<12} {:<17} {}",
            broadcast.id,
            broadcast.visibility.as_str(),
            truncate_string(&broadcast.owner, 12),
            broadcast.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            truncate_string(&broadcast.topic, 40),
        );
    }
    println!("\n{} broadcast(s).", broadcasts.len());
    Ok(())
}

async fn play(ctx: &CliContext, id: &str) -> Result<()> {
    let interrupt = stop_on_interrupt(ctx.pipeline());
    let result = ctx.feed().play_saved(id, Some(ctx.user())).await;
    interrupt.abort();

    print_outcome(&result.map_err(CliError::from)?);
    Ok(())
}

async fn share(ctx: &CliContext, id: &str, visibility: Visibility) -> Result<()> {
    ctx.library()
        .set_visibility(id, visibility, ctx.user())
        .await
        .map_err(CliError::from)?;
    println!("Broadcast {id} is now {visibility}.");
    Ok(())
}

async fn delete(ctx: &CliContext, id: &str) -> Result<()> {
    ctx.library()
        .delete(id, ctx.user())
        .await
        .map_err(CliError::from)?;
    println!("Broadcast {id} deleted.");
    Ok(())
}
