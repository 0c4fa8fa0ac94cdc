//! Integration tests for the feed subcommands against a JSON store.
//!
//! # What is tested
//!
//! - Sharing and deleting go through the library's ownership rules
//! - Changes persist to the store file and survive a fresh bootstrap
//! - A non-owner gets an access error with the permission exit code

use anchordesk_cli::{CliConfig, CliContext, CliError, FeedCommand, bootstrap, handlers};
use anchordesk_core::{Broadcast, DialogueLine, FeedFilter, Speaker, Visibility};

async fn context(dir: &tempfile::TempDir, user: &str) -> CliContext {
    let config = CliConfig {
        store_path: dir.path().join("broadcasts.json"),
        clip_dir: dir.path().join("clips"),
        user: user.to_string(),
        ..CliConfig::with_defaults()
    };
    bootstrap(config).await.unwrap()
}

async fn record(ctx: &CliContext, topic: &str) -> Broadcast {
    let dialogue = [
        DialogueLine::new(Speaker::A, "Good evening."),
        DialogueLine::new(Speaker::B, "Thanks, James."),
    ];
    ctx.library()
        .save(ctx.user(), topic, &dialogue, Visibility::Private)
        .await
        .unwrap()
}

#[tokio::test]
async fn share_and_delete_persist_across_bootstraps() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir, "dana").await;
    let tides = record(&ctx, "Tides").await;
    let ferries = record(&ctx, "Ferries").await;

    handlers::feed::execute(&ctx, FeedCommand::Share {
        id: tides.id.clone(),
        private: false,
    })
    .await
    .unwrap();
    handlers::feed::execute(&ctx, FeedCommand::Delete {
        id: ferries.id.clone(),
    })
    .await
    .unwrap();
    handlers::feed::execute(&ctx, FeedCommand::List { mine: false })
        .await
        .unwrap();
    drop(ctx);

    // Another user sees only the shared broadcast.
    let other = context(&dir, "lee").await;
    let visible = other
        .library()
        .list(Some("lee"), FeedFilter::default())
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, tides.id);
    assert_eq!(visible[0].visibility, Visibility::Public);
}

#[tokio::test]
async fn non_owner_cannot_delete() {
    let dir = tempfile::tempdir().unwrap();
    let owner = context(&dir, "dana").await;
    let tides = record(&owner, "Tides").await;
    drop(owner);

    let intruder = context(&dir, "lee").await;
    let err = handlers::feed::execute(&intruder, FeedCommand::Delete {
        id: tides.id.clone(),
    })
    .await
    .unwrap_err();

    let cli_err = err.downcast_ref::<CliError>().unwrap();
    assert_eq!(cli_err.exit_code(), 77);
    assert!(err.to_string().contains("permission"));

    let missing = handlers::feed::execute(&intruder, FeedCommand::Play {
        id: "no-such-broadcast".into(),
    })
    .await
    .unwrap_err();
    assert_eq!(missing.downcast_ref::<CliError>().unwrap().exit_code(), 77);
}
