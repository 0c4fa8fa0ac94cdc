//! CLI entry point - the composition root.
//!
//! Parses arguments, installs logging, bootstraps the studio, and routes the
//! command to its handler. Errors that map to a [`CliError`] set the exit code.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use anchordesk_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = CliConfig::from_cli(&cli)?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Tone is baked into the dialogue template at wiring time
    if let Commands::Studio { tone: Some(tone), .. } = &command {
        config.settings.tone = tone.parse().map_err(CliError::Arguments)?;
    }

    let ctx = bootstrap(config).await?;

    match command {
        Commands::Studio {
            topic,
            queue,
            visibility,
            tone: _,
        } => {
            handlers::studio::execute(&ctx, &topic, &queue, visibility.as_deref()).await?;
        }
        Commands::Feed(feed) => {
            handlers::feed::execute(&ctx, feed).await?;
        }
        Commands::Status => {
            handlers::status::execute(&ctx).await?;
        }
    }

    Ok(())
}
