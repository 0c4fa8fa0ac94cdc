//! Main CLI parser and top-level argument handling.
//!
//! Service endpoints and identity are global options with environment
//! fallbacks, so a `.env` file is enough to configure a workstation.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

pub const DEFAULT_LLM_URL: &str = "http://localhost:8080/v1/chat/completions";
pub const DEFAULT_TTS_URL: &str = "http://localhost:8880/v1/audio/speech";
pub const DEFAULT_STORE_PATH: &str = "anchordesk-broadcasts.json";
pub const DEFAULT_USER: &str = "local";

/// Command-line interface for the two-anchor news studio.
#[derive(Parser, Debug)]
#[command(name = "anchordesk")]
#[command(about = "Generate, voice, and play two-anchor news broadcasts")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Chat-completions endpoint of the language model service
    #[arg(long, global = true, env = "ANCHORDESK_LLM_URL", default_value = DEFAULT_LLM_URL)]
    pub llm_url: String,

    /// Model name sent to the language model service
    #[arg(long, global = true, env = "ANCHORDESK_LLM_MODEL")]
    pub llm_model: Option<String>,

    /// Bearer token for the language model service
    #[arg(long, global = true, env = "ANCHORDESK_LLM_KEY", hide_env_values = true)]
    pub llm_key: Option<String>,

    /// Speech synthesis endpoint
    #[arg(long, global = true, env = "ANCHORDESK_TTS_URL", default_value = DEFAULT_TTS_URL)]
    pub tts_url: String,

    /// Model name sent to the speech service
    #[arg(long, global = true, env = "ANCHORDESK_TTS_MODEL")]
    pub tts_model: Option<String>,

    /// Audio player command, e.g. "ffplay -nodisp -autoexit"; clips are paced silently without one
    #[arg(long, global = true, env = "ANCHORDESK_PLAYER")]
    pub player: Option<String>,

    /// Broadcast coordinator base URL; the local mock is used when absent or unreachable
    #[arg(long, global = true, env = "ANCHORDESK_COORDINATOR_URL")]
    pub coordinator_url: Option<String>,

    /// JSON file holding saved broadcasts
    #[arg(long, global = true, env = "ANCHORDESK_STORE", default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    /// Identity used as the owner of saved broadcasts
    #[arg(long, global = true, env = "ANCHORDESK_USER", default_value = DEFAULT_USER)]
    pub user: String,

    /// Studio settings file (JSON); missing fields keep their defaults
    #[arg(long, global = true, env = "ANCHORDESK_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
