//! Command-line adapter for anchordesk.
//!
//! `main.rs` parses arguments and dispatches; everything it needs lives
//! here so the wiring and handlers stay testable.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used only by the binary target.
use dotenvy as _;
use tracing_subscriber as _;

pub mod adapters;
pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, FeedCommand};
pub use error::CliError;
pub use parser::Cli;
