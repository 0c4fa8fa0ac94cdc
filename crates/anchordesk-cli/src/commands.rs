//! Subcommand definitions.

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate, voice, and play a studio broadcast
    Studio {
        /// Topic for the anchors to discuss
        topic: String,

        /// Follow-up topic prepared in the background and played afterwards (repeatable)
        #[arg(long = "queue", value_name = "TOPIC")]
        queue: Vec<String>,

        /// Visibility of the saved broadcast: public or private
        #[arg(long)]
        visibility: Option<String>,

        /// Delivery tone: serious, satire, dramatic, casual, optimistic
        #[arg(long)]
        tone: Option<String>,
    },

    /// Browse and manage saved broadcasts
    #[command(subcommand)]
    Feed(FeedCommand),

    /// Probe the coordinator and show the model pool
    Status,
}

#[derive(Subcommand, Debug)]
pub enum FeedCommand {
    /// List broadcasts visible to you, newest first
    List {
        /// Only your own broadcasts
        #[arg(long)]
        mine: bool,
    },

    /// Replay a saved broadcast
    Play {
        /// Broadcast id
        id: String,
    },

    /// Make one of your broadcasts public (or private again)
    Share {
        /// Broadcast id
        id: String,

        /// Make it private instead
        #[arg(long)]
        private: bool,
    },

    /// Delete one of your broadcasts
    Delete {
        /// Broadcast id
        id: String,
    },
}
