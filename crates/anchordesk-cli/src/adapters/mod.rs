//! Concrete port implementations wired by [`bootstrap`](crate::bootstrap).

pub mod console;
pub mod json_store;
pub mod openai;
pub mod speech;

pub use console::{ConsoleEmitter, TerminalAudio};
pub use json_store::JsonFileStore;
pub use openai::OpenAiChat;
pub use speech::HttpSpeech;
