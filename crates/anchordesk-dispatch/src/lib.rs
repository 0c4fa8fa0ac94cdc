//! Capacity-aware task dispatch for the broadcast pipeline.
//!
//! - [`pool`]: per-model concurrency counters and leases
//! - [`dispatcher`]: FIFO admission of typed tasks onto free model slots
//! - [`dialogue`]: script generation through a language model
//! - [`speech`]: parallel per-line speech synthesis

pub mod dialogue;
pub mod dispatcher;
pub mod pool;
pub mod speech;

pub use dialogue::{DialogueGenerator, parse_script};
pub use dispatcher::{DispatcherStatus, TaskDispatcher};
pub use pool::{CapacityPool, Lease, ModelLoad, ResourceModel};
pub use speech::SpeechSynthesizer;
