//! Core services built on the ports.

pub mod library;
pub mod memory_store;

pub use library::{BroadcastLibrary, FeedSubscription};
pub use memory_store::InMemoryRecordStore;
