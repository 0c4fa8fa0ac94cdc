//! Record store port for the `news_broadcast` collection.
//!
//! The store is deliberately dumb: it holds records and publishes changes.
//! Visibility and ownership rules live in
//! [`BroadcastLibrary`](crate::services::BroadcastLibrary).

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::{Broadcast, NewBroadcast, Visibility};
use crate::error::PortError;

/// Collection name used by store adapters.
pub const BROADCAST_COLLECTION: &str = "news_broadcast";

#[async_trait]
pub trait RecordStorePort: Send + Sync {
    /// Insert a record and return it with its assigned id.
    async fn create(&self, record: NewBroadcast) -> Result<Broadcast, PortError>;

    async fn get(&self, id: &str) -> Result<Option<Broadcast>, PortError>;

    /// Fails with [`PortError::NotFound`] for an unknown id.
    async fn update_visibility(&self, id: &str, visibility: Visibility) -> Result<(), PortError>;

    /// Fails with [`PortError::NotFound`] for an unknown id.
    async fn delete(&self, id: &str) -> Result<(), PortError>;

    /// Every record, in no particular order.
    async fn list(&self) -> Result<Vec<Broadcast>, PortError>;

    /// Full snapshot after every change.
    fn subscribe(&self) -> broadcast::Receiver<Vec<Broadcast>>;
}
