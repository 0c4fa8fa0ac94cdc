//! In-process record store.
//!
//! Backs tests and single-process runs. Records live in insertion order and
//! every mutation publishes a full snapshot to subscribers.

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::domain::{Broadcast, NewBroadcast, Visibility};
use crate::error::PortError;
use crate::ports::RecordStorePort;

const SUBSCRIBER_BUFFER: usize = 16;

pub struct InMemoryRecordStore {
    records: RwLock<IndexMap<String, Broadcast>>,
    changes: broadcast::Sender<Vec<Broadcast>>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Seed with existing records, keeping their ids.
    pub fn with_records(records: impl IntoIterator<Item = Broadcast>) -> Self {
        let (changes, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        let records = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: RwLock::new(records),
            changes,
        }
    }

    fn publish(&self, records: &IndexMap<String, Broadcast>) {
        // No subscribers is fine.
        let _ = self.changes.send(records.values().cloned().collect());
    }
}

#[async_trait]
impl RecordStorePort for InMemoryRecordStore {
    async fn create(&self, record: NewBroadcast) -> Result<Broadcast, PortError> {
        let broadcast = record.into_broadcast(Uuid::new_v4().to_string());
        let mut records = self.records.write().await;
        records.insert(broadcast.id.clone(), broadcast.clone());
        self.publish(&records);
        Ok(broadcast)
    }

    async fn get(&self, id: &str) -> Result<Option<Broadcast>, PortError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn update_visibility(&self, id: &str, visibility: Visibility) -> Result<(), PortError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| PortError::NotFound(id.to_string()))?;
        record.visibility = visibility;
        self.publish(&records);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), PortError> {
        let mut records = self.records.write().await;
        records
            .shift_remove(id)
            .ok_or_else(|| PortError::NotFound(id.to_string()))?;
        self.publish(&records);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Broadcast>, PortError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<Broadcast>> {
        self.changes.subscribe()
    }
}
