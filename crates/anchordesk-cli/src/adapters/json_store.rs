//! Record store persisted to a single JSON file.
//!
//! The whole collection is loaded on open and rewritten after every
//! mutation: serialized to a sibling temp file, then renamed over the
//! original so a crash never leaves a half-written feed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};
use uuid::Uuid;

use anchordesk_core::ports::RecordStorePort;
use anchordesk_core::{Broadcast, NewBroadcast, PortError, Visibility};

const SUBSCRIBER_BUFFER: usize = 16;

pub struct JsonFileStore {
    path: PathBuf,
    records: RwLock<IndexMap<String, Broadcast>>,
    changes: broadcast::Sender<Vec<Broadcast>>,
}

impl JsonFileStore {
    /// Load `path`, or start empty if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PortError> {
        let path = path.into();
        let records: Vec<Broadcast> = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| PortError::Storage(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(PortError::Storage(format!("{}: {e}", path.display()))),
        };
        info!(target: "anchordesk.store", path = %path.display(), records = records.len(), "Record store opened");

        let (changes, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        Ok(Self {
            path,
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|record| (record.id.clone(), record))
                    .collect(),
            ),
            changes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist and publish. Called with the write lock held so writes land
    /// in mutation order.
    async fn commit(&self, records: &IndexMap<String, Broadcast>) -> Result<(), PortError> {
        let snapshot: Vec<Broadcast> = records.values().cloned().collect();
        write_atomic(&self.path, &snapshot).await?;
        let _ = self.changes.send(snapshot);
        Ok(())
    }
}

async fn write_atomic(path: &Path, records: &[Broadcast]) -> Result<(), PortError> {
    let storage = |e: &dyn std::fmt::Display| PortError::Storage(format!("{}: {e}", path.display()));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| storage(&e))?;
    }
    let json = serde_json::to_vec_pretty(records).map_err(|e| storage(&e))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, json).await.map_err(|e| storage(&e))?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| storage(&e))?;

    debug!(target: "anchordesk.store", path = %path.display(), records = records.len(), "Record store written");
    Ok(())
}

#[async_trait]
impl RecordStorePort for JsonFileStore {
    async fn create(&self, record: NewBroadcast) -> Result<Broadcast, PortError> {
        let broadcast = record.into_broadcast(Uuid::new_v4().to_string());
        let mut records = self.records.write().await;
        records.insert(broadcast.id.clone(), broadcast.clone());
        if let Err(e) = self.commit(&records).await {
            records.shift_remove(&broadcast.id);
            return Err(e);
        }
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
        let previous = std::mem::replace(&mut record.visibility, visibility);
        if let Err(e) = self.commit(&records).await {
            if let Some(record) = records.get_mut(id) {
                record.visibility = previous;
            }
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), PortError> {
        let mut records = self.records.write().await;
        let index = records
            .get_index_of(id)
            .ok_or_else(|| PortError::NotFound(id.to_string()))?;
        let removed = records.shift_remove_index(index);
        if let Err(e) = self.commit(&records).await {
            if let Some((key, record)) = removed {
                records.shift_insert(index, key, record);
            }
            return Err(e);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Broadcast>, PortError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<Broadcast>> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchordesk_core::{DialogueLine, Speaker};
    use chrono::Utc;

    fn new_record(owner: &str, topic: &str) -> NewBroadcast {
        NewBroadcast {
            topic: topic.into(),
            dialogue: vec![
                DialogueLine::new(Speaker::A, "Good evening."),
                DialogueLine::new(Speaker::B, "Thanks, James."),
            ],
            visibility: Visibility::Private,
            timestamp: Utc::now(),
            owner: owner.into(),
        }
    }

    #[tokio::test]
    async fn test_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed").join("broadcasts.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        let first = store.create(new_record("dana", "Tides")).await.unwrap();
        let second = store.create(new_record("lee", "Ferries")).await.unwrap();
        store
            .update_visibility(&first.id, Visibility::Public)
            .await
            .unwrap();
        store.delete(&second.id).await.unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let records = reopened.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, first.id);
        assert_eq!(records[0].visibility, Visibility::Public);
        assert_eq!(records[0].dialogue.len(), 2);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_and_blank_files_open_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = JsonFileStore::open(dir.path().join("none.json")).await.unwrap();
        assert!(missing.list().await.unwrap().is_empty());

        let blank = dir.path().join("blank.json");
        std::fs::write(&blank, "  \n").unwrap();
        let store = JsonFileStore::open(&blank).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path).await,
            Err(PortError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_ids_and_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("b.json")).await.unwrap();
        let mut rx = store.subscribe();

        assert!(matches!(
            store.delete("nope").await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            store.update_visibility("nope", Visibility::Public).await,
            Err(PortError::NotFound(_))
        ));

        store.create(new_record("dana", "Tides")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().len(), 1);
    }
}
