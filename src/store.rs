//! Typed access to persisted résumé records.
//!
//! [`ResumeStore`] wraps a [`KvStore`] and owns the `resume:<id>` key scheme
//! and the JSON encoding of [`ResumeRecord`]. Records are never deleted, so
//! a review that halted after its first write shows up in
//! [`ResumeStore::list_pending`] forever.

use crate::backend::KvStore;
use crate::error::{BackendError, ReviewError};
use crate::record::{resume_key, ResumeRecord, RESUME_KEY_PREFIX};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ResumeStore {
    kv: Arc<dyn KvStore>,
}

impl std::fmt::Debug for ResumeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeStore").finish_non_exhaustive()
    }
}

impl ResumeStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Create or overwrite the record under its key.
    pub async fn save(&self, record: &ResumeRecord) -> Result<(), BackendError> {
        let key = record.key();
        let value = serde_json::to_string(record)?;
        self.kv.set(&key, value).await?;
        debug!("Saved {} (pending: {})", key, record.feedback.is_pending());
        Ok(())
    }

    /// Load the record with `id`.
    pub async fn get(&self, id: &Uuid) -> Result<ResumeRecord, ReviewError> {
        let key = resume_key(id);
        let value = self
            .kv
            .get(&key)
            .await
            .map_err(ReviewError::Store)?
            .ok_or_else(|| ReviewError::RecordNotFound { id: id.to_string() })?;
        decode(&key, &value)
    }

    /// Load a record by the id string a user typed.
    pub async fn get_by_str(&self, id: &str) -> Result<ResumeRecord, ReviewError> {
        let id = id.trim().trim_start_matches(RESUME_KEY_PREFIX);
        let uuid = Uuid::parse_str(id).map_err(|_| ReviewError::RecordNotFound { id: id.to_string() })?;
        self.get(&uuid).await
    }

    /// Every record, sorted by key. Entries that do not decode are skipped
    /// with a warning.
    pub async fn list(&self) -> Result<Vec<ResumeRecord>, ReviewError> {
        let entries = self
            .kv
            .list(&format!("{RESUME_KEY_PREFIX}*"))
            .await
            .map_err(ReviewError::Store)?;

        let records = entries
            .into_iter()
            .filter_map(|entry| match decode(&entry.key, &entry.value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping record: {}", e);
                    None
                }
            })
            .collect();
        Ok(records)
    }

    /// Records whose review never finished.
    pub async fn list_pending(&self) -> Result<Vec<ResumeRecord>, ReviewError> {
        let mut records = self.list().await?;
        records.retain(|r| r.feedback.is_pending());
        Ok(records)
    }
}

fn decode(key: &str, value: &str) -> Result<ResumeRecord, ReviewError> {
    serde_json::from_str(value).map_err(|e| ReviewError::CorruptRecord {
        key: key.to_string(),
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryKvStore;
    use crate::record::FeedbackSlot;

    fn record(id: Uuid) -> ResumeRecord {
        ResumeRecord {
            id,
            resume_path: format!("{}/cv.pdf", id.simple()),
            image_path: format!("{}/cv.png", id.simple()),
            company_name: Some("Acme".into()),
            job_title: None,
            job_description: None,
            feedback: FeedbackSlot::Pending,
        }
    }

    #[tokio::test]
    async fn save_then_get() {
        let store = ResumeStore::new(Arc::new(MemoryKvStore::new()));
        let id = Uuid::new_v4();
        store.save(&record(id)).await.unwrap();

        let loaded = store.get(&id).await.unwrap();
        assert_eq!(loaded, record(id));

        let by_key = store.get_by_str(&format!("resume:{id}")).await.unwrap();
        assert_eq!(by_key.id, id);
    }

    #[tokio::test]
    async fn missing_and_bad_ids_are_not_found() {
        let store = ResumeStore::new(Arc::new(MemoryKvStore::new()));
        let err = store.get(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ReviewError::RecordNotFound { .. }));

        let err = store.get_by_str("not-a-uuid").await.unwrap_err();
        assert!(matches!(err, ReviewError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn list_skips_corrupt_and_foreign_keys() {
        let kv = Arc::new(MemoryKvStore::new());
        let store = ResumeStore::new(kv.clone());
        let id = Uuid::new_v4();
        store.save(&record(id)).await.unwrap();
        kv.set("resume:broken", "{not json".into()).await.unwrap();
        kv.set("session:1", "{}".into()).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);

        let err = store.get_by_str("broken").await.unwrap_err();
        assert!(matches!(err, ReviewError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn corrupt_record_is_reported_on_get() {
        let kv = Arc::new(MemoryKvStore::new());
        let id = Uuid::new_v4();
        kv.set(&resume_key(&id), "[]".into()).await.unwrap();

        let err = ResumeStore::new(kv).get(&id).await.unwrap_err();
        assert!(matches!(err, ReviewError::CorruptRecord { .. }), "got: {err}");
    }
}
