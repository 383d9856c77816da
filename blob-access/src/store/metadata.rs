use std::collections::HashMap;
use std::sync::RwLock;
use async_trait::async_trait;
use crate::error::BoxError;
use crate::store::types::BlobRecord;

/// Lookup of blob metadata by account and base blob id.
#[async_trait]
pub trait BlobMetadata: Send + Sync {
    /// Returns `None` when no record exists. The id must never carry a range suffix.
    async fn get_blob(&self, account_id: &str, blob_id: &str) -> Result<Option<BlobRecord>, BoxError>;
}

/// Keeps records in memory, keyed by `(account_id, blob_id)`. Used for local
/// development and tests.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    records: RwLock<HashMap<(String, String), BlobRecord>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record under an explicit key. The key need not agree with the
    /// record's own `account_id`, which lets tests model mis-keyed data.
    pub fn insert(&self, account_id: &str, blob_id: &str, record: BlobRecord) {
        if let Ok(mut records) = self.records.write() {
            records.insert((account_id.to_string(), blob_id.to_string()), record);
        }
    }
}

#[async_trait]
impl BlobMetadata for MemoryBlobStore {
    async fn get_blob(&self, account_id: &str, blob_id: &str) -> Result<Option<BlobRecord>, BoxError> {
        let records = self
            .records
            .read()
            .map_err(|_| "blob record map lock poisoned")?;
        Ok(records
            .get(&(account_id.to_string(), blob_id.to_string()))
            .cloned())
    }
}
