use std::path::Path;
use std::sync::Arc;
use async_trait::async_trait;
use rocksdb::{Direction, IteratorMode, Options, DB};
use crate::error::BoxError;
use crate::principals::{PluginRecord, PluginSource, PLUGIN_PREFIX};
use crate::store::metadata::BlobMetadata;
use crate::store::types::{blob_key, BlobRecord};

/// RocksDB-backed metadata. Blob records live under `ACCOUNT#<a>#BLOB#<b>`, plugin
/// registrations under `PLUGIN#<id>`, both as JSON.
#[derive(Debug, Clone)]
pub struct RocksMetadataStore {
    db: Arc<DB>,
}

impl RocksMetadataStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, rocksdb::Error> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        let db = DB::open(&db_opts, db_path)?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn put_blob(&self, record: &BlobRecord) -> Result<(), BoxError> {
        let value = serde_json::to_vec(record)?;
        self.db
            .put(blob_key(&record.account_id, &record.blob_id), value)?;
        Ok(())
    }

    pub fn put_plugin(&self, record: &PluginRecord) -> Result<(), BoxError> {
        let value = serde_json::to_vec(record)?;
        self.db
            .put(format!("{}{}", PLUGIN_PREFIX, record.plugin_id), value)?;
        Ok(())
    }
}

#[async_trait]
impl BlobMetadata for RocksMetadataStore {
    async fn get_blob(&self, account_id: &str, blob_id: &str) -> Result<Option<BlobRecord>, BoxError> {
        match self.db.get(blob_key(account_id, blob_id))? {
            None => Ok(None),
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        }
    }
}

#[async_trait]
impl PluginSource for RocksMetadataStore {
    async fn list_plugins(&self, prefix: &str) -> Result<Vec<PluginRecord>, BoxError> {
        let mut plugins = Vec::new();
        let iter = self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            plugins.push(serde_json::from_slice(&value)?);
        }
        Ok(plugins)
    }
}
