use async_trait::async_trait;
use crate::error::BoxError;
use crate::store::multipart::local::LocalMultipartStorage;
use crate::store::multipart::s3::S3MultipartStorage;
use crate::store::types::CompletedPart;

pub type StorageResult<T> = Result<T, BoxError>;

/// Finalizes multipart uploads in object storage.
#[async_trait]
pub trait MultipartStorage: Send + Sync {
    /// Assembles the object from `parts`, in exactly the order given.
    async fn complete(
        &self,
        account_id: &str,
        blob_id: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> StorageResult<()>;
}

/// Object key for a blob in storage.
pub fn object_key(account_id: &str, blob_id: &str) -> String {
    format!("{}/{}", account_id, blob_id)
}

#[derive(Debug, Clone)]
pub enum MultipartStores {
    Local(LocalMultipartStorage),
    S3(S3MultipartStorage),
}

impl MultipartStores {
    /// Returns a reference to the inner value as a trait object.
    pub fn as_trait(&self) -> &dyn MultipartStorage {
        match self {
            MultipartStores::Local(a) => a,
            MultipartStores::S3(b) => b,
        }
    }
}

#[async_trait]
impl MultipartStorage for MultipartStores {
    async fn complete(
        &self,
        account_id: &str,
        blob_id: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> StorageResult<()> {
        self.as_trait().complete(account_id, blob_id, upload_id, parts).await
    }
}
