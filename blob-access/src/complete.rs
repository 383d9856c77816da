//! Multipart upload completion.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::error::AccessError;
use crate::store::multipart::MultipartStorage;
use crate::store::{BlobMetadata, BlobStatus, CompletedPart};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub account_id: String,
    pub blob_id: String,
    #[serde(default)]
    pub parts: Vec<CompletedPart>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompleteResponse {
    pub account_id: String,
    pub blob_id: String,
}

/// Validates a multipart completion against the blob's record and finalizes it
/// in storage. The record's status is left for the upload pipeline to confirm.
#[derive(Clone)]
pub struct CompletionValidator {
    blobs: Arc<dyn BlobMetadata>,
    storage: Arc<dyn MultipartStorage>,
}

impl CompletionValidator {
    pub fn new(blobs: Arc<dyn BlobMetadata>, storage: Arc<dyn MultipartStorage>) -> Self {
        Self { blobs, storage }
    }

    pub async fn complete(
        &self,
        account_id: &str,
        blob_id: &str,
        parts: &[CompletedPart],
    ) -> Result<CompleteResponse, AccessError> {
        if parts.is_empty() {
            return Err(AccessError::InvalidArguments("parts must not be empty".to_string()));
        }

        let record = self
            .blobs
            .get_blob(account_id, blob_id)
            .await
            .map_err(|e| AccessError::server_fail("Failed to look up blob", e))?
            .ok_or(AccessError::BlobNotFound)?;

        if record.status != BlobStatus::Pending {
            return Err(AccessError::InvalidArguments("blob is not pending".to_string()));
        }
        if !record.multipart {
            return Err(AccessError::InvalidArguments("blob is not a multipart upload".to_string()));
        }
        let upload_id = match record.upload_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => {
                tracing::error!(account_id, blob_id, "Multipart blob record has no upload id");
                return Err(AccessError::inconsistent("multipart upload id missing"));
            }
        };

        self.storage
            .complete(account_id, blob_id, upload_id, parts)
            .await
            .map_err(|e| AccessError::server_fail("Failed to complete multipart upload", e))?;

        tracing::info!(account_id, blob_id, parts = parts.len(), "Completed multipart upload");
        Ok(CompleteResponse {
            account_id: account_id.to_string(),
            blob_id: blob_id.to_string(),
        })
    }
}
