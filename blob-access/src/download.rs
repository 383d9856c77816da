//! Authorization for blob downloads.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use crate::auth::{authorize_account, IdentitySignals};
use crate::blob_id::BlobId;
use crate::error::AccessError;
use crate::principals::PrincipalRegistry;
use crate::signing::SignedUrlIssuer;
use crate::store::BlobMetadata;

/// Decides whether a caller may download a blob and, if so, hands back a signed
/// delivery URL.
#[derive(Clone)]
pub struct DownloadAuthorizer {
    registry: Arc<PrincipalRegistry>,
    blobs: Arc<dyn BlobMetadata>,
    issuer: SignedUrlIssuer,
}

impl DownloadAuthorizer {
    pub fn new(registry: Arc<PrincipalRegistry>, blobs: Arc<dyn BlobMetadata>, issuer: SignedUrlIssuer) -> Self {
        Self {
            registry,
            blobs,
            issuer,
        }
    }

    /// Authenticates, authorizes and signs, in that order. Every check fails
    /// before any later collaborator is consulted.
    ///
    /// Absent, foreign and deleted blobs all produce the same `NotFound`.
    pub async fn authorize(
        &self,
        signals: &IdentitySignals,
        path_account_id: &str,
        blob_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AccessError> {
        let caller = authorize_account(signals, &self.registry, path_account_id)?;

        let id = BlobId::parse(blob_id)?;

        let record = self
            .blobs
            .get_blob(&caller.account_id, &id.base)
            .await
            .map_err(|e| AccessError::server_fail("Failed to look up blob", e))?
            .ok_or(AccessError::NotFound)?;
        if record.account_id != caller.account_id {
            tracing::warn!(
                account_id = %caller.account_id,
                owner = %record.account_id,
                "Blob record is owned by a different account"
            );
            return Err(AccessError::NotFound);
        }
        if record.is_deleted() {
            return Err(AccessError::NotFound);
        }

        let signed = self.issuer.issue(&caller.account_id, blob_id, now)?;
        tracing::debug!(
            account_id = %caller.account_id,
            blob_id,
            ranged = id.has_range(),
            "Issued signed download URL"
        );
        Ok(signed)
    }
}
