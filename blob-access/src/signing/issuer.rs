use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use url::Url;
use crate::error::AccessError;
use crate::signing::UrlSigner;

pub const DEFAULT_TTL_SECS: i64 = 300;

/// Path prefix under which the delivery network routes blob downloads.
const DELIVERY_PREFIX: &str = "blobs";

/// Issues signed delivery URLs for blobs with the active signing key.
#[derive(Clone)]
pub struct SignedUrlIssuer {
    domain: String,
    ttl: Duration,
    signer: Arc<dyn UrlSigner>,
}

impl std::fmt::Debug for SignedUrlIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedUrlIssuer")
            .field("domain", &self.domain)
            .field("ttl", &self.ttl)
            .field("key_pair_id", &self.signer.key_pair_id())
            .finish()
    }
}

impl SignedUrlIssuer {
    pub fn new(domain: impl Into<String>, ttl: Duration, signer: Arc<dyn UrlSigner>) -> Self {
        Self {
            domain: domain.into(),
            ttl,
            signer,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// `https://<domain>/blobs/<account>/<blob>`. The blob id is passed through as
    /// requested, range suffix included, so the edge can derive the Range header.
    pub fn delivery_url(&self, account_id: &str, blob_id: &str) -> Result<Url, AccessError> {
        let mut url = Url::parse(&format!("https://{}/", self.domain))
            .map_err(|e| AccessError::server_fail("Failed to generate download URL", e))?;
        url.path_segments_mut()
            .map_err(|_| AccessError::inconsistent("Failed to generate download URL"))?
            .clear()
            .extend([DELIVERY_PREFIX, account_id, blob_id]);
        Ok(url)
    }

    /// Signs the delivery URL so it expires `ttl` after `now`. No retry on failure.
    pub fn issue(&self, account_id: &str, blob_id: &str, now: DateTime<Utc>) -> Result<String, AccessError> {
        let url = self.delivery_url(account_id, blob_id)?;
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AccessError::inconsistent("Failed to generate download URL"))?;
        self.signer
            .sign(url.as_str(), expires_at)
            .map_err(|e| AccessError::server_fail("Failed to generate download URL", e))
    }
}
