use chrono::{DateTime, Utc};
use thiserror::Error;
use crate::error::StartupError;
use crate::store::SecretStore;

pub mod cloudfront;
pub mod issuer;
pub mod key_age;
pub mod rotation;

pub use cloudfront::CloudFrontSigner;
pub use issuer::SignedUrlIssuer;
pub use key_age::{KeyAge, KeyAgeMonitor};
pub use rotation::{RotationConfig, RotationPhase, TrustSet};

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Sign(String),

    #[error("malformed signed URL: {0}")]
    Malformed(String),

    #[error("key pair {0} is not trusted")]
    UntrustedKey(String),

    #[error("signed URL expired")]
    Expired,

    #[error("signature does not match")]
    BadSignature,
}

/// Produces time-limited signed delivery URLs.
pub trait UrlSigner: Send + Sync {
    /// Identifier of the key pair this signer uses.
    fn key_pair_id(&self) -> &str;

    fn sign(&self, url: &str, expires_at: DateTime<Utc>) -> Result<String, SigningError>;
}

/// Reads the current signing key from the secret store and builds the signer.
/// Called once at startup; any failure must stop the process.
pub async fn load_signer(
    secrets: &dyn SecretStore,
    secret_ref: &str,
    key_pair_id: &str,
) -> Result<CloudFrontSigner, StartupError> {
    let pem = secrets
        .get_private_key(secret_ref)
        .await
        .map_err(StartupError::SecretRead)?;
    let signer = CloudFrontSigner::from_pem(key_pair_id, &pem)?;
    tracing::info!("Loaded signing key for key pair {}", key_pair_id);
    Ok(signer)
}
