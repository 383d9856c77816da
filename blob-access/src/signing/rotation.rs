//! Signing key rotation.
//!
//! The phase comes from deployment configuration and never changes while the
//! process runs. Issuance only ever uses the current key; the phase decides which
//! key pairs the delivery network must still trust.
//!
//! Operators move `normal -> rotating` by deploying the new key as current and the
//! old one as previous, and only move `rotating -> complete` after at least one
//! full signed-URL TTL has passed, so every URL signed with the old key has
//! expired before that key stops being trusted.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use crate::error::StartupError;
use crate::signing::cloudfront::{verify_signature, SignedUrlParts};
use crate::signing::SigningError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationPhase {
    #[default]
    Normal,
    Rotating,
    Complete,
}

impl FromStr for RotationPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(RotationPhase::Normal),
            "rotating" => Ok(RotationPhase::Rotating),
            "complete" => Ok(RotationPhase::Complete),
            other => Err(format!("unknown rotation phase {:?}, expected normal, rotating or complete", other)),
        }
    }
}

impl fmt::Display for RotationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RotationPhase::Normal => "normal",
            RotationPhase::Rotating => "rotating",
            RotationPhase::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    pub phase: RotationPhase,
    pub current_key_pair_id: String,
    pub previous_key_pair_id: Option<String>,
}

impl RotationConfig {
    /// Rejects configurations that cannot hold the trust invariant.
    pub fn validate(&self) -> Result<(), StartupError> {
        if self.current_key_pair_id.is_empty() {
            return Err(StartupError::Rotation("current key pair id is empty".to_string()));
        }
        let previous = self.previous_key_pair_id.as_deref().filter(|p| !p.is_empty());
        match (self.phase, previous) {
            (RotationPhase::Rotating, None) => Err(StartupError::Rotation(
                "rotating phase requires a previous key pair id".to_string(),
            )),
            (RotationPhase::Rotating, Some(previous)) if previous == self.current_key_pair_id => {
                Err(StartupError::Rotation(
                    "previous key pair id must differ from the current one".to_string(),
                ))
            }
            (RotationPhase::Normal | RotationPhase::Complete, Some(previous)) => {
                tracing::warn!(
                    "Ignoring previous key pair {} outside the rotating phase (phase: {})",
                    previous,
                    self.phase
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Key pairs that must verify: two while rotating, otherwise one.
    pub fn trusted_key_pair_ids(&self) -> Vec<&str> {
        let mut ids = vec![self.current_key_pair_id.as_str()];
        if self.phase == RotationPhase::Rotating {
            if let Some(previous) = self.previous_key_pair_id.as_deref().filter(|p| !p.is_empty()) {
                ids.push(previous);
            }
        }
        ids
    }
}

/// Public keys trusted to verify signed URLs in a given phase.
#[derive(Debug, Clone)]
pub struct TrustSet {
    keys: HashMap<String, RsaPublicKey>,
}

impl TrustSet {
    /// Selects the phase's trusted keys from `public_keys`. Every trusted key pair
    /// must have a public key.
    pub fn new(
        config: &RotationConfig,
        public_keys: &HashMap<String, RsaPublicKey>,
    ) -> Result<Self, SigningError> {
        let mut keys = HashMap::new();
        for id in config.trusted_key_pair_ids() {
            let key = public_keys
                .get(id)
                .ok_or_else(|| SigningError::InvalidKey(format!("no public key for key pair {}", id)))?;
            keys.insert(id.to_string(), key.clone());
        }
        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Verifies a signed URL the way the delivery network does. Returns the key
    /// pair id that signed it.
    pub fn verify(&self, signed_url: &str, now: DateTime<Utc>) -> Result<String, SigningError> {
        let parts = SignedUrlParts::parse(signed_url)?;
        let key = self
            .keys
            .get(&parts.key_pair_id)
            .ok_or_else(|| SigningError::UntrustedKey(parts.key_pair_id.clone()))?;
        if now.timestamp() >= parts.expires {
            return Err(SigningError::Expired);
        }
        verify_signature(key, &parts)?;
        Ok(parts.key_pair_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rsa::RsaPrivateKey;
    use crate::signing::cloudfront::tests::test_key;
    use crate::signing::{CloudFrontSigner, UrlSigner};

    const URL: &str = "https://cdn.example.com/blobs/acct-1/abc123";

    fn config(phase: RotationPhase, previous: Option<&str>) -> RotationConfig {
        RotationConfig {
            phase,
            current_key_pair_id: "K-NEW".to_string(),
            previous_key_pair_id: previous.map(str::to_string),
        }
    }

    fn keys(old: &RsaPrivateKey, new: &RsaPrivateKey) -> HashMap<String, RsaPublicKey> {
        HashMap::from([
            ("K-OLD".to_string(), RsaPublicKey::from(old)),
            ("K-NEW".to_string(), RsaPublicKey::from(new)),
        ])
    }

    #[test]
    fn test_phase_parsing() {
        assert_eq!("rotating".parse::<RotationPhase>().unwrap(), RotationPhase::Rotating);
        assert_eq!(RotationPhase::Complete.to_string(), "complete");
        assert!("Rotating".parse::<RotationPhase>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(config(RotationPhase::Normal, None).validate().is_ok());
        assert!(config(RotationPhase::Rotating, Some("K-OLD")).validate().is_ok());
        assert!(config(RotationPhase::Complete, Some("K-OLD")).validate().is_ok());
        assert!(matches!(
            config(RotationPhase::Rotating, None).validate(),
            Err(StartupError::Rotation(_))
        ));
        assert!(matches!(
            config(RotationPhase::Rotating, Some("")).validate(),
            Err(StartupError::Rotation(_))
        ));
        assert!(matches!(
            config(RotationPhase::Rotating, Some("K-NEW")).validate(),
            Err(StartupError::Rotation(_))
        ));
    }

    #[test]
    fn test_trusted_key_count_per_phase() {
        assert_eq!(config(RotationPhase::Normal, Some("K-OLD")).trusted_key_pair_ids(), vec!["K-NEW"]);
        assert_eq!(
            config(RotationPhase::Rotating, Some("K-OLD")).trusted_key_pair_ids(),
            vec!["K-NEW", "K-OLD"]
        );
        assert_eq!(config(RotationPhase::Complete, Some("K-OLD")).trusted_key_pair_ids(), vec!["K-NEW"]);
    }

    #[test]
    fn test_old_urls_survive_rotation_until_complete() {
        let old = test_key();
        let new = test_key();
        let public_keys = keys(&old, &new);
        let now = Utc::now();

        // Issued under the old key just before rotation started.
        let old_signer = CloudFrontSigner::new("K-OLD", old.clone());
        let issued_before = old_signer.sign(URL, now + Duration::seconds(300)).unwrap();

        let rotating = TrustSet::new(&config(RotationPhase::Rotating, Some("K-OLD")), &public_keys).unwrap();
        assert_eq!(rotating.len(), 2);
        assert_eq!(rotating.verify(&issued_before, now).unwrap(), "K-OLD");

        let new_signer = CloudFrontSigner::new("K-NEW", new.clone());
        let issued_during = new_signer.sign(URL, now + Duration::seconds(300)).unwrap();
        assert_eq!(rotating.verify(&issued_during, now).unwrap(), "K-NEW");

        let complete = TrustSet::new(&config(RotationPhase::Complete, Some("K-OLD")), &public_keys).unwrap();
        assert_eq!(complete.len(), 1);
        assert!(matches!(
            complete.verify(&issued_before, now),
            Err(SigningError::UntrustedKey(id)) if id == "K-OLD"
        ));
        assert_eq!(complete.verify(&issued_during, now).unwrap(), "K-NEW");
    }

    #[test]
    fn test_expired_url_is_rejected() {
        let key = test_key();
        let public_keys = HashMap::from([("K-NEW".to_string(), RsaPublicKey::from(&key))]);
        let trust = TrustSet::new(&config(RotationPhase::Normal, None), &public_keys).unwrap();

        let now = Utc::now();
        let signed = CloudFrontSigner::new("K-NEW", key).sign(URL, now + Duration::seconds(300)).unwrap();
        assert!(trust.verify(&signed, now + Duration::seconds(299)).is_ok());
        assert!(matches!(trust.verify(&signed, now + Duration::seconds(301)), Err(SigningError::Expired)));
    }

    #[test]
    fn test_key_pair_id_must_match_key() {
        let old = test_key();
        let new = test_key();
        let public_keys = keys(&old, &new);
        let trust = TrustSet::new(&config(RotationPhase::Rotating, Some("K-OLD")), &public_keys).unwrap();

        // Signed with the old key but claiming the new key pair id.
        let forged = CloudFrontSigner::new("K-NEW", old)
            .sign(URL, Utc::now() + Duration::seconds(60))
            .unwrap();
        assert!(matches!(trust.verify(&forged, Utc::now()), Err(SigningError::BadSignature)));
    }

    #[test]
    fn test_missing_public_key() {
        let public_keys = HashMap::new();
        assert!(TrustSet::new(&config(RotationPhase::Normal, None), &public_keys).is_err());
    }
}
