//! CloudFront canned-policy signed URLs.
//!
//! The policy document is signed with RSA PKCS#1 v1.5 over SHA-1, base64 encoded
//! with CloudFront's URL-safe substitutions, and appended as `Expires`,
//! `Signature` and `Key-Pair-Id` query parameters.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use url::Url;
use crate::signing::{SigningError, UrlSigner};

/// Parses a PEM private key in PKCS#1 (`BEGIN RSA PRIVATE KEY`) or PKCS#8
/// (`BEGIN PRIVATE KEY`) form.
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, SigningError> {
    let pem = pem.trim();
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| SigningError::InvalidKey(e.to_string()))
}

pub fn canned_policy(resource: &str, expires_at: i64) -> String {
    let resource = serde_json::to_string(resource).unwrap_or_default();
    format!(
        r#"{{"Statement":[{{"Resource":{},"Condition":{{"DateLessThan":{{"AWS:EpochTime":{}}}}}}}]}}"#,
        resource, expires_at
    )
}

fn encode_signature(bytes: &[u8]) -> String {
    STANDARD
        .encode(bytes)
        .chars()
        .map(|c| match c {
            '+' => '-',
            '=' => '_',
            '/' => '~',
            other => other,
        })
        .collect()
}

fn decode_signature(text: &str) -> Result<Vec<u8>, SigningError> {
    let standard: String = text
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '=',
            '~' => '/',
            other => other,
        })
        .collect();
    STANDARD
        .decode(standard)
        .map_err(|e| SigningError::Malformed(format!("signature is not base64: {}", e)))
}

/// Signs delivery URLs with one CloudFront key pair.
pub struct CloudFrontSigner {
    key_pair_id: String,
    signing_key: SigningKey<Sha1>,
}

impl std::fmt::Debug for CloudFrontSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudFrontSigner")
            .field("key_pair_id", &self.key_pair_id)
            .finish_non_exhaustive()
    }
}

impl CloudFrontSigner {
    pub fn new(key_pair_id: impl Into<String>, private_key: RsaPrivateKey) -> Self {
        Self {
            key_pair_id: key_pair_id.into(),
            signing_key: SigningKey::<Sha1>::new(private_key),
        }
    }

    pub fn from_pem(key_pair_id: impl Into<String>, pem: &str) -> Result<Self, SigningError> {
        Ok(Self::new(key_pair_id, parse_private_key(pem)?))
    }
}

impl UrlSigner for CloudFrontSigner {
    fn key_pair_id(&self) -> &str {
        &self.key_pair_id
    }

    fn sign(&self, url: &str, expires_at: DateTime<Utc>) -> Result<String, SigningError> {
        // The policy must name the URL exactly as the viewer will request it.
        let resource: String = Url::parse(url)
            .map_err(|e| SigningError::Malformed(e.to_string()))?
            .into();
        let expires = expires_at.timestamp();
        let policy = canned_policy(&resource, expires);
        let signature = self
            .signing_key
            .try_sign(policy.as_bytes())
            .map_err(|e| SigningError::Sign(e.to_string()))?;

        let separator = if resource.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{}{}Expires={}&Signature={}&Key-Pair-Id={}",
            resource,
            separator,
            expires,
            encode_signature(&signature.to_bytes()),
            self.key_pair_id
        ))
    }
}

/// The pieces of a signed URL, as the delivery network reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrlParts {
    /// The URL without the signing parameters; this is the policy's resource.
    pub resource: String,
    pub expires: i64,
    pub signature: Vec<u8>,
    pub key_pair_id: String,
}

impl SignedUrlParts {
    pub fn parse(signed_url: &str) -> Result<Self, SigningError> {
        let url = Url::parse(signed_url).map_err(|e| SigningError::Malformed(e.to_string()))?;

        let mut expires = None;
        let mut signature = None;
        let mut key_pair_id = None;
        let mut kept: Vec<(String, String)> = Vec::new();
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "Expires" => expires = Some(value.into_owned()),
                "Signature" => signature = Some(value.into_owned()),
                "Key-Pair-Id" => key_pair_id = Some(value.into_owned()),
                _ => kept.push((name.into_owned(), value.into_owned())),
            }
        }

        let missing = |name: &str| SigningError::Malformed(format!("missing {} parameter", name));
        let expires = expires
            .ok_or_else(|| missing("Expires"))?
            .parse::<i64>()
            .map_err(|e| SigningError::Malformed(format!("bad Expires: {}", e)))?;
        let signature = decode_signature(&signature.ok_or_else(|| missing("Signature"))?)?;
        let key_pair_id = key_pair_id.ok_or_else(|| missing("Key-Pair-Id"))?;

        let mut resource = url.clone();
        if kept.is_empty() {
            resource.set_query(None);
        } else {
            resource.query_pairs_mut().clear().extend_pairs(kept);
        }

        Ok(Self {
            resource: resource.into(),
            expires,
            signature,
            key_pair_id,
        })
    }
}

/// Checks a canned-policy signature against one public key.
pub fn verify_signature(public_key: &RsaPublicKey, parts: &SignedUrlParts) -> Result<(), SigningError> {
    let verifying_key = VerifyingKey::<Sha1>::new(public_key.clone());
    let signature = Signature::try_from(parts.signature.as_slice())
        .map_err(|e| SigningError::Malformed(e.to_string()))?;
    let policy = canned_policy(&parts.resource, parts.expires);
    verifying_key
        .verify(policy.as_bytes(), &signature)
        .map_err(|_| SigningError::BadSignature)
}
