use std::error::Error as StdError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::blob_id::BlobIdError;

/// Boxed error returned by collaborator implementations (stores, signers, storage backends).
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The error kinds that cross the trust boundary to the caller.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidArguments,
    Unauthenticated,
    Forbidden,
    NotFound,
    BlobNotFound,
    ServerFail,
}

/// Request-time errors.
///
/// The `Display` output of every variant is safe to hand to the caller. Internal
/// detail for `ServerFail` lives in `source` and is only ever logged.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("{0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Blob not found")]
    NotFound,

    #[error("Blob not found")]
    BlobNotFound,

    #[error("{description}")]
    ServerFail {
        description: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::InvalidArguments(_) => ErrorKind::InvalidArguments,
            AccessError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            AccessError::Forbidden(_) => ErrorKind::Forbidden,
            AccessError::NotFound => ErrorKind::NotFound,
            AccessError::BlobNotFound => ErrorKind::BlobNotFound,
            AccessError::ServerFail { .. } => ErrorKind::ServerFail,
        }
    }

    pub fn server_fail(description: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AccessError::ServerFail {
            description: description.into(),
            source: Some(source.into()),
        }
    }

    /// A server failure with no underlying error, used for internal inconsistencies.
    pub fn inconsistent(description: impl Into<String>) -> Self {
        AccessError::ServerFail {
            description: description.into(),
            source: None,
        }
    }
}

impl From<BlobIdError> for AccessError {
    fn from(e: BlobIdError) -> Self {
        tracing::warn!(error = %e, "Rejected blob id");
        AccessError::InvalidArguments("Invalid blobId format".to_string())
    }
}

/// Errors that stop the process before it serves any traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to read private key from secret store")]
    SecretRead(#[source] BoxError),

    #[error("Signing key material is invalid")]
    KeyMaterial(#[from] crate::signing::SigningError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid key rotation configuration: {0}")]
    Rotation(String),

    #[error("Failed to load principal registry")]
    RegistryLoad(#[source] BoxError),

    #[error("Failed to open metadata store")]
    Store(#[from] rocksdb::Error),

    #[error("Server I/O error")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_server_fail_display_hides_source() {
        let err = AccessError::server_fail(
            "Failed to retrieve blob metadata",
            std::io::Error::new(std::io::ErrorKind::Other, "disk on fire at /var/lib/db"),
        );
        assert_eq!(err.to_string(), "Failed to retrieve blob metadata");
        assert!(err.source().is_some());
        assert_eq!(err.kind(), ErrorKind::ServerFail);
    }

    #[test]
    fn test_error_kind_wire_names() {
        let names: Vec<String> = [
            ErrorKind::InvalidArguments,
            ErrorKind::Unauthenticated,
            ErrorKind::Forbidden,
            ErrorKind::NotFound,
            ErrorKind::BlobNotFound,
            ErrorKind::ServerFail,
        ]
        .iter()
        .map(|k| serde_json::to_string(k).unwrap())
        .collect();
        assert_eq!(
            names,
            vec![
                "\"invalidArguments\"",
                "\"unauthenticated\"",
                "\"forbidden\"",
                "\"notFound\"",
                "\"blobNotFound\"",
                "\"serverFail\"",
            ]
        );
    }

    #[test]
    fn test_grammar_errors_are_invalid_arguments() {
        let causes = [
            BlobIdError::InvalidStart("x".parse::<u64>().unwrap_err()),
            BlobIdError::InvalidEnd("".parse::<u64>().unwrap_err()),
            BlobIdError::NegativeStart,
            BlobIdError::EmptyRange,
            BlobIdError::TooManySegments,
        ];
        for cause in causes {
            let err: AccessError = cause.into();
            assert_eq!(err.kind(), ErrorKind::InvalidArguments);
            assert_eq!(err.to_string(), "Invalid blobId format");
        }
    }
}
