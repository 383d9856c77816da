use std::error::Error as StdError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use blob_access::{AccessError, ErrorKind};
use serde::Serialize;
use serde_json::error::Error as SerdeError;
use thiserror::Error;


#[derive(Debug, Error)]
pub enum DownloadErr {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Invalid request body")]
    Json(#[from] SerdeError),
}

/// The only error shape a caller ever sees.
#[derive(Serialize, Debug)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl DownloadErr {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DownloadErr::Access(e) => e.kind(),
            DownloadErr::Json(_) => ErrorKind::InvalidArguments,
        }
    }

    /// Logs the failure with its internal cause. Called inside the request span so
    /// the request id is attached.
    pub fn log(&self) {
        match self {
            DownloadErr::Access(e @ AccessError::ServerFail { .. }) => match e.source() {
                Some(source) => tracing::error!(error = %e, cause = %source, "Request failed"),
                None => tracing::error!(error = %e, "Request failed"),
            },
            DownloadErr::Json(e) => tracing::info!(cause = %e, "Rejected malformed request body"),
            other => tracing::info!(kind = ?other.kind(), error = %other, "Request rejected"),
        }
    }
}

impl ResponseError for DownloadErr {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidArguments => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound | ErrorKind::BlobNotFound => StatusCode::NOT_FOUND,
            ErrorKind::ServerFail => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = ErrorBody {
            kind: self.kind(),
            description: Some(self.to_string()).filter(|d| !d.is_empty()),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
