use std::sync::Arc;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{web, HttpMessage, HttpRequest};
use blob_access::{CompletionValidator, DownloadAuthorizer, PrincipalRegistry};
use uuid::Uuid;
use crate::identity::IdentityHeaders;

pub mod complete_service;
pub mod download_service;

pub const APP_TYPE_JSON: &str = "application/json";
pub const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;

pub struct AppState {
    pub(crate) identity: IdentityHeaders,
    pub(crate) registry: Arc<PrincipalRegistry>,
    pub(crate) downloads: DownloadAuthorizer,
    pub(crate) completion: CompletionValidator,
}

#[derive(Debug, Clone)]
pub struct RequestId(pub String);

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(complete_service::complete).service(download_service::download);
}

/// Correlation id of the current request, as assigned by [`request_id_middleware`].
pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

/// Reuses the inbound `x-request-id` when it is usable, otherwise mints one, and
/// echoes it on every response.
pub async fn request_id_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.call(req).await?;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    Ok(res)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::Arc;
    use actix_web::web;
    use blob_access::signing::{SignedUrlIssuer, SigningError, UrlSigner};
    use blob_access::store::multipart::local::LocalMultipartStorage;
    use blob_access::store::{BlobMetadata, BlobRecord, BlobStatus, MemoryBlobStore};
    use blob_access::{CompletionValidator, DownloadAuthorizer, PrincipalRegistry};
    use chrono::{DateTime, Duration, Utc};
    use crate::identity::IdentityHeaders;
    use super::AppState;

    pub const PLUGIN_ARN: &str = "arn:aws:iam::123456789012:role/MailPlugin";

    pub struct EchoSigner;

    impl UrlSigner for EchoSigner {
        fn key_pair_id(&self) -> &str {
            "K1"
        }

        fn sign(&self, url: &str, expires_at: DateTime<Utc>) -> Result<String, SigningError> {
            Ok(format!("{}?Expires={}&Key-Pair-Id=K1", url, expires_at.timestamp()))
        }
    }

    pub struct BrokenSigner;

    impl UrlSigner for BrokenSigner {
        fn key_pair_id(&self) -> &str {
            "K1"
        }

        fn sign(&self, _url: &str, _expires_at: DateTime<Utc>) -> Result<String, SigningError> {
            Err(SigningError::Sign("key unavailable".to_string()))
        }
    }

    pub fn record(account_id: &str, blob_id: &str, status: BlobStatus) -> BlobRecord {
        BlobRecord {
            blob_id: blob_id.to_string(),
            account_id: account_id.to_string(),
            size: 11,
            content_type: "message/rfc822".to_string(),
            storage_key: format!("{}/{}", account_id, blob_id),
            created_at: Utc::now(),
            deleted_at: None,
            status,
            multipart: false,
            upload_id: None,
        }
    }

    pub fn state(
        blobs: Arc<MemoryBlobStore>,
        signer: Arc<dyn UrlSigner>,
        storage_dir: &Path,
    ) -> web::Data<AppState> {
        let registry = Arc::new(PrincipalRegistry::from_principals([PLUGIN_ARN]));
        let issuer = SignedUrlIssuer::new("cdn.example.com", Duration::seconds(300), signer);
        let metadata: Arc<dyn BlobMetadata> = blobs;
        let storage = Arc::new(LocalMultipartStorage::new(storage_dir.to_path_buf()));
        web::Data::new(AppState {
            identity: IdentityHeaders::default(),
            registry: registry.clone(),
            downloads: DownloadAuthorizer::new(registry, metadata.clone(), issuer),
            completion: CompletionValidator::new(metadata, storage),
        })
    }
}
