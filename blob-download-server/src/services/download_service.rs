use actix_web::http::header;
use actix_web::{get, web, HttpRequest, HttpResponse};
use chrono::Utc;
use tracing::Instrument;
use crate::errors::DownloadErr;
use crate::services::{request_id, AppState};

/// Redirects an authorized caller to a short-lived signed delivery URL.
#[get("/{account_id}/{blob_id}")]
pub async fn download(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, DownloadErr> {
    let (account_id, blob_id) = path.into_inner();
    let span = tracing::info_span!("download", request_id = %request_id(&req), %account_id, %blob_id);

    async move {
        let signals = shared_state.identity.signals(&req);
        let location = shared_state
            .downloads
            .authorize(&signals, &account_id, &blob_id, Utc::now())
            .await
            .map_err(|e| {
                let err = DownloadErr::from(e);
                err.log();
                err
            })?;

        Ok(HttpResponse::Found()
            .append_header((header::LOCATION, location))
            .append_header((header::CACHE_CONTROL, "no-store"))
            .finish())
    }
    .instrument(span)
    .await
}
