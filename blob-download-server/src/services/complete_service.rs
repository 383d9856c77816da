use actix_web::{post, web, HttpRequest, HttpResponse};
use blob_access::{authorize_account, CompleteRequest};
use tracing::Instrument;
use crate::errors::DownloadErr;
use crate::services::{request_id, AppState, APP_TYPE_JSON};

/// Finalizes a multipart upload. The caller must be allowed to act for the
/// body's `accountId`.
#[post("/blob/complete")]
pub async fn complete(
    req: HttpRequest,
    request_json_bytes: web::Bytes,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, DownloadErr> {
    let span = tracing::info_span!(
        "complete",
        request_id = %request_id(&req),
        account_id = tracing::field::Empty
    );

    async move {
        let result = async {
            let request: CompleteRequest = serde_json::from_slice(&request_json_bytes)?;
            tracing::Span::current().record("account_id", request.account_id.as_str());

            let signals = shared_state.identity.signals(&req);
            authorize_account(&signals, &shared_state.registry, &request.account_id)?;

            let response = shared_state
                .completion
                .complete(&request.account_id, &request.blob_id, &request.parts)
                .await?;
            Ok::<_, DownloadErr>(response)
        }
        .await;

        match result {
            Ok(response) => Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).json(response)),
            Err(err) => {
                err.log();
                Err(err)
            }
        }
    }
    .instrument(span)
    .await
}
