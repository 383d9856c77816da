use actix_web::http::header::HeaderName;
use actix_web::HttpRequest;
use blob_access::IdentitySignals;
use serde_json::{Map, Value};

/// Names of the headers the fronting gateway sets after authenticating the
/// caller. The gateway must drop any client-supplied copies.
#[derive(Debug, Clone)]
pub struct IdentityHeaders {
    pub signer_arn: String,
    pub caller_id: String,
    pub claims: String,
}

impl Default for IdentityHeaders {
    fn default() -> Self {
        Self {
            signer_arn: "x-signer-arn".to_string(),
            caller_id: "x-caller-id".to_string(),
            claims: "x-authorizer-claims".to_string(),
        }
    }
}

impl IdentityHeaders {
    pub fn signals(&self, req: &HttpRequest) -> IdentitySignals {
        IdentitySignals {
            signer_arn: header_str(req, &self.signer_arn),
            caller_id: header_str(req, &self.caller_id),
            claims: header_str(req, &self.claims).map(|raw| parse_claims(&raw)),
        }
    }
}

fn header_str(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Claims that are not a JSON object still count as a session context, just one
/// without a usable `sub`.
fn parse_claims(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => {
            tracing::debug!("Ignoring malformed claims header");
            Map::new()
        }
    }
}

pub fn is_valid_header_name(name: &str) -> bool {
    HeaderName::from_bytes(name.as_bytes()).is_ok()
}
