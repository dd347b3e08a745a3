use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::Json;
use axum_client_ip::InsecureClientIp;
use bytes::Bytes;
use hook_store::{CaptureId, NewWebhook};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::ApiError;
use crate::metrics::WEBHOOKS_CAPTURED;
use crate::state::AppState;

const CAPTURE_PREFIX: &str = "/capture";

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureResponse {
    pub id: CaptureId,
}

/// Record any request sent under `/capture`, whatever its method or body.
pub async fn capture_webhook(
    State(state): State<AppState>,
    ip: Option<InsecureClientIp>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CaptureResponse>), ApiError> {
    let webhook = NewWebhook {
        method: method.to_string(),
        pathname: pathname(&uri),
        ip: ip
            .map(|InsecureClientIp(addr)| addr.to_string())
            .unwrap_or_else(|| "unknown".to_owned()),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
        content_length: content_length(&headers, &body),
        headers: flatten_headers(&headers),
        body: stored_body(&body),
    };

    let created = state.store.create(webhook).await?;
    debug!(
        capture_id = %created.id,
        method = %created.method,
        pathname = %created.pathname,
        "captured webhook"
    );
    metrics::counter!(WEBHOOKS_CAPTURED, &[("method", created.method.clone())]).increment(1);

    Ok((StatusCode::CREATED, Json(CaptureResponse { id: created.id })))
}

fn pathname(uri: &Uri) -> String {
    match uri.path().strip_prefix(CAPTURE_PREFIX) {
        Some("") => "/".to_owned(),
        Some(rest) => rest.to_owned(),
        None => uri.path().to_owned(),
    }
}

fn content_length(headers: &HeaderMap, body: &Bytes) -> Option<i32> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok());

    match declared {
        Some(length) => Some(length),
        None if body.is_empty() => None,
        None => i32::try_from(body.len()).ok(),
    }
}

/// Repeated headers are joined with `, `.
fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_owned(), joined)
        })
        .collect()
}

/// JSON bodies are stored pretty-printed, anything else as lossy UTF-8 text.
fn stored_body(body: &Bytes) -> Option<String> {
    if body.is_empty() {
        return None;
    }

    let pretty = serde_json::from_slice::<Value>(body)
        .and_then(|value| serde_json::to_string_pretty(&value));
    match pretty {
        Ok(pretty) => Some(pretty),
        Err(_) => Some(String::from_utf8_lossy(body).into_owned()),
    }
}
