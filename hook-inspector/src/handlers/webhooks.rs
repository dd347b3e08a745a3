use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use hook_store::{CaptureId, Webhook, WebhookListItem};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPage {
    pub webhooks: Vec<WebhookListItem>,
    /// Pass back as `cursor` to fetch the next page. `None` on the last page.
    pub next_cursor: Option<CaptureId>,
}

/// List captures, newest first.
pub async fn list_webhooks(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<WebhookPage>, ApiError> {
    let Query(params) = params?;
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let cursor = params
        .cursor
        .as_deref()
        .map(str::parse::<CaptureId>)
        .transpose()?;

    let mut webhooks = state.store.find_many(limit, cursor).await?;

    // The store returns one extra row when there's another page.
    let next_cursor = if webhooks.len() > limit as usize {
        webhooks.truncate(limit as usize);
        webhooks.last().map(|webhook| webhook.id)
    } else {
        None
    };

    Ok(Json(WebhookPage {
        webhooks,
        next_cursor,
    }))
}

pub async fn get_webhook(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Webhook>, ApiError> {
    let id: CaptureId = id.parse()?;
    match state.store.find_by_id(id).await? {
        Some(webhook) => Ok(Json(webhook)),
        None => Err(ApiError::NotFound),
    }
}

pub async fn delete_webhook(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CaptureId = id.parse()?;
    if state.store.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
