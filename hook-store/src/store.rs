use async_trait::async_trait;
use thiserror::Error;

use crate::types::{CaptureId, CapturedBody, NewWebhook, Webhook, WebhookListItem};

/// Enumeration of errors for operations with a CaptureStore.
/// Errors can originate from sqlx and are wrapped by us to provide additional context.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection failed with: {error}")]
    ConnectionError { error: sqlx::Error },
    #[error("{command} query failed with: {error}")]
    QueryError { command: String, error: sqlx::Error },
}

impl StoreError {
    /// Whether retrying the same operation later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::ConnectionError { .. } => true,
            StoreError::QueryError { error, .. } => matches!(
                error,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Tls(_)
            ),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence of captured requests.
#[async_trait]
pub trait CaptureStore {
    async fn find_by_id(&self, id: CaptureId) -> StoreResult<Option<Webhook>>;

    /// Keyset-paginated listing, newest first. Returns up to `limit + 1` items so callers can
    /// tell whether another page exists; `cursor` excludes it and everything newer.
    async fn find_many(
        &self,
        limit: u32,
        cursor: Option<CaptureId>,
    ) -> StoreResult<Vec<WebhookListItem>>;

    /// Bulk fetch of bodies. Order is unspecified and ids with no stored capture are omitted.
    async fn fetch_bodies(&self, ids: &[CaptureId]) -> StoreResult<Vec<CapturedBody>>;

    async fn create(&self, webhook: NewWebhook) -> StoreResult<Webhook>;

    /// Returns whether a capture was deleted.
    async fn delete(&self, id: CaptureId) -> StoreResult<bool>;
}
