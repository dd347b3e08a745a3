//! Storage for captured webhook requests.
//!
//! The [`CaptureStore`] trait is the seam the HTTP service and the handler generator consume.
//! Two backends implement it: [`PgCaptureStore`] for production and [`MemoryCaptureStore`] for
//! local development and tests.
pub mod memory;
pub mod postgres;
pub mod store;
pub mod types;

pub use memory::MemoryCaptureStore;
pub use postgres::PgCaptureStore;
pub use store::{CaptureStore, StoreError, StoreResult};
pub use types::{CaptureId, CapturedBody, InvalidCaptureId, NewWebhook, Webhook, WebhookListItem};
