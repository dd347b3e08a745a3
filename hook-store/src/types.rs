use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::{Uuid, Version};

/// Identifier of a captured request.
/// Backed by a UUIDv7, so ids sort lexicographically in capture order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct CaptureId(Uuid);

#[derive(Error, Debug, PartialEq, Eq)]
#[error("{0} is not a valid capture id")]
pub struct InvalidCaptureId(pub String);

impl CaptureId {
    /// Mint a new id for a capture happening now.
    pub fn now() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Accept any well-formed UUID, whatever its version.
    /// For bulk lookups, where an id we never minted simply matches nothing.
    pub fn parse_any(s: &str) -> Result<Self, InvalidCaptureId> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| InvalidCaptureId(s.to_owned()))
    }
}

impl From<Uuid> for CaptureId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Only UUIDv7 strings are accepted, anything else can't have been minted by us.
impl FromStr for CaptureId {
    type Err = InvalidCaptureId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Uuid::parse_str(s) {
            Ok(uuid) if uuid.get_version() == Some(Version::SortRand) => Ok(Self(uuid)),
            _ => Err(InvalidCaptureId(s.to_owned())),
        }
    }
}

impl fmt::Display for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A captured request, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: CaptureId,
    pub method: String,
    pub pathname: String,
    pub ip: String,
    pub content_type: Option<String>,
    pub content_length: Option<i32>,
    pub headers: sqlx::types::Json<BTreeMap<String, String>>,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The subset of a `Webhook` returned when listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WebhookListItem {
    pub id: CaptureId,
    pub method: String,
    pub pathname: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Webhook> for WebhookListItem {
    fn from(webhook: &Webhook) -> Self {
        Self {
            id: webhook.id,
            method: webhook.method.clone(),
            pathname: webhook.pathname.clone(),
            created_at: webhook.created_at,
        }
    }
}

/// A request to be captured. The store assigns the id and creation time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewWebhook {
    pub method: String,
    pub pathname: String,
    pub ip: String,
    pub content_type: Option<String>,
    pub content_length: Option<i32>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

/// A stored body, as returned by bulk fetches.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CapturedBody {
    pub id: CaptureId,
    pub body: Option<String>,
}
