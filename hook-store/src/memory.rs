use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::store::{CaptureStore, StoreResult};
use crate::types::{CaptureId, CapturedBody, NewWebhook, Webhook, WebhookListItem};

/// A CaptureStore that keeps everything in process memory.
/// Captures are lost on restart, so this is meant for local development and tests.
#[derive(Default)]
pub struct MemoryCaptureStore {
    webhooks: RwLock<BTreeMap<CaptureId, Webhook>>,
}

impl MemoryCaptureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.webhooks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.webhooks.read().await.is_empty()
    }
}

#[async_trait]
impl CaptureStore for MemoryCaptureStore {
    async fn find_by_id(&self, id: CaptureId) -> StoreResult<Option<Webhook>> {
        Ok(self.webhooks.read().await.get(&id).cloned())
    }

    async fn find_many(
        &self,
        limit: u32,
        cursor: Option<CaptureId>,
    ) -> StoreResult<Vec<WebhookListItem>> {
        let webhooks = self.webhooks.read().await;
        let upper = match cursor {
            Some(cursor) => Bound::Excluded(cursor),
            None => Bound::Unbounded,
        };

        Ok(webhooks
            .range((Bound::Unbounded, upper))
            .rev()
            .take(limit as usize + 1)
            .map(|(_, webhook)| WebhookListItem::from(webhook))
            .collect())
    }

    async fn fetch_bodies(&self, ids: &[CaptureId]) -> StoreResult<Vec<CapturedBody>> {
        let webhooks = self.webhooks.read().await;

        Ok(ids
            .iter()
            .filter_map(|id| webhooks.get(id))
            .map(|webhook| CapturedBody {
                id: webhook.id,
                body: webhook.body.clone(),
            })
            .collect())
    }

    async fn create(&self, webhook: NewWebhook) -> StoreResult<Webhook> {
        let mut webhooks = self.webhooks.write().await;

        // Two captures in the same millisecond could mint ids out of order, keep the map
        // consistent with creation order by never going below the newest id.
        let mut id = CaptureId::now();
        while webhooks.keys().next_back().is_some_and(|newest| *newest >= id) {
            id = CaptureId::now();
        }

        let webhook = Webhook {
            id,
            method: webhook.method,
            pathname: webhook.pathname,
            ip: webhook.ip,
            content_type: webhook.content_type,
            content_length: webhook.content_length,
            headers: sqlx::types::Json(webhook.headers),
            body: webhook.body,
            created_at: Utc::now(),
        };
        webhooks.insert(id, webhook.clone());

        Ok(webhook)
    }

    async fn delete(&self, id: CaptureId) -> StoreResult<bool> {
        Ok(self.webhooks.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_webhook(pathname: &str, body: Option<&str>) -> NewWebhook {
        NewWebhook {
            method: "POST".to_owned(),
            pathname: pathname.to_owned(),
            ip: "127.0.0.1".to_owned(),
            body: body.map(str::to_owned),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryCaptureStore::new();
        let created = store
            .create(new_webhook("/github", Some(r#"{"a":1}"#)))
            .await
            .unwrap();

        let found = store.find_by_id(created.id).await.unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(store.find_by_id(CaptureId::now()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ids_follow_creation_order() {
        let store = MemoryCaptureStore::new();
        let mut ids = Vec::new();
        for i in 0..50 {
            ids.push(store.create(new_webhook(&format!("/{i}"), None)).await.unwrap().id);
        }

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn test_find_many_is_newest_first_and_keyset_paginated() {
        let store = MemoryCaptureStore::new();
        for i in 0..5 {
            store.create(new_webhook(&format!("/{i}"), None)).await.unwrap();
        }

        let first_page = store.find_many(2, None).await.unwrap();
        assert_eq!(first_page.len(), 3);
        assert_eq!(first_page[0].pathname, "/4");
        assert_eq!(first_page[1].pathname, "/3");

        let cursor = first_page[1].id;
        let second_page = store.find_many(2, Some(cursor)).await.unwrap();
        assert_eq!(
            second_page.iter().map(|w| w.pathname.as_str()).collect::<Vec<_>>(),
            vec!["/2", "/1", "/0"]
        );

        let last_page = store.find_many(2, Some(second_page[1].id)).await.unwrap();
        assert_eq!(last_page.len(), 1);
        assert_eq!(last_page[0].pathname, "/0");
    }

    #[tokio::test]
    async fn test_fetch_bodies_drops_missing_ids() {
        let store = MemoryCaptureStore::new();
        let with_body = store.create(new_webhook("/a", Some("{}"))).await.unwrap();
        let without_body = store.create(new_webhook("/b", None)).await.unwrap();

        let bodies = store
            .fetch_bodies(&[with_body.id, CaptureId::now(), without_body.id])
            .await
            .unwrap();

        assert_eq!(
            bodies,
            vec![
                CapturedBody {
                    id: with_body.id,
                    body: Some("{}".to_owned())
                },
                CapturedBody {
                    id: without_body.id,
                    body: None
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryCaptureStore::new();
        let created = store.create(new_webhook("/a", None)).await.unwrap();

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert!(store.is_empty().await);
    }
}
