//! In-memory catalog, webhook event store and notification recorder.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Money, ProductId};
use crate::ports::{
    CatalogProduct, NotificationDispatcher, OrderNotification, ProductCatalog, SaveResult,
    WebhookEventRecord, WebhookEventRepository,
};

// ════════════════════════════════════════════════════════════════════
// Product catalog
// ════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<ProductId, CatalogProduct>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, id: i64, name: &str, price: i64, is_available: bool) -> Result<(), DomainError> {
        let id = ProductId::new(id)?;
        let product = CatalogProduct {
            id,
            name: name.to_string(),
            price: Money::try_new("price", price)?,
            is_available,
        };
        self.products.write().await.insert(id, product);
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<CatalogProduct>, DomainError> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }
}

// ════════════════════════════════════════════════════════════════════
// Webhook event store
// ════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct InMemoryWebhookEventRepository {
    records: RwLock<HashMap<String, WebhookEventRecord>>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.records.read().await.get(event_id).cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.event_id) {
            return Ok(SaveResult::AlreadyExists);
        }
        records.insert(record.event_id.clone(), record);
        Ok(SaveResult::Inserted)
    }

    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.processed_at >= timestamp);
        Ok((before - records.len()) as u64)
    }
}

// ════════════════════════════════════════════════════════════════════
// Notifications
// ════════════════════════════════════════════════════════════════════

/// Captures notifications for assertions; can be switched to fail.
#[derive(Default)]
pub struct RecordingNotificationDispatcher {
    sent: RwLock<Vec<OrderNotification>>,
    failing: AtomicBool,
}

impl RecordingNotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<OrderNotification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotificationDispatcher {
    async fn dispatch(&self, notification: OrderNotification) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "notification transport down",
            ));
        }
        self.sent.write().await.push(notification);
        Ok(())
    }
}
