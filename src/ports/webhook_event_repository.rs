//! WebhookEventRepository port - tracks which provider events have been applied.
//!
//! The provider may deliver an event more than once. Handlers are idempotent
//! on their own; this store is the fast path that short-circuits a redelivery
//! and keeps an audit trail. Only applied (`success`) and acknowledged
//! (`ignored`) outcomes are recorded, so a failed attempt is retried in full.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// How an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Success,
    Ignored,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Success => "success",
            WebhookOutcome::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(WebhookOutcome::Success),
            "ignored" => Some(WebhookOutcome::Ignored),
            _ => None,
        }
    }
}

/// Record of a handled webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// `evt_...`
    pub event_id: String,
    pub event_type: String,
    pub processed_at: DateTime<Utc>,
    pub outcome: WebhookOutcome,
    /// Why the event was ignored, when it was.
    pub note: Option<String>,
    /// Original event payload for auditing.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    pub fn success(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: WebhookOutcome::Success,
            note: None,
            payload,
        }
    }

    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: WebhookOutcome::Ignored,
            note: Some(reason.into()),
            payload,
        }
    }
}

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    Inserted,
    /// A concurrent delivery recorded it first.
    AlreadyExists,
}

/// Implementations should key on `event_id` (`ON CONFLICT DO NOTHING`).
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Retention cleanup; returns the number of records removed.
    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError>;
}
