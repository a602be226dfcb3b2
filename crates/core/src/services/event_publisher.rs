//! Event publisher service.
//!
//! Provides an abstraction for pushing real-time events to connected users.
//! The actual implementation lives in the API crate (per-user SSE rooms).

use async_trait::async_trait;
use serde::Serialize;
use stackit_common::AppResult;
use stackit_db::entities::notification;
use std::sync::Arc;

/// Payload pushed to a user when a notification is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub related_id: String,
    pub related_type: String,
    pub question_id: Option<String>,
    pub created_at: String,
}

impl From<&notification::Model> for NotificationEvent {
    fn from(n: &notification::Model) -> Self {
        Self {
            id: n.id.clone(),
            notification_type: n.notification_type.as_str().to_string(),
            title: n.title.clone(),
            message: n.message.clone(),
            related_id: n.related_id.clone(),
            related_type: n.related_type.as_str().to_string(),
            question_id: n.question_id.clone(),
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Trait for publishing real-time events.
///
/// Delivery is best-effort: no confirmation, no retry, and no ordering
/// guarantee relative to other events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Push a notification to every active session of `user_id`.
    async fn publish_notification(&self, user_id: &str, event: NotificationEvent)
    -> AppResult<()>;
}

/// A no-op implementation of `EventPublisher` for tests or when streaming is disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_notification(
        &self,
        _user_id: &str,
        _event: NotificationEvent,
    ) -> AppResult<()> {
        Ok(())
    }
}

/// Shared handle to an `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;
