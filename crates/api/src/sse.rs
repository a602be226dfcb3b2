//! Server-Sent Events (SSE) for real-time notifications.
//!
//! Each signed-in user gets a broadcast room; every open stream of that user
//! subscribes to it. Delivery is best-effort: events published while nobody
//! listens are dropped.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::{self, Stream};
use serde::Serialize;
use stackit_common::AppResult;
use stackit_core::{EventPublisher, NotificationEvent};
use tokio::sync::{RwLock, broadcast};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::{extractors::AuthUser, middleware::AppState};

const USER_CHANNEL_CAPACITY: usize = 100;

/// SSE event types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SseEvent {
    /// New notification for the stream owner.
    Notification { notification: NotificationEvent },
    /// Connection established.
    Connected,
}

impl SseEvent {
    const fn name(&self) -> &'static str {
        match self {
            Self::Notification { .. } => "notification",
            Self::Connected => "connected",
        }
    }

    fn into_event(self) -> Event {
        Event::default()
            .event(self.name())
            .json_data(&self)
            .unwrap_or_else(|_| Event::default().data("error"))
    }
}

/// Per-user broadcast rooms.
#[derive(Clone, Default)]
pub struct SseBroadcaster {
    user_channels: Arc<RwLock<HashMap<String, broadcast::Sender<SseEvent>>>>,
}

impl SseBroadcaster {
    /// Create a new SSE broadcaster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a user-specific channel.
    pub async fn user_channel(&self, user_id: &str) -> broadcast::Sender<SseEvent> {
        let mut channels = self.user_channels.write().await;
        channels
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(USER_CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Broadcast an event to a specific user.
    ///
    /// Returns the number of streams that received it.
    pub async fn broadcast_to_user(&self, user_id: &str, event: SseEvent) -> usize {
        let channels = self.user_channels.read().await;
        channels
            .get(user_id)
            .and_then(|sender| sender.send(event).ok())
            .unwrap_or(0)
    }

    /// Clean up inactive user channels.
    pub async fn cleanup(&self) {
        let mut channels = self.user_channels.write().await;
        channels.retain(|_, sender| sender.receiver_count() > 0);
    }

    /// Number of users with a live room.
    pub async fn active_users(&self) -> usize {
        self.user_channels.read().await.len()
    }
}

#[async_trait]
impl EventPublisher for SseBroadcaster {
    async fn publish_notification(
        &self,
        user_id: &str,
        event: NotificationEvent,
    ) -> AppResult<()> {
        let delivered = self
            .broadcast_to_user(user_id, SseEvent::Notification { notification: event })
            .await;
        tracing::debug!(user_id = %user_id, delivered, "Published notification event");
        Ok(())
    }
}

/// User-specific SSE stream.
async fn user_stream(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.sse_broadcaster.user_channel(&user.id).await.subscribe();
    tracing::debug!(user_id = %user.id, "SSE stream opened");

    // Lagged receivers skip the missed events
    let events = BroadcastStream::new(rx)
        .filter_map(|result| result.ok().map(|event| Ok(event.into_event())));

    let initial = stream::once(async { Ok(SseEvent::Connected.into_event()) });

    Sse::new(initial.chain(events)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

/// Create SSE router.
pub fn router() -> Router<AppState> {
    Router::new().route("/user", get(user_stream))
}
