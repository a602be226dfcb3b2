//! Fixtures shared by service tests.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use stackit_common::{AppError, AppResult};
use stackit_db::entities::{
    answer, question,
    user::{self, UserRole},
};

use super::event_publisher::{EventPublisher, NotificationEvent};

/// Records every published event.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<(String, NotificationEvent)>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<(String, NotificationEvent)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_notification(&self, user_id: &str, event: NotificationEvent) -> AppResult<()> {
        self.events.lock().unwrap().push((user_id.to_string(), event));
        Ok(())
    }
}

/// Fails every publish.
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish_notification(&self, _user_id: &str, _event: NotificationEvent) -> AppResult<()> {
        Err(AppError::Internal("socket layer down".to_string()))
    }
}

pub fn exec(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

pub fn empty_db() -> Arc<DatabaseConnection> {
    Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}

pub fn user_model(id: &str, role: UserRole) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: id.to_string(),
        username_lower: id.to_lowercase(),
        email: Some(format!("{id}@example.com")),
        token: Some(format!("token_{id}")),
        role,
        is_banned: false,
        avatar_url: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn question_model(id: &str, user_id: &str) -> question::Model {
    question::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        title: "Lifetimes".to_string(),
        description: "How do lifetimes interact with async blocks?".to_string(),
        votes: 0,
        view_count: 0,
        answers_count: 0,
        accepted_answer_id: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn answer_model(id: &str, question_id: &str, user_id: &str, is_accepted: bool) -> answer::Model {
    answer::Model {
        id: id.to_string(),
        question_id: question_id.to_string(),
        user_id: user_id.to_string(),
        content: "Use an owned value or move it into the block.".to_string(),
        votes: 0,
        is_accepted,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}
