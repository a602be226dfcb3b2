//! Notification service.

use crate::services::event_publisher::{EventPublisherService, NotificationEvent};
use stackit_common::{AppError, AppResult, IdGenerator, PageRequest, Paged};
use stackit_db::{
    entities::{
        answer,
        notification::{self, NotificationType, TargetKind},
        question,
    },
    repositories::NotificationRepository,
};
use sea_orm::Set;

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Tell a question's author that someone answered it.
    pub async fn notify_new_answer(
        &self,
        answerer_name: &str,
        answerer_id: &str,
        question: &question::Model,
        answer: &answer::Model,
    ) -> AppResult<notification::Model> {
        self.create_internal(
            &question.user_id,
            Some(answerer_id),
            NotificationType::NewAnswer,
            "New Answer",
            format!("{answerer_name} answered your question: \"{}\"", question.title),
            &answer.id,
            &question.id,
        )
        .await
    }

    /// Tell an answer's author that it was accepted.
    pub async fn notify_answer_accepted(
        &self,
        accepter_id: &str,
        question: &question::Model,
        answer: &answer::Model,
    ) -> AppResult<notification::Model> {
        self.create_internal(
            &answer.user_id,
            Some(accepter_id),
            NotificationType::AnswerAccepted,
            "Answer Accepted",
            format!("Your answer to \"{}\" was accepted!", question.title),
            &answer.id,
            &question.id,
        )
        .await
    }

    /// Persist a notification, then push it to the recipient's live sessions.
    #[allow(clippy::too_many_arguments)]
    async fn create_internal(
        &self,
        notifiee_id: &str,
        notifier_id: Option<&str>,
        notification_type: NotificationType,
        title: &str,
        message: String,
        answer_id: &str,
        question_id: &str,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            notifiee_id: Set(notifiee_id.to_string()),
            notifier_id: Set(notifier_id.map(ToString::to_string)),
            notification_type: Set(notification_type),
            title: Set(title.to_string()),
            message: Set(message),
            related_id: Set(answer_id.to_string()),
            related_type: Set(TargetKind::Answer),
            question_id: Set(Some(question_id.to_string())),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        let notification = self.notification_repo.create(model).await?;

        if let Some(ref event_publisher) = self.event_publisher
            && let Err(e) = event_publisher
                .publish_notification(notifiee_id, NotificationEvent::from(&notification))
                .await
        {
            tracing::warn!(error = %e, user_id = %notifiee_id, "Failed to publish notification event");
        }

        Ok(notification)
    }

    /// Get a page of a user's notifications, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> AppResult<Paged<notification::Model>> {
        let (items, total) = self.notification_repo.find_by_user(user_id, page).await?;
        Ok(Paged::new(items, page, total))
    }

    /// Mark some of the caller's notifications as read.
    pub async fn mark_as_read(&self, user_id: &str, ids: &[String]) -> AppResult<u64> {
        if ids.is_empty() {
            return Err(AppError::Validation(
                "notificationIds must not be empty".to_string(),
            ));
        }
        self.notification_repo.mark_as_read(user_id, ids).await
    }

    /// Mark all notifications as read for a user.
    pub async fn mark_all_as_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }

    /// Delete one of the caller's notifications.
    pub async fn delete(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        if self
            .notification_repo
            .delete_owned(user_id, notification_id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "Notification not found: {notification_id}"
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{RecordingPublisher, answer_model, question_model};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn notification_row(notifiee_id: &str, kind: NotificationType) -> notification::Model {
        notification::Model {
            id: "n1".to_string(),
            notifiee_id: notifiee_id.to_string(),
            notifier_id: Some("accepter".to_string()),
            notification_type: kind,
            title: "Answer Accepted".to_string(),
            message: "Your answer to \"Lifetimes\" was accepted!".to_string(),
            related_id: "a1".to_string(),
            related_type: TargetKind::Answer,
            question_id: Some("q1".to_string()),
            is_read: false,
            created_at: chrono::Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_notify_answer_accepted_persists_and_publishes() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[notification_row(
                    "answerer",
                    NotificationType::AnswerAccepted,
                )]])
                .into_connection(),
        );

        let publisher = Arc::new(RecordingPublisher::default());
        let mut service = NotificationService::new(NotificationRepository::new(db));
        service.set_event_publisher(publisher.clone());

        let question = question_model("q1", "asker");
        let answer = answer_model("a1", "q1", "answerer", false);
        let created = service
            .notify_answer_accepted("asker", &question, &answer)
            .await
            .unwrap();

        assert_eq!(created.notifiee_id, "answerer");
        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "answerer");
        assert_eq!(events[0].1.notification_type, "answer_accepted");
    }

    #[tokio::test]
    async fn test_mark_as_read_rejects_empty_ids() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = NotificationService::new(NotificationRepository::new(db));

        let result = service.mark_as_read("u1", &[]).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_foreign_notification_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let service = NotificationService::new(NotificationRepository::new(db));

        let result = service.delete("u1", "someone_elses").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
