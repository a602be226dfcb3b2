//! Answer service.

use crate::services::caller::Caller;
use crate::services::notification::NotificationService;
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use stackit_common::{AppError, AppResult, IdGenerator};
use stackit_db::{
    entities::{TargetKind, answer},
    repositories::{AnswerRepository, QuestionRepository, VoteRepository},
};
use tracing::{info, warn};
use validator::Validate;

/// Input for posting or editing an answer.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    #[validate(length(min = 20, message = "Answer must be at least 20 characters long"))]
    pub content: String,
}

/// Answer service for business logic.
#[derive(Clone)]
pub struct AnswerService {
    answer_repo: AnswerRepository,
    question_repo: QuestionRepository,
    vote_repo: VoteRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl AnswerService {
    /// Create a new answer service.
    #[must_use]
    pub const fn new(
        answer_repo: AnswerRepository,
        question_repo: QuestionRepository,
        vote_repo: VoteRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            answer_repo,
            question_repo,
            vote_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post an answer and bump the question's answer count in one transaction.
    ///
    /// The question author is notified afterwards unless they answered themselves.
    pub async fn create(
        &self,
        caller: &Caller,
        caller_name: &str,
        question_id: &str,
        input: AnswerInput,
    ) -> AppResult<answer::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let txn = self.answer_repo.begin().await?;

        let question = self
            .question_repo
            .lock_by_id(&txn, question_id)
            .await?
            .ok_or_else(|| AppError::QuestionNotFound(question_id.to_string()))?;

        let model = answer::ActiveModel {
            id: Set(self.id_gen.generate()),
            question_id: Set(question.id.clone()),
            user_id: Set(caller.id.clone()),
            content: Set(input.content),
            votes: Set(0),
            is_accepted: Set(false),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let answer = self.answer_repo.insert(&txn, model).await?;
        self.question_repo
            .increment_answers_count(&txn, &question.id)
            .await?;

        stackit_db::commit(txn).await?;

        info!(answer_id = %answer.id, question_id = %question.id, "Answer created");

        if question.user_id != caller.id
            && let Err(e) = self
                .notification_service
                .notify_new_answer(caller_name, &caller.id, &question, &answer)
                .await
        {
            warn!(error = %e, question_id = %question.id, "Failed to notify question author");
        }

        Ok(answer)
    }

    /// Edit an answer. Owner or admin only.
    pub async fn update(
        &self,
        caller: &Caller,
        answer_id: &str,
        input: AnswerInput,
    ) -> AppResult<answer::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let current = self.answer_repo.get_by_id(answer_id).await?;
        if !caller.can_modify(&current.user_id) {
            return Err(AppError::Forbidden(
                "Not allowed to edit this answer".to_string(),
            ));
        }

        let mut active: answer::ActiveModel = current.into();
        active.content = Set(input.content);
        active.updated_at = Set(Some(Utc::now().into()));
        self.answer_repo.update(active).await
    }

    /// Delete an answer and its votes. Owner or admin only.
    ///
    /// If the answer was accepted the question is left with no accepted answer.
    /// The question row is locked before the answer row, the same order
    /// acceptance and question deletion take.
    pub async fn delete(&self, caller: &Caller, answer_id: &str) -> AppResult<()> {
        let found = self
            .answer_repo
            .find_by_id(answer_id)
            .await?
            .ok_or_else(|| AppError::AnswerNotFound(answer_id.to_string()))?;

        if !caller.can_modify(&found.user_id) {
            return Err(AppError::Forbidden(
                "Not allowed to delete this answer".to_string(),
            ));
        }

        let txn = self.answer_repo.begin().await?;

        // A missing question means its deletion already took the answer with it.
        self.question_repo
            .lock_by_id(&txn, &found.question_id)
            .await?
            .ok_or_else(|| AppError::AnswerNotFound(answer_id.to_string()))?;

        let answer = self
            .answer_repo
            .lock_by_id(&txn, answer_id)
            .await?
            .ok_or_else(|| AppError::AnswerNotFound(answer_id.to_string()))?;

        self.vote_repo
            .delete_for_targets(&txn, TargetKind::Answer, &[answer.id.clone()])
            .await?;
        self.question_repo
            .clear_accepted_answer(&txn, &answer.question_id, &answer.id)
            .await?;
        self.question_repo
            .decrement_answers_count(&txn, &answer.question_id)
            .await?;
        self.answer_repo.delete(&txn, &answer.id).await?;

        stackit_db::commit(txn).await?;

        info!(answer_id = %answer.id, deleted_by = %caller.id, "Answer deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{
        RecordingPublisher, answer_model, empty_db, exec, question_model,
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use stackit_db::entities::{
        notification::{self, NotificationType},
        question,
        user::UserRole,
    };
    use stackit_db::repositories::NotificationRepository;
    use std::sync::Arc;

    fn service(
        db: &Arc<DatabaseConnection>,
        notification_db: Arc<DatabaseConnection>,
        publisher: Option<Arc<RecordingPublisher>>,
    ) -> AnswerService {
        let mut notifications = NotificationService::new(NotificationRepository::new(notification_db));
        if let Some(publisher) = publisher {
            notifications.set_event_publisher(publisher);
        }
        AnswerService::new(
            AnswerRepository::new(Arc::clone(db)),
            QuestionRepository::new(Arc::clone(db)),
            VoteRepository::new(Arc::clone(db)),
            notifications,
        )
    }

    fn content() -> AnswerInput {
        AnswerInput {
            content: "Move the value into the async block.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_notifies_question_author() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question_model("q1", "asker")]])
                .append_query_results([[answer_model("a1", "q1", "answerer", false)]])
                .append_exec_results([exec(1)])
                .into_connection(),
        );
        let notification_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[notification::Model {
                    id: "n1".to_string(),
                    notifiee_id: "asker".to_string(),
                    notifier_id: Some("answerer".to_string()),
                    notification_type: NotificationType::NewAnswer,
                    title: "New Answer".to_string(),
                    message: "answerer answered your question: \"Lifetimes\"".to_string(),
                    related_id: "a1".to_string(),
                    related_type: TargetKind::Answer,
                    question_id: Some("q1".to_string()),
                    is_read: false,
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        );
        let publisher = Arc::new(RecordingPublisher::default());
        let service = service(&db, notification_db, Some(publisher.clone()));

        let answer = service
            .create(
                &Caller::new("answerer", UserRole::User),
                "answerer",
                "q1",
                content(),
            )
            .await
            .unwrap();

        assert_eq!(answer.id, "a1");
        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "asker");
        assert_eq!(events[0].1.notification_type, "new_answer");
    }

    #[tokio::test]
    async fn test_create_short_answer_rejected() {
        let service = service(&empty_db(), empty_db(), None);

        let result = service
            .create(
                &Caller::new("answerer", UserRole::User),
                "answerer",
                "q1",
                AnswerInput {
                    content: "too short".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_on_missing_question() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<question::Model>::new()])
                .into_connection(),
        );
        let service = service(&db, empty_db(), None);

        let result = service
            .create(&Caller::new("answerer", UserRole::User), "answerer", "q404", content())
            .await;

        assert!(matches!(result, Err(AppError::QuestionNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_by_stranger_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[answer_model("a1", "q1", "answerer", false)]])
                .into_connection(),
        );
        let service = service(&db, empty_db(), None);

        let result = service
            .update(&Caller::new("stranger", UserRole::User), "a1", content())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_accepted_answer_clears_question() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[answer_model("a1", "q1", "answerer", true)]])
                .append_query_results([[question_model("q1", "asker")]])
                .append_query_results([[answer_model("a1", "q1", "answerer", true)]])
                // votes, accepted pointer, answers_count, answer row
                .append_exec_results([exec(2), exec(1), exec(1), exec(1)])
                .into_connection(),
        );
        let service = service(&db, empty_db(), None);

        let result = service
            .delete(&Caller::new("answerer", UserRole::User), "a1")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_after_question_removed_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[answer_model("a1", "q1", "answerer", false)]])
                .append_query_results([Vec::<question::Model>::new()])
                .into_connection(),
        );
        let service = service(&db, empty_db(), None);

        let result = service
            .delete(&Caller::new("answerer", UserRole::User), "a1")
            .await;

        assert!(matches!(result, Err(AppError::AnswerNotFound(_))));
    }
}
