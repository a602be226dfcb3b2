//! Answer acceptance.
//!
//! Accepting clears `is_accepted` on every answer of the question and then
//! sets it on the chosen one, so exactly one answer ends up accepted whatever
//! the prior state was. The question row is locked for the whole transaction,
//! and always before any answer row.

use crate::services::caller::Caller;
use crate::services::notification::NotificationService;
use stackit_common::{AppError, AppResult};
use stackit_db::repositories::{AnswerRepository, QuestionRepository};
use tracing::{info, warn};

/// Acceptance service for business logic.
#[derive(Clone)]
pub struct AcceptanceService {
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
    notification_service: NotificationService,
}

impl AcceptanceService {
    /// Create a new acceptance service.
    #[must_use]
    pub const fn new(
        question_repo: QuestionRepository,
        answer_repo: AnswerRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            question_repo,
            answer_repo,
            notification_service,
        }
    }

    /// Mark an answer as the accepted answer of its question.
    ///
    /// Only the question's author or an admin may accept. Accepting the
    /// already-accepted answer succeeds and leaves the same state.
    pub async fn accept_answer(&self, caller: &Caller, answer_id: &str) -> AppResult<()> {
        let txn = self.answer_repo.begin().await?;

        let question_id = self
            .answer_repo
            .find_in(&txn, answer_id)
            .await?
            .ok_or_else(|| AppError::AnswerNotFound(answer_id.to_string()))?
            .question_id;

        let question = self
            .question_repo
            .lock_by_id(&txn, &question_id)
            .await?
            .ok_or_else(|| AppError::AnswerNotFound(answer_id.to_string()))?;

        // Re-read under the question lock; a concurrent delete may have won.
        let answer = self
            .answer_repo
            .lock_by_id(&txn, answer_id)
            .await?
            .ok_or_else(|| AppError::AnswerNotFound(answer_id.to_string()))?;

        if !caller.can_modify(&question.user_id) {
            return Err(AppError::Forbidden(
                "Only the question author can accept an answer".to_string(),
            ));
        }

        self.answer_repo.clear_accepted(&txn, &question.id).await?;
        self.answer_repo.mark_accepted(&txn, &answer.id).await?;
        self.question_repo
            .set_accepted_answer(&txn, &question.id, &answer.id)
            .await?;

        stackit_db::commit(txn).await?;

        info!(
            answer_id = %answer.id,
            question_id = %question.id,
            accepted_by = %caller.id,
            "Answer accepted"
        );

        if answer.user_id != caller.id
            && let Err(e) = self
                .notification_service
                .notify_answer_accepted(&caller.id, &question, &answer)
                .await
        {
            warn!(error = %e, answer_id = %answer.id, "Failed to notify answer author");
        }

        Ok(())
    }
}
