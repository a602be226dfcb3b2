//! Question view repository.

use std::sync::Arc;

use crate::entities::{QuestionView, question_view};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, prelude::DateTimeWithTimeZone,
    sea_query::OnConflict,
};
use stackit_common::{AppError, AppResult};

/// Question view repository for database operations.
#[derive(Clone)]
pub struct QuestionViewRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionViewRepository {
    /// Create a new question view repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's last view of a question.
    pub async fn find(
        &self,
        user_id: &str,
        question_id: &str,
    ) -> AppResult<Option<question_view::Model>> {
        QuestionView::find()
            .filter(question_view::Column::UserId.eq(user_id))
            .filter(question_view::Column::QuestionId.eq(question_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a view at `viewed_at`, replacing any earlier one.
    pub async fn upsert(
        &self,
        user_id: &str,
        question_id: &str,
        viewed_at: DateTimeWithTimeZone,
    ) -> AppResult<()> {
        let model = question_view::ActiveModel {
            user_id: Set(user_id.to_string()),
            question_id: Set(question_id.to_string()),
            viewed_at: Set(viewed_at),
        };

        QuestionView::insert(model)
            .on_conflict(
                OnConflict::columns([
                    question_view::Column::UserId,
                    question_view::Column::QuestionId,
                ])
                .update_column(question_view::Column::ViewedAt)
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
