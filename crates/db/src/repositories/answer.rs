//! Answer repository.

use std::sync::Arc;

use crate::entities::{Answer, answer};
use crate::txn_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use stackit_common::{AppError, AppResult};

/// Answer repository for database operations.
#[derive(Clone)]
pub struct AnswerRepository {
    db: Arc<DatabaseConnection>,
}

impl AnswerRepository {
    /// Create a new answer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Begin a transaction on this repository's pool.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        crate::begin(self.db.as_ref()).await
    }

    /// Find an answer by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<answer::Model>> {
        Answer::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an answer by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<answer::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::AnswerNotFound(id.to_string()))
    }

    /// Read an answer inside a transaction.
    pub async fn find_in(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
    ) -> AppResult<Option<answer::Model>> {
        Answer::find_by_id(id).one(txn).await.map_err(txn_err)
    }

    /// Read an answer and hold its row lock until the transaction ends.
    pub async fn lock_by_id(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
    ) -> AppResult<Option<answer::Model>> {
        Answer::find_by_id(id)
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(txn_err)
    }

    /// Answers under a question: accepted first, then by votes, then oldest first.
    pub async fn find_by_question(&self, question_id: &str) -> AppResult<Vec<answer::Model>> {
        Answer::find()
            .filter(answer::Column::QuestionId.eq(question_id))
            .order_by_desc(answer::Column::IsAccepted)
            .order_by_desc(answer::Column::Votes)
            .order_by_asc(answer::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of every answer under a question, locking those rows so no vote
    /// on them can commit until the caller's transaction ends.
    pub async fn ids_by_question(
        &self,
        txn: &DatabaseTransaction,
        question_id: &str,
    ) -> AppResult<Vec<String>> {
        Answer::find()
            .select_only()
            .column(answer::Column::Id)
            .filter(answer::Column::QuestionId.eq(question_id))
            .lock_exclusive()
            .into_tuple::<String>()
            .all(txn)
            .await
            .map_err(txn_err)
    }

    /// Unconditionally clear `is_accepted` on every answer of a question.
    pub async fn clear_accepted(
        &self,
        txn: &DatabaseTransaction,
        question_id: &str,
    ) -> AppResult<u64> {
        let result = Answer::update_many()
            .col_expr(answer::Column::IsAccepted, Expr::value(false))
            .filter(answer::Column::QuestionId.eq(question_id))
            .exec(txn)
            .await
            .map_err(txn_err)?;
        Ok(result.rows_affected)
    }

    /// Mark one answer as accepted.
    pub async fn mark_accepted(&self, txn: &DatabaseTransaction, id: &str) -> AppResult<()> {
        Answer::update_many()
            .col_expr(answer::Column::IsAccepted, Expr::value(true))
            .filter(answer::Column::Id.eq(id))
            .exec(txn)
            .await
            .map_err(txn_err)?;
        Ok(())
    }

    /// Overwrite the cached vote total.
    pub async fn set_votes(&self, txn: &DatabaseTransaction, id: &str, votes: i32) -> AppResult<()> {
        Answer::update_many()
            .col_expr(answer::Column::Votes, Expr::value(votes))
            .filter(answer::Column::Id.eq(id))
            .exec(txn)
            .await
            .map_err(txn_err)?;
        Ok(())
    }

    /// Insert an answer.
    pub async fn insert(
        &self,
        txn: &DatabaseTransaction,
        model: answer::ActiveModel,
    ) -> AppResult<answer::Model> {
        model.insert(txn).await.map_err(txn_err)
    }

    /// Update an answer.
    pub async fn update(&self, model: answer::ActiveModel) -> AppResult<answer::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an answer.
    pub async fn delete(&self, txn: &DatabaseTransaction, id: &str) -> AppResult<()> {
        Answer::delete_by_id(id).exec(txn).await.map_err(txn_err)?;
        Ok(())
    }

    /// Count all answers.
    pub async fn count(&self) -> AppResult<u64> {
        Answer::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count answers by a user.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Answer::find()
            .filter(answer::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
