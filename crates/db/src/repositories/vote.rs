//! Vote repository.
//!
//! Every mutating method runs on a caller-supplied transaction so the vote row
//! change and the recomputed target total commit together.

use std::sync::Arc;

use crate::entities::{TargetKind, Vote, vote};
use crate::txn_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    FromQueryResult, QueryFilter, QuerySelect, sea_query::Expr,
};
use stackit_common::{AppError, AppResult};

#[derive(FromQueryResult)]
struct VoteTotal {
    total: Option<i64>,
}

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Begin a transaction on this repository's pool.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        crate::begin(self.db.as_ref()).await
    }

    /// Find a voter's vote on a target.
    pub async fn find_for_voter(
        &self,
        txn: &DatabaseTransaction,
        user_id: &str,
        target_id: &str,
        kind: TargetKind,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::TargetId.eq(target_id))
            .filter(vote::Column::TargetType.eq(kind))
            .one(txn)
            .await
            .map_err(txn_err)
    }

    /// Insert a new vote.
    pub async fn insert(
        &self,
        txn: &DatabaseTransaction,
        model: vote::ActiveModel,
    ) -> AppResult<vote::Model> {
        model.insert(txn).await.map_err(txn_err)
    }

    /// Change the value of an existing vote.
    pub async fn update_value(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
        value: i16,
    ) -> AppResult<()> {
        Vote::update_many()
            .col_expr(vote::Column::Value, Expr::value(value))
            .col_expr(
                vote::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(vote::Column::Id.eq(id))
            .exec(txn)
            .await
            .map_err(txn_err)?;
        Ok(())
    }

    /// Delete a vote.
    pub async fn delete(&self, txn: &DatabaseTransaction, id: &str) -> AppResult<()> {
        Vote::delete_by_id(id).exec(txn).await.map_err(txn_err)?;
        Ok(())
    }

    /// `SUM(value)` over every vote on a target; zero when there are none.
    pub async fn sum_for_target(
        &self,
        txn: &DatabaseTransaction,
        target_id: &str,
        kind: TargetKind,
    ) -> AppResult<i64> {
        let result = Vote::find()
            .filter(vote::Column::TargetId.eq(target_id))
            .filter(vote::Column::TargetType.eq(kind))
            .select_only()
            .column_as(vote::Column::Value.sum(), "total")
            .into_model::<VoteTotal>()
            .one(txn)
            .await
            .map_err(txn_err)?;

        Ok(result.and_then(|r| r.total).unwrap_or(0))
    }

    /// Delete every vote on the given targets.
    pub async fn delete_for_targets(
        &self,
        txn: &DatabaseTransaction,
        kind: TargetKind,
        target_ids: &[String],
    ) -> AppResult<u64> {
        if target_ids.is_empty() {
            return Ok(0);
        }

        let result = Vote::delete_many()
            .filter(vote::Column::TargetType.eq(kind))
            .filter(vote::Column::TargetId.is_in(target_ids.iter().cloned()))
            .exec(txn)
            .await
            .map_err(txn_err)?;

        Ok(result.rows_affected)
    }

    /// A user's votes on a set of targets of one kind.
    pub async fn find_by_user_and_targets(
        &self,
        user_id: &str,
        kind: TargetKind,
        target_ids: &[String],
    ) -> AppResult<Vec<vote::Model>> {
        if target_ids.is_empty() {
            return Ok(Vec::new());
        }

        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::TargetType.eq(kind))
            .filter(vote::Column::TargetId.is_in(target_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn create_test_vote(id: &str, user_id: &str, target_id: &str, value: i16) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            target_id: target_id.to_string(),
            target_type: TargetKind::Answer,
            value,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_for_voter() {
        let vote = create_test_vote("v1", "user1", "a1", 1);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote.clone()]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let txn = repo.begin().await.unwrap();
        let result = repo
            .find_for_voter(&txn, "user1", "a1", TargetKind::Answer)
            .await
            .unwrap();
        txn.commit().await.unwrap();

        assert_eq!(result, Some(vote));
    }

    #[tokio::test]
    async fn test_sum_for_target() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "total" => Value::BigInt(Some(-3))
                }]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let txn = repo.begin().await.unwrap();
        let total = repo
            .sum_for_target(&txn, "q1", TargetKind::Question)
            .await
            .unwrap();
        txn.commit().await.unwrap();

        assert_eq!(total, -3);
    }

    #[tokio::test]
    async fn test_sum_for_target_without_votes_is_zero() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "total" => Value::BigInt(None)
                }]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let txn = repo.begin().await.unwrap();
        let total = repo
            .sum_for_target(&txn, "q1", TargetKind::Question)
            .await
            .unwrap();
        txn.commit().await.unwrap();

        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_delete_for_targets_skips_empty_list() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        // No exec results queued: issuing a DELETE would fail
        let repo = VoteRepository::new(db);
        let txn = repo.begin().await.unwrap();
        let deleted = repo
            .delete_for_targets(&txn, TargetKind::Answer, &[])
            .await
            .unwrap();
        txn.commit().await.unwrap();

        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn test_delete_for_targets() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 4,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let txn = repo.begin().await.unwrap();
        let deleted = repo
            .delete_for_targets(&txn, TargetKind::Answer, &["a1".to_string(), "a2".to_string()])
            .await
            .unwrap();
        txn.commit().await.unwrap();

        assert_eq!(deleted, 4);
    }

    #[tokio::test]
    async fn test_find_by_user_and_targets() {
        let v1 = create_test_vote("v1", "user1", "a1", 1);
        let v2 = create_test_vote("v2", "user1", "a2", -1);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[v1, v2]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let votes = repo
            .find_by_user_and_targets(
                "user1",
                TargetKind::Answer,
                &["a1".to_string(), "a2".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(votes.len(), 2);
    }
}
