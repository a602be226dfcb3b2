//! Voting ledger.
//!
//! Each voter holds at most one vote per target. Casting the same value twice
//! removes the vote, casting the opposite value flips it, and the target's
//! cached `votes` total is recomputed from the vote rows in the same
//! transaction.

use std::collections::HashMap;

use crate::services::caller::Caller;
use sea_orm::Set;
use serde::Serialize;
use stackit_common::{AppError, AppResult, IdGenerator};
use stackit_db::{
    entities::{TargetKind, vote},
    repositories::{AnswerRepository, QuestionRepository, VoteRepository},
};
use tracing::info;

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    /// Stored representation: `+1` or `-1`.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl TryFrom<i64> for VoteValue {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(AppError::Validation(format!(
                "vote value must be 1 or -1, got {other}"
            ))),
        }
    }
}

/// Result of casting a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    /// The target's fresh total.
    pub votes: i32,
    /// The voter's vote after this call; `None` when it was toggled off.
    pub user_vote: Option<i16>,
}

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    vote_repo: VoteRepository,
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(
        vote_repo: VoteRepository,
        question_repo: QuestionRepository,
        answer_repo: AnswerRepository,
    ) -> Self {
        Self {
            vote_repo,
            question_repo,
            answer_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Cast, flip or withdraw a vote and return the target's new total.
    ///
    /// The target row stays locked from the author check to the commit, so
    /// concurrent voters on one target serialize and each recomputes the sum
    /// after the previous commit.
    pub async fn cast_vote(
        &self,
        caller: &Caller,
        kind: TargetKind,
        target_id: &str,
        value: VoteValue,
    ) -> AppResult<VoteOutcome> {
        let txn = self.vote_repo.begin().await?;

        let author_id = match kind {
            TargetKind::Question => {
                self.question_repo
                    .lock_by_id(&txn, target_id)
                    .await?
                    .ok_or_else(|| AppError::QuestionNotFound(target_id.to_string()))?
                    .user_id
            }
            TargetKind::Answer => {
                self.answer_repo
                    .lock_by_id(&txn, target_id)
                    .await?
                    .ok_or_else(|| AppError::AnswerNotFound(target_id.to_string()))?
                    .user_id
            }
        };

        if author_id == caller.id {
            return Err(AppError::SelfVoteForbidden);
        }

        let existing = self
            .vote_repo
            .find_for_voter(&txn, &caller.id, target_id, kind)
            .await?;

        let user_vote = match existing {
            None => {
                let now = chrono::Utc::now().into();
                let model = vote::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(caller.id.clone()),
                    target_id: Set(target_id.to_string()),
                    target_type: Set(kind),
                    value: Set(value.as_i16()),
                    created_at: Set(now),
                    updated_at: Set(None),
                };
                self.vote_repo.insert(&txn, model).await?;
                Some(value)
            }
            Some(current) if current.value == value.as_i16() => {
                self.vote_repo.delete(&txn, &current.id).await?;
                None
            }
            Some(current) => {
                self.vote_repo
                    .update_value(&txn, &current.id, value.as_i16())
                    .await?;
                Some(value)
            }
        };

        let total = self.vote_repo.sum_for_target(&txn, target_id, kind).await?;
        let votes = i32::try_from(total)
            .map_err(|_| AppError::Internal(format!("vote total out of range: {total}")))?;

        match kind {
            TargetKind::Question => self.question_repo.set_votes(&txn, target_id, votes).await?,
            TargetKind::Answer => self.answer_repo.set_votes(&txn, target_id, votes).await?,
        }

        stackit_db::commit(txn).await?;

        info!(
            voter_id = %caller.id,
            target_id = %target_id,
            target_kind = kind.as_str(),
            votes,
            "Vote cast"
        );

        Ok(VoteOutcome {
            votes,
            user_vote: user_vote.map(VoteValue::as_i16),
        })
    }

    /// The voter's current votes on the given targets, keyed by target id.
    pub async fn user_votes(
        &self,
        voter_id: &str,
        kind: TargetKind,
        target_ids: &[String],
    ) -> AppResult<HashMap<String, i16>> {
        let votes = self
            .vote_repo
            .find_by_user_and_targets(voter_id, kind, target_ids)
            .await?;
        Ok(votes.into_iter().map(|v| (v.target_id, v.value)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{answer_model, exec, question_model};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
    use stackit_db::entities::{answer, user::UserRole};
    use std::sync::Arc;

    fn service(db: &Arc<DatabaseConnection>) -> VoteService {
        VoteService::new(
            VoteRepository::new(Arc::clone(db)),
            QuestionRepository::new(Arc::clone(db)),
            AnswerRepository::new(Arc::clone(db)),
        )
    }

    fn voter() -> Caller {
        Caller::new("voter", UserRole::User)
    }

    fn vote_row(value: i16, kind: TargetKind, target_id: &str) -> vote::Model {
        vote::Model {
            id: "v1".to_string(),
            user_id: "voter".to_string(),
            target_id: target_id.to_string(),
            target_type: kind,
            value,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn total_row(total: i64) -> std::collections::BTreeMap<&'static str, Value> {
        maplit::btreemap! { "total" => Value::BigInt(Some(total)) }
    }

    #[test]
    fn test_vote_value_from_integer() {
        assert_eq!(VoteValue::try_from(1).unwrap(), VoteValue::Up);
        assert_eq!(VoteValue::try_from(-1).unwrap(), VoteValue::Down);
        assert!(matches!(
            VoteValue::try_from(2),
            Err(AppError::Validation(_))
        ));
        assert!(VoteValue::try_from(0).is_err());
    }

    #[tokio::test]
    async fn test_first_vote_inserts_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question_model("q1", "author")]])
                .append_query_results([Vec::<vote::Model>::new()])
                .append_query_results([[vote_row(1, TargetKind::Question, "q1")]])
                .append_query_results([[total_row(1)]])
                .append_exec_results([exec(1)])
                .into_connection(),
        );

        let outcome = service(&db)
            .cast_vote(&voter(), TargetKind::Question, "q1", VoteValue::Up)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            VoteOutcome {
                votes: 1,
                user_vote: Some(1)
            }
        );
    }

    #[tokio::test]
    async fn test_same_vote_twice_toggles_off() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[answer_model("a1", "q1", "author", false)]])
                .append_query_results([[vote_row(1, TargetKind::Answer, "a1")]])
                .append_query_results([[total_row(0)]])
                // DELETE vote, then UPDATE answer.votes
                .append_exec_results([exec(1), exec(1)])
                .into_connection(),
        );

        let outcome = service(&db)
            .cast_vote(&voter(), TargetKind::Answer, "a1", VoteValue::Up)
            .await
            .unwrap();

        assert_eq!(outcome.votes, 0);
        assert_eq!(outcome.user_vote, None);
    }

    #[tokio::test]
    async fn test_opposite_vote_flips() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question_model("q1", "author")]])
                .append_query_results([[vote_row(1, TargetKind::Question, "q1")]])
                .append_query_results([[total_row(-1)]])
                // UPDATE vote value, then UPDATE question.votes
                .append_exec_results([exec(1), exec(1)])
                .into_connection(),
        );

        let outcome = service(&db)
            .cast_vote(&voter(), TargetKind::Question, "q1", VoteValue::Down)
            .await
            .unwrap();

        assert_eq!(outcome.votes, -1);
        assert_eq!(outcome.user_vote, Some(-1));
    }

    #[tokio::test]
    async fn test_self_vote_forbidden() {
        // Only the locked target is queued; any write would fail the test.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question_model("q1", "voter")]])
                .into_connection(),
        );

        let result = service(&db)
            .cast_vote(&voter(), TargetKind::Question, "q1", VoteValue::Up)
            .await;

        assert!(matches!(result, Err(AppError::SelfVoteForbidden)));
    }

    #[tokio::test]
    async fn test_missing_target_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<answer::Model>::new()])
                .into_connection(),
        );

        let result = service(&db)
            .cast_vote(&voter(), TargetKind::Answer, "missing", VoteValue::Up)
            .await;

        match result {
            Err(AppError::AnswerNotFound(id)) => assert_eq!(id, "missing"),
            other => panic!("Expected AnswerNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_transaction_failure() {
        // The vote insert succeeds but the SUM has no result queued.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question_model("q1", "author")]])
                .append_query_results([Vec::<vote::Model>::new()])
                .append_query_results([[vote_row(1, TargetKind::Question, "q1")]])
                .into_connection(),
        );

        let result = service(&db)
            .cast_vote(&voter(), TargetKind::Question, "q1", VoteValue::Up)
            .await;

        match result {
            Err(e @ AppError::TransactionFailure(_)) => assert!(e.is_retryable()),
            other => panic!("Expected TransactionFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_user_votes_keyed_by_target() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    vote_row(1, TargetKind::Answer, "a1"),
                    vote_row(-1, TargetKind::Answer, "a2"),
                ]])
                .into_connection(),
        );

        let votes = service(&db)
            .user_votes(
                "voter",
                TargetKind::Answer,
                &["a1".to_string(), "a2".to_string(), "a3".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(votes.get("a1"), Some(&1));
        assert_eq!(votes.get("a2"), Some(&-1));
        assert_eq!(votes.get("a3"), None);
    }
}
