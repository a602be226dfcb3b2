//! Question repository.

use std::sync::Arc;

use crate::entities::{Question, QuestionTag, Tag, question, question_tag, tag};
use crate::txn_err;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Query, extension::postgres::PgExpr},
};
use serde::Deserialize;
use stackit_common::{AppError, AppResult, PageRequest};

/// Ordering for question listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSort {
    #[default]
    Newest,
    Oldest,
    MostAnswers,
    MostViews,
}

/// Filters for question listings. All values are bound as query parameters.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    /// Case-insensitive substring of the title or description.
    pub search: Option<String>,
    /// Exact normalized tag name.
    pub tag: Option<String>,
    /// Result ordering.
    pub sort: QuestionSort,
}

/// Escape `LIKE` wildcards in caller input.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Question repository for database operations.
#[derive(Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionRepository {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Begin a transaction on this repository's pool.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        crate::begin(self.db.as_ref()).await
    }

    /// Find a question by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<question::Model>> {
        Question::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a question by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<question::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::QuestionNotFound(id.to_string()))
    }

    /// Read a question and hold its row lock until the transaction ends.
    pub async fn lock_by_id(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
    ) -> AppResult<Option<question::Model>> {
        Question::find_by_id(id)
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(txn_err)
    }

    /// List questions matching `filter`, returning the page and the total match count.
    pub async fn list(
        &self,
        filter: &QuestionFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<question::Model>, u64)> {
        let mut query = Question::find();

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            query = query.filter(
                Condition::any()
                    .add(Expr::col(question::Column::Title).ilike(pattern.as_str()))
                    .add(Expr::col(question::Column::Description).ilike(pattern.as_str())),
            );
        }

        if let Some(tag_name) = filter.tag.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                question::Column::Id.in_subquery(
                    Query::select()
                        .column((QuestionTag, question_tag::Column::QuestionId))
                        .from(QuestionTag)
                        .inner_join(
                            Tag,
                            Expr::col((Tag, tag::Column::Id))
                                .equals((QuestionTag, question_tag::Column::TagId)),
                        )
                        .and_where(Expr::col((Tag, tag::Column::Name)).eq(tag_name.to_lowercase()))
                        .to_owned(),
                ),
            );
        }

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        query = match filter.sort {
            QuestionSort::Newest => query.order_by_desc(question::Column::CreatedAt),
            QuestionSort::Oldest => query.order_by_asc(question::Column::CreatedAt),
            QuestionSort::MostAnswers => query
                .order_by_desc(question::Column::AnswersCount)
                .order_by_desc(question::Column::CreatedAt),
            QuestionSort::MostViews => query
                .order_by_desc(question::Column::ViewCount)
                .order_by_desc(question::Column::CreatedAt),
        };

        let questions = query
            .order_by_desc(question::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((questions, total))
    }

    /// Insert a question.
    pub async fn insert(
        &self,
        txn: &DatabaseTransaction,
        model: question::ActiveModel,
    ) -> AppResult<question::Model> {
        model.insert(txn).await.map_err(txn_err)
    }

    /// Update a question.
    pub async fn update(
        &self,
        txn: &DatabaseTransaction,
        model: question::ActiveModel,
    ) -> AppResult<question::Model> {
        model.update(txn).await.map_err(txn_err)
    }

    /// Delete a question. Answers, tag links and views cascade.
    pub async fn delete(&self, txn: &DatabaseTransaction, id: &str) -> AppResult<()> {
        Question::delete_by_id(id)
            .exec(txn)
            .await
            .map_err(txn_err)?;
        Ok(())
    }

    /// Overwrite the cached vote total.
    pub async fn set_votes(&self, txn: &DatabaseTransaction, id: &str, votes: i32) -> AppResult<()> {
        Question::update_many()
            .col_expr(question::Column::Votes, Expr::value(votes))
            .filter(question::Column::Id.eq(id))
            .exec(txn)
            .await
            .map_err(txn_err)?;
        Ok(())
    }

    /// Point the question at its accepted answer.
    pub async fn set_accepted_answer(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
        answer_id: &str,
    ) -> AppResult<()> {
        Question::update_many()
            .col_expr(question::Column::AcceptedAnswerId, Expr::value(answer_id))
            .filter(question::Column::Id.eq(id))
            .exec(txn)
            .await
            .map_err(txn_err)?;
        Ok(())
    }

    /// Clear `accepted_answer_id` if it currently points at `answer_id`.
    pub async fn clear_accepted_answer(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
        answer_id: &str,
    ) -> AppResult<()> {
        Question::update_many()
            .col_expr(
                question::Column::AcceptedAnswerId,
                Expr::value(Option::<String>::None),
            )
            .filter(question::Column::Id.eq(id))
            .filter(question::Column::AcceptedAnswerId.eq(answer_id))
            .exec(txn)
            .await
            .map_err(txn_err)?;
        Ok(())
    }

    /// Increment answers count atomically.
    pub async fn increment_answers_count(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
    ) -> AppResult<()> {
        Question::update_many()
            .col_expr(
                question::Column::AnswersCount,
                Expr::col(question::Column::AnswersCount).add(1),
            )
            .filter(question::Column::Id.eq(id))
            .exec(txn)
            .await
            .map_err(txn_err)?;
        Ok(())
    }

    /// Decrement answers count atomically, never below zero.
    pub async fn decrement_answers_count(
        &self,
        txn: &DatabaseTransaction,
        id: &str,
    ) -> AppResult<()> {
        Question::update_many()
            .col_expr(
                question::Column::AnswersCount,
                Expr::cust("GREATEST(answers_count - 1, 0)"),
            )
            .filter(question::Column::Id.eq(id))
            .exec(txn)
            .await
            .map_err(txn_err)?;
        Ok(())
    }

    /// Increment view count atomically (single UPDATE query, no fetch).
    pub async fn increment_view_count(&self, id: &str) -> AppResult<()> {
        Question::update_many()
            .col_expr(
                question::Column::ViewCount,
                Expr::col(question::Column::ViewCount).add(1),
            )
            .filter(question::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count all questions.
    pub async fn count(&self) -> AppResult<u64> {
        Question::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count questions by a user.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Question::find()
            .filter(question::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
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

    fn create_test_question(id: &str, user_id: &str) -> question::Model {
        question::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "How do I borrow twice?".to_string(),
            description: "The borrow checker rejects my code.".to_string(),
            votes: 0,
            view_count: 0,
            answers_count: 0,
            accepted_answer_id: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<question::Model>::new()])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let result = repo.get_by_id("missing").await;

        match result {
            Err(AppError::QuestionNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected QuestionNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_list_returns_page_and_total() {
        let q1 = create_test_question("q1", "user1");
        let q2 = create_test_question("q2", "user2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(12))
                }]])
                .append_query_results([[q1, q2]])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let filter = QuestionFilter {
            search: Some("borrow".to_string()),
            tag: Some("Rust".to_string()),
            sort: QuestionSort::MostViews,
        };
        let (questions, total) = repo
            .list(&filter, PageRequest { page: 2, limit: 2 })
            .await
            .unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(total, 12);
    }

    #[tokio::test]
    async fn test_list_binds_search_as_parameter() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(0))
                }]])
                .append_query_results([Vec::<question::Model>::new()])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db.clone());
        let filter = QuestionFilter {
            search: Some("'; DROP TABLE question; --".to_string()),
            ..Default::default()
        };
        repo.list(&filter, PageRequest { page: 1, limit: 10 })
            .await
            .unwrap();
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("ILIKE $1"));
        assert!(!sql.contains("ILIKE '%"));
    }

    #[tokio::test]
    async fn test_increment_view_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        assert!(repo.increment_view_count("q1").await.is_ok());
    }

    #[tokio::test]
    async fn test_count_by_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        assert_eq!(repo.count_by_user("user1").await.unwrap(), 3);
    }
}
