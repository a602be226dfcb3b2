//! Tag repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{QuestionTag, Tag, question_tag, tag};
use crate::txn_err;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    FromQueryResult, JoinType, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, OnConflict},
};
use stackit_common::{AppError, AppResult, IdGenerator};

/// Colour given to tags created implicitly from question input.
pub const DEFAULT_TAG_COLOR: &str = "#3b82f6";

/// A tag with the number of questions carrying it.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct TagWithCount {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTimeWithTimeZone,
    pub question_count: i64,
}

/// Tag repository for database operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find a tag by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<tag::Model>> {
        Tag::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a tag by its normalized name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<tag::Model>> {
        Tag::find()
            .filter(tag::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get or create a tag by normalized name inside a transaction.
    ///
    /// Concurrent creators of the same name converge on one row.
    pub async fn get_or_create(
        &self,
        txn: &DatabaseTransaction,
        name: &str,
    ) -> AppResult<tag::Model> {
        let model = tag::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            color: Set(DEFAULT_TAG_COLOR.to_string()),
            created_at: Set(Utc::now().into()),
        };

        Tag::insert(model)
            .on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned())
            .exec_without_returning(txn)
            .await
            .map_err(txn_err)?;

        Tag::find()
            .filter(tag::Column::Name.eq(name))
            .one(txn)
            .await
            .map_err(txn_err)?
            .ok_or_else(|| AppError::TransactionFailure(format!("tag {name} vanished")))
    }

    /// Create a tag, or recolour it if the name already exists.
    pub async fn upsert(&self, name: &str, color: &str) -> AppResult<tag::Model> {
        let model = tag::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            color: Set(color.to_string()),
            created_at: Set(Utc::now().into()),
        };

        Tag::insert(model)
            .on_conflict(
                OnConflict::column(tag::Column::Name)
                    .update_column(tag::Column::Color)
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag not found: {name}")))
    }

    /// Update a tag.
    pub async fn update(&self, model: tag::ActiveModel) -> AppResult<tag::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a tag, returning whether a row was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Tag::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Tags with question counts, most used first.
    pub async fn list_with_counts(
        &self,
        search: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<TagWithCount>> {
        let mut query = Tag::find()
            .select_only()
            .columns([
                tag::Column::Id,
                tag::Column::Name,
                tag::Column::Color,
                tag::Column::CreatedAt,
            ])
            .column_as(question_tag::Column::QuestionId.count(), "question_count")
            .join(JoinType::LeftJoin, tag::Relation::QuestionTags.def())
            .group_by(tag::Column::Id);

        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(tag::Column::Name.contains(search.to_lowercase()));
        }

        query
            .order_by(Expr::cust("question_count"), Order::Desc)
            .order_by_asc(tag::Column::Name)
            .limit(limit)
            .into_model::<TagWithCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tags of each given question, keyed by question ID.
    pub async fn find_by_questions(
        &self,
        question_ids: &[String],
    ) -> AppResult<HashMap<String, Vec<tag::Model>>> {
        if question_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = QuestionTag::find()
            .filter(question_tag::Column::QuestionId.is_in(question_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if links.is_empty() {
            return Ok(HashMap::new());
        }

        let tags: HashMap<String, tag::Model> = Tag::find()
            .filter(tag::Column::Id.is_in(links.iter().map(|l| l.tag_id.clone())))
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        let mut by_question: HashMap<String, Vec<tag::Model>> = HashMap::new();
        for link in links {
            if let Some(tag) = tags.get(&link.tag_id) {
                by_question
                    .entry(link.question_id)
                    .or_default()
                    .push(tag.clone());
            }
        }
        for tags in by_question.values_mut() {
            tags.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(by_question)
    }

    /// Link tags to a question.
    pub async fn link(
        &self,
        txn: &DatabaseTransaction,
        question_id: &str,
        tag_ids: &[String],
    ) -> AppResult<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        let links = tag_ids.iter().map(|tag_id| question_tag::ActiveModel {
            question_id: Set(question_id.to_string()),
            tag_id: Set(tag_id.clone()),
        });

        QuestionTag::insert_many(links)
            .on_conflict(
                OnConflict::columns([question_tag::Column::QuestionId, question_tag::Column::TagId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await
            .map_err(txn_err)?;
        Ok(())
    }

    /// Remove every tag link of a question.
    pub async fn unlink_all(&self, txn: &DatabaseTransaction, question_id: &str) -> AppResult<()> {
        QuestionTag::delete_many()
            .filter(question_tag::Column::QuestionId.eq(question_id))
            .exec(txn)
            .await
            .map_err(txn_err)?;
        Ok(())
    }

    /// Count all tags.
    pub async fn count(&self) -> AppResult<u64> {
        Tag::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
