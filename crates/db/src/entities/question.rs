//! Question entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author
    #[sea_orm(indexed)]
    pub user_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Cached `SUM(vote.value)` for this question
    #[sea_orm(default_value = 0)]
    pub votes: i32,

    #[sea_orm(default_value = 0)]
    pub view_count: i32,

    /// Answers count (denormalized)
    #[sea_orm(default_value = 0)]
    pub answers_count: i32,

    /// The single accepted answer, if any
    #[sea_orm(nullable)]
    pub accepted_answer_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::answer::Entity")]
    Answers,

    #[sea_orm(has_many = "super::question_tag::Entity")]
    QuestionTags,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl Related<super::question_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuestionTags.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::question_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::question_tag::Relation::Question.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
