//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::vote::TargetKind;

/// Notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[sea_orm(string_value = "new_answer")]
    NewAnswer,
    #[sea_orm(string_value = "answer_accepted")]
    AnswerAccepted,
}

impl NotificationType {
    /// Wire name of this notification type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NewAnswer => "new_answer",
            Self::AnswerAccepted => "answer_accepted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user receiving the notification
    pub notifiee_id: String,

    /// The user who triggered the notification
    #[sea_orm(nullable)]
    pub notifier_id: Option<String>,

    pub notification_type: NotificationType,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    /// The answer or question this notification is about
    pub related_id: String,

    pub related_type: TargetKind,

    /// Question the related content lives under, for linking
    #[sea_orm(nullable)]
    pub question_id: Option<String>,

    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::NotifieeId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Notifiee,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::NotifierId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Notifier,
}

impl ActiveModelBehavior for ActiveModel {}
