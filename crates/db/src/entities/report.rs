//! Content report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::vote::TargetKind;

/// Report status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "reviewed")]
    Reviewed,
    #[sea_orm(string_value = "dismissed")]
    Dismissed,
}

/// Report model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// The user who submitted the report.
    pub reporter_id: String,
    /// Kind of the reported content.
    pub target_type: TargetKind,
    /// The reported question or answer.
    pub target_id: String,
    /// Short reason for the report.
    pub reason: String,
    /// Optional free-form details.
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,
    /// Current status of the report.
    pub status: ReportStatus,
    /// Admin who reviewed the report.
    #[sea_orm(nullable)]
    pub reviewed_by: Option<String>,
    /// When the report was reviewed.
    #[sea_orm(nullable)]
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    /// When the report was created.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReporterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Reporter,
}

impl ActiveModelBehavior for ActiveModel {}
