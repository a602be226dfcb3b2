//! Create question_view table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QuestionView::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(QuestionView::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(QuestionView::QuestionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionView::ViewedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(QuestionView::UserId)
                            .col(QuestionView::QuestionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_view_user")
                            .from(QuestionView::Table, QuestionView::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_view_question")
                            .from(QuestionView::Table, QuestionView::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QuestionView::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum QuestionView {
    Table,
    UserId,
    QuestionId,
    ViewedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
}
