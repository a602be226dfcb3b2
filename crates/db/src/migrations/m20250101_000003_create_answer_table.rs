//! Create answer table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Answer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Answer::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Answer::QuestionId).string_len(32).not_null())
                    .col(ColumnDef::new(Answer::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Answer::Content).text().not_null())
                    .col(ColumnDef::new(Answer::Votes).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Answer::IsAccepted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Answer::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Answer::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_question")
                            .from(Answer::Table, Answer::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_user")
                            .from(Answer::Table, Answer::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_answer_question_id")
                    .table(Answer::Table)
                    .col(Answer::QuestionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_answer_user_id")
                    .table(Answer::Table)
                    .col(Answer::UserId)
                    .to_owned(),
            )
            .await?;

        // At most one accepted answer per question
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_answer_one_accepted \
                 ON answer (question_id) WHERE is_accepted",
            )
            .await?;

        // accepted_answer_id must point at an existing answer
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_question_accepted_answer")
                    .from(Question::Table, Question::AcceptedAnswerId)
                    .to(Answer::Table, Answer::Id)
                    .on_delete(ForeignKeyAction::SetNull)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name("fk_question_accepted_answer")
                    .table(Question::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Answer::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Answer {
    Table,
    Id,
    QuestionId,
    UserId,
    Content,
    Votes,
    IsAccepted,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
    AcceptedAnswerId,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
