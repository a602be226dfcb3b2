//! Moderation service: content reports and their review.

use std::collections::{HashMap, HashSet};

use crate::services::{answer::AnswerService, caller::Caller, question::QuestionService};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use stackit_common::{AppError, AppResult, IdGenerator};
use stackit_db::{
    entities::{
        TargetKind,
        report::{self, ReportStatus},
    },
    repositories::{AnswerRepository, QuestionRepository, ReportRepository, UserRepository},
};
use tracing::info;
use validator::Validate;

/// Input for reporting a question or an answer.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportInput {
    pub target_type: TargetKind,
    #[validate(length(min = 1))]
    pub target_id: String,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    #[validate(length(max = 2000))]
    pub details: Option<String>,
}

/// What a moderator does with a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    /// Delete the reported content.
    Remove,
    /// Keep the content and close the report.
    Dismiss,
}

/// A report with the reporter's username.
#[derive(Debug, Clone)]
pub struct ReportWithReporter {
    pub report: report::Model,
    pub reporter: Option<String>,
}

/// Moderation service for business logic.
#[derive(Clone)]
pub struct ModerationService {
    report_repo: ReportRepository,
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
    user_repo: UserRepository,
    question_service: QuestionService,
    answer_service: AnswerService,
    id_gen: IdGenerator,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        question_repo: QuestionRepository,
        answer_repo: AnswerRepository,
        user_repo: UserRepository,
        question_service: QuestionService,
        answer_service: AnswerService,
    ) -> Self {
        Self {
            report_repo,
            question_repo,
            answer_repo,
            user_repo,
            question_service,
            answer_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Report a question or an answer.
    pub async fn submit_report(
        &self,
        caller: &Caller,
        input: SubmitReportInput,
    ) -> AppResult<report::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        match input.target_type {
            TargetKind::Question => {
                self.question_repo.get_by_id(&input.target_id).await?;
            }
            TargetKind::Answer => {
                self.answer_repo.get_by_id(&input.target_id).await?;
            }
        }

        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            reporter_id: Set(caller.id.clone()),
            target_type: Set(input.target_type),
            target_id: Set(input.target_id),
            reason: Set(input.reason),
            details: Set(input.details.filter(|d| !d.trim().is_empty())),
            status: Set(ReportStatus::Pending),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        let report = self.report_repo.create(model).await?;
        info!(report_id = %report.id, reporter_id = %caller.id, "Report submitted");
        Ok(report)
    }

    /// List reports, newest first.
    pub async fn list_reports(
        &self,
        caller: &Caller,
        status: Option<ReportStatus>,
        target_type: Option<TargetKind>,
    ) -> AppResult<Vec<ReportWithReporter>> {
        require_admin(caller)?;

        let reports = self.report_repo.list(status, target_type).await?;
        let reporter_ids: Vec<String> = reports
            .iter()
            .map(|r| r.reporter_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let names: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&reporter_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(reports
            .into_iter()
            .map(|report| ReportWithReporter {
                reporter: names.get(&report.reporter_id).cloned(),
                report,
            })
            .collect())
    }

    /// Resolve a report.
    ///
    /// `Remove` deletes the reported content through the normal delete paths;
    /// content that is already gone is not an error.
    pub async fn moderate_report(
        &self,
        caller: &Caller,
        report_id: &str,
        action: ModerationAction,
    ) -> AppResult<report::Model> {
        require_admin(caller)?;

        let report = self.report_repo.get_by_id(report_id).await?;

        let status = match action {
            ModerationAction::Remove => {
                let removed = match report.target_type {
                    TargetKind::Question => {
                        self.question_service.delete(caller, &report.target_id).await
                    }
                    TargetKind::Answer => {
                        self.answer_service.delete(caller, &report.target_id).await
                    }
                };
                match removed {
                    Ok(()) | Err(AppError::QuestionNotFound(_) | AppError::AnswerNotFound(_)) => {}
                    Err(e) => return Err(e),
                }
                ReportStatus::Reviewed
            }
            ModerationAction::Dismiss => ReportStatus::Dismissed,
        };

        let mut active: report::ActiveModel = report.into();
        active.status = Set(status);
        active.reviewed_by = Set(Some(caller.id.clone()));
        active.reviewed_at = Set(Some(Utc::now().into()));
        let report = self.report_repo.update(active).await?;

        info!(report_id = %report.id, ?action, moderator_id = %caller.id, "Report moderated");
        Ok(report)
    }
}

fn require_admin(caller: &Caller) -> AppResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admins only".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::notification::NotificationService;
    use crate::services::test_support::{empty_db, question_model, user_model};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use stackit_common::config::QuestionsConfig;
    use stackit_db::entities::{answer, question, user::UserRole};
    use stackit_db::repositories::{
        NotificationRepository, QuestionViewRepository, TagRepository, VoteRepository,
    };
    use std::sync::Arc;

    fn service(db: &Arc<DatabaseConnection>) -> ModerationService {
        let questions = QuestionService::new(
            QuestionRepository::new(Arc::clone(db)),
            AnswerRepository::new(Arc::clone(db)),
            TagRepository::new(Arc::clone(db)),
            VoteRepository::new(Arc::clone(db)),
            QuestionViewRepository::new(Arc::clone(db)),
            UserRepository::new(Arc::clone(db)),
            QuestionsConfig::default(),
        );
        let answers = AnswerService::new(
            AnswerRepository::new(Arc::clone(db)),
            QuestionRepository::new(Arc::clone(db)),
            VoteRepository::new(Arc::clone(db)),
            NotificationService::new(NotificationRepository::new(empty_db())),
        );
        ModerationService::new(
            ReportRepository::new(Arc::clone(db)),
            QuestionRepository::new(Arc::clone(db)),
            AnswerRepository::new(Arc::clone(db)),
            UserRepository::new(Arc::clone(db)),
            questions,
            answers,
        )
    }

    fn report_row(status: ReportStatus, kind: TargetKind) -> report::Model {
        report::Model {
            id: "r1".to_string(),
            reporter_id: "reporter".to_string(),
            target_type: kind,
            target_id: "x1".to_string(),
            reason: "spam".to_string(),
            details: None,
            status,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now().into(),
        }
    }

    fn admin() -> Caller {
        Caller::new("root", UserRole::Admin)
    }

    #[tokio::test]
    async fn test_submit_report_on_missing_target() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<question::Model>::new()])
                .into_connection(),
        );

        let result = service(&db)
            .submit_report(
                &Caller::new("reporter", UserRole::User),
                SubmitReportInput {
                    target_type: TargetKind::Question,
                    target_id: "gone".to_string(),
                    reason: "spam".to_string(),
                    details: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::QuestionNotFound(_))));
    }

    #[tokio::test]
    async fn test_submit_report() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question_model("x1", "author")]])
                .append_query_results([[report_row(ReportStatus::Pending, TargetKind::Question)]])
                .into_connection(),
        );

        let report = service(&db)
            .submit_report(
                &Caller::new("reporter", UserRole::User),
                SubmitReportInput {
                    target_type: TargetKind::Question,
                    target_id: "x1".to_string(),
                    reason: "spam".to_string(),
                    details: Some("   ".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_reports_requires_admin() {
        let result = service(&empty_db())
            .list_reports(&Caller::new("u1", UserRole::User), None, None)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_reports_with_reporter_names() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report_row(ReportStatus::Pending, TargetKind::Answer)]])
                .append_query_results([[user_model("reporter", UserRole::User)]])
                .into_connection(),
        );

        let reports = service(&db)
            .list_reports(&admin(), Some(ReportStatus::Pending), None)
            .await
            .unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].reporter.as_deref(), Some("reporter"));
    }

    #[tokio::test]
    async fn test_remove_tolerates_already_deleted_content() {
        let mut reviewed = report_row(ReportStatus::Reviewed, TargetKind::Answer);
        reviewed.reviewed_by = Some("root".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report_row(ReportStatus::Pending, TargetKind::Answer)]])
                // answer lookup finds nothing
                .append_query_results([Vec::<answer::Model>::new()])
                .append_query_results([[reviewed]])
                .into_connection(),
        );

        let report = service(&db)
            .moderate_report(&admin(), "r1", ModerationAction::Remove)
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Reviewed);
        assert_eq!(report.reviewed_by.as_deref(), Some("root"));
    }

    #[tokio::test]
    async fn test_dismiss() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report_row(ReportStatus::Pending, TargetKind::Question)]])
                .append_query_results([[report_row(ReportStatus::Dismissed, TargetKind::Question)]])
                .into_connection(),
        );

        let report = service(&db)
            .moderate_report(&admin(), "r1", ModerationAction::Dismiss)
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Dismissed);
    }
}
