//! User service: credential resolution, profiles and user administration.

use crate::services::caller::Caller;
use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use stackit_common::{AppError, AppResult, PageRequest, Paged};
use stackit_db::{
    entities::user::{self, UserRole},
    repositories::{
        AnswerRepository, QuestionRepository, ReportRepository, TagRepository, UserRepository,
    },
};
use tracing::info;

/// A user with activity counts.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user: user::Model,
    pub question_count: u64,
    pub answer_count: u64,
}

/// Site-wide totals for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    pub total_users: u64,
    pub total_questions: u64,
    pub total_answers: u64,
    pub total_tags: u64,
    pub pending_reports: u64,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
    tag_repo: TagRepository,
    report_repo: ReportRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        question_repo: QuestionRepository,
        answer_repo: AnswerRepository,
        tag_repo: TagRepository,
        report_repo: ReportRepository,
    ) -> Self {
        Self {
            user_repo,
            question_repo,
            answer_repo,
            tag_repo,
            report_repo,
        }
    }

    /// Resolve a bearer credential to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.is_banned {
            return Err(AppError::Forbidden("account banned".to_string()));
        }

        Ok(user)
    }

    /// A user with their question and answer counts.
    pub async fn profile(&self, user_id: &str) -> AppResult<UserProfile> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let question_count = self.question_repo.count_by_user(user_id).await?;
        let answer_count = self.answer_repo.count_by_user(user_id).await?;

        Ok(UserProfile {
            user,
            question_count,
            answer_count,
        })
    }

    /// Site-wide totals.
    pub async fn stats(&self, caller: &Caller) -> AppResult<SiteStats> {
        require_admin(caller)?;

        Ok(SiteStats {
            total_users: self.user_repo.count().await?,
            total_questions: self.question_repo.count().await?,
            total_answers: self.answer_repo.count().await?,
            total_tags: self.tag_repo.count().await?,
            pending_reports: self.report_repo.count_pending().await?,
        })
    }

    /// List users newest first, optionally filtered by username or email.
    pub async fn list_users(
        &self,
        caller: &Caller,
        page: PageRequest,
        search: Option<&str>,
    ) -> AppResult<Paged<user::Model>> {
        require_admin(caller)?;

        let (users, total) = self.user_repo.search(search, page).await?;
        Ok(Paged::new(users, page, total))
    }

    /// Change a user's role. Admins cannot demote themselves.
    pub async fn update_role(
        &self,
        caller: &Caller,
        user_id: &str,
        role: UserRole,
    ) -> AppResult<user::Model> {
        require_admin(caller)?;

        if caller.id == user_id && role != UserRole::Admin {
            return Err(AppError::BadRequest(
                "You cannot remove your own admin role".to_string(),
            ));
        }

        let target = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = target.into();
        active.role = Set(role);
        active.updated_at = Set(Some(Utc::now().into()));
        let updated = self.user_repo.update(active).await?;

        info!(user_id = %user_id, role = ?role, changed_by = %caller.id, "User role updated");
        Ok(updated)
    }

    /// Delete a user and everything they own. Admins cannot delete themselves.
    pub async fn delete_user(&self, caller: &Caller, user_id: &str) -> AppResult<()> {
        require_admin(caller)?;

        if caller.id == user_id {
            return Err(AppError::BadRequest(
                "You cannot delete your own account".to_string(),
            ));
        }

        self.user_repo.get_by_id(user_id).await?;
        self.user_repo.delete(user_id).await?;

        info!(user_id = %user_id, deleted_by = %caller.id, "User deleted");
        Ok(())
    }

    /// Ban a user. Admins cannot be banned.
    pub async fn ban(&self, caller: &Caller, user_id: &str) -> AppResult<user::Model> {
        require_admin(caller)?;

        let target = self.user_repo.get_by_id(user_id).await?;
        if target.is_admin() {
            return Err(AppError::Forbidden("Cannot ban another admin".to_string()));
        }

        self.set_banned(target, true).await
    }

    /// Lift a ban.
    pub async fn unban(&self, caller: &Caller, user_id: &str) -> AppResult<user::Model> {
        require_admin(caller)?;

        let target = self.user_repo.get_by_id(user_id).await?;
        self.set_banned(target, false).await
    }

    async fn set_banned(&self, target: user::Model, banned: bool) -> AppResult<user::Model> {
        let mut active: user::ActiveModel = target.into();
        active.is_banned = Set(banned);
        active.updated_at = Set(Some(Utc::now().into()));
        let updated = self.user_repo.update(active).await?;

        info!(user_id = %updated.id, banned, "User ban state changed");
        Ok(updated)
    }
}

fn require_admin(caller: &Caller) -> AppResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admins only".to_string()))
    }
}
