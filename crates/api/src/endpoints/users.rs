//! User endpoints.

use axum::extract::State;
use serde::Serialize;
use stackit_common::AppResult;
use stackit_db::entities::user::{self, UserRole};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Public author card embedded in questions and answers.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
}

impl From<user::Model> for UserSummary {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            avatar_url: u.avatar_url,
            role: u.role,
        }
    }
}

/// Full user record, shown to the user themself and to admins.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub is_banned: bool,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            avatar_url: u.avatar_url,
            role: u.role,
            is_banned: u.is_banned,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Caller profile response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub question_count: u64,
    pub answer_count: u64,
}

/// Get the caller's own profile.
pub async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let profile = state.user_service.profile(&user.id).await?;

    Ok(ApiResponse::ok(ProfileResponse {
        user: profile.user.into(),
        question_count: profile.question_count,
        answer_count: profile.answer_count,
    }))
}
