//! Admin endpoints.

use axum::{Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use stackit_common::{AppResult, PageInfo};
use stackit_core::{ModerationAction, SiteStats};
use stackit_db::entities::{TargetKind, report::ReportStatus, user::UserRole};

use super::{reports::ReportResponse, users::UserResponse};
use crate::{
    extractors::{AdminUser, ApiJson},
    middleware::AppState,
    response::{ApiResponse, Empty, empty},
};

/// List reports request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReportsRequest {
    pub status: Option<ReportStatus>,
    pub target_type: Option<TargetKind>,
}

/// Moderate report request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateReportRequest {
    pub report_id: String,
    pub action: ModerationAction,
}

/// List users request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersRequest {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
}

/// User list page.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: PageInfo,
}

/// Update role request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub user_id: String,
    pub role: UserRole,
}

/// Request naming a single user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdRequest {
    pub user_id: String,
}

/// List reports, newest first.
async fn list_reports(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ListReportsRequest>,
) -> AppResult<ApiResponse<Vec<ReportResponse>>> {
    let reports = state
        .moderation_service
        .list_reports(&admin.caller(), req.status, req.target_type)
        .await?;
    Ok(ApiResponse::ok(reports.into_iter().map(Into::into).collect()))
}

/// Remove the reported content or dismiss the report.
async fn moderate_report(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ModerateReportRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state
        .moderation_service
        .moderate_report(&admin.caller(), &req.report_id, req.action)
        .await?;
    Ok(ApiResponse::ok(report.into()))
}

/// Site totals.
async fn stats(
    admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SiteStats>> {
    let stats = state.user_service.stats(&admin.caller()).await?;
    Ok(ApiResponse::ok(stats))
}

/// List users, newest first.
async fn list_users(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ListUsersRequest>,
) -> AppResult<ApiResponse<UserListResponse>> {
    let page = state.page_request(req.page, req.limit);
    let search = req.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let users = state
        .user_service
        .list_users(&admin.caller(), page, search)
        .await?;

    Ok(ApiResponse::ok(UserListResponse {
        users: users.items.into_iter().map(Into::into).collect(),
        pagination: users.info,
    }))
}

/// Change a user's role.
async fn update_role(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .user_service
        .update_role(&admin.caller(), &req.user_id, req.role)
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Delete a user and everything they own.
async fn delete_user(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UserIdRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .user_service
        .delete_user(&admin.caller(), &req.user_id)
        .await?;
    Ok(empty())
}

/// Ban a user.
async fn ban(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UserIdRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.ban(&admin.caller(), &req.user_id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Lift a ban.
async fn unban(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UserIdRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .user_service
        .unban(&admin.caller(), &req.user_id)
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/list", post(list_reports))
        .route("/reports/moderate", post(moderate_report))
        .route("/stats", post(stats))
        .route("/users/list", post(list_users))
        .route("/users/update-role", post(update_role))
        .route("/users/delete", post(delete_user))
        .route("/users/ban", post(ban))
        .route("/users/unban", post(unban))
}
