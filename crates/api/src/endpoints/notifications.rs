//! Notification endpoints.

use axum::{Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use stackit_common::{AppResult, PageInfo};
use stackit_db::entities::{TargetKind, notification};

use crate::{
    extractors::{ApiJson, AuthUser},
    middleware::AppState,
    response::{ApiResponse, Empty, empty},
};

/// Notification response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub created_at: String,
    pub is_read: bool,
    #[serde(rename = "type")]
    pub notification_type: &'static str,
    pub title: String,
    pub message: String,
    pub notifier_id: Option<String>,
    pub related_id: String,
    pub related_type: TargetKind,
    pub question_id: Option<String>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            created_at: n.created_at.to_rfc3339(),
            is_read: n.is_read,
            notification_type: n.notification_type.as_str(),
            title: n.title,
            message: n.message,
            notifier_id: n.notifier_id,
            related_id: n.related_id,
            related_type: n.related_type,
            question_id: n.question_id,
        }
    }
}

/// Notification list page.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub pagination: PageInfo,
}

/// List notifications request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsRequest {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Mark read request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_ids: Vec<String>,
}

/// Delete notification request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNotificationRequest {
    pub notification_id: String,
}

/// Count response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub count: u64,
}

/// List the caller's notifications, newest first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ListNotificationsRequest>,
) -> AppResult<ApiResponse<NotificationListResponse>> {
    let page = state.page_request(req.page, req.limit);
    let notifications = state.notification_service.list(&user.id, page).await?;

    Ok(ApiResponse::ok(NotificationListResponse {
        notifications: notifications.items.into_iter().map(Into::into).collect(),
        pagination: notifications.info,
    }))
}

/// Mark specific notifications as read.
async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MarkReadRequest>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state
        .notification_service
        .mark_as_read(&user.id, &req.notification_ids)
        .await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

/// Mark every notification as read.
async fn mark_all_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.notification_service.mark_all_as_read(&user.id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

/// Unread notification count.
async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.notification_service.count_unread(&user.id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

/// Delete one of the caller's notifications.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<DeleteNotificationRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .notification_service
        .delete(&user.id, &req.notification_id)
        .await?;
    Ok(empty())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/mark-read", post(mark_read))
        .route("/mark-all-read", post(mark_all_read))
        .route("/unread-count", post(unread_count))
        .route("/delete", post(delete))
}
