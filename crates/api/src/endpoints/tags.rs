//! Tag endpoints.

use axum::{Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use stackit_common::AppResult;
use stackit_core::TagInput;
use stackit_db::{entities::tag, repositories::TagWithCount};

use crate::{
    extractors::{AdminUser, ApiJson},
    middleware::AppState,
    response::{ApiResponse, Empty, empty},
};

/// Tag response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagResponse {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_count: Option<i64>,
}

impl From<tag::Model> for TagResponse {
    fn from(t: tag::Model) -> Self {
        Self {
            id: t.id,
            name: t.name,
            color: t.color,
            created_at: t.created_at.to_rfc3339(),
            question_count: None,
        }
    }
}

impl From<TagWithCount> for TagResponse {
    fn from(t: TagWithCount) -> Self {
        Self {
            id: t.id,
            name: t.name,
            color: t.color,
            created_at: t.created_at.to_rfc3339(),
            question_count: Some(t.question_count),
        }
    }
}

/// List tags request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTagsRequest {
    pub search: Option<String>,
    pub limit: Option<u64>,
}

/// Update tag request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTagRequest {
    pub tag_id: String,
    #[serde(flatten)]
    pub input: TagInput,
}

/// Delete tag request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTagRequest {
    pub tag_id: String,
}

/// List tags, most used first.
async fn list(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ListTagsRequest>,
) -> AppResult<ApiResponse<Vec<TagResponse>>> {
    let search = req.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let tags = state.tag_service.list(search, req.limit).await?;

    Ok(ApiResponse::ok(tags.into_iter().map(Into::into).collect()))
}

/// Create a tag.
async fn create(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TagInput>,
) -> AppResult<ApiResponse<TagResponse>> {
    let tag = state.tag_service.create(&admin.caller(), input).await?;
    Ok(ApiResponse::ok(tag.into()))
}

/// Rename or recolour a tag.
async fn update(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateTagRequest>,
) -> AppResult<ApiResponse<TagResponse>> {
    let tag = state
        .tag_service
        .update(&admin.caller(), &req.tag_id, req.input)
        .await?;
    Ok(ApiResponse::ok(tag.into()))
}

/// Delete a tag.
async fn delete(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<DeleteTagRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state.tag_service.delete(&admin.caller(), &req.tag_id).await?;
    Ok(empty())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
}
