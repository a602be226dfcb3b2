//! Answer endpoints.

use axum::{Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use stackit_common::AppResult;
use stackit_core::AnswerInput;
use stackit_db::entities::answer;

use crate::{
    extractors::{ApiJson, AuthUser},
    middleware::AppState,
    response::{ApiResponse, Empty, empty},
};

/// Answer response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub question_id: String,
    pub user_id: String,
    pub content: String,
    pub votes: i32,
    pub is_accepted: bool,
}

impl From<answer::Model> for AnswerResponse {
    fn from(a: answer::Model) -> Self {
        Self {
            id: a.id,
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.map(|t| t.to_rfc3339()),
            question_id: a.question_id,
            user_id: a.user_id,
            content: a.content,
            votes: a.votes,
            is_accepted: a.is_accepted,
        }
    }
}

/// Create answer request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnswerRequest {
    pub question_id: String,
    #[serde(flatten)]
    pub input: AnswerInput,
}

/// Update answer request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnswerRequest {
    pub answer_id: String,
    #[serde(flatten)]
    pub input: AnswerInput,
}

/// Request naming a single answer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerIdRequest {
    pub answer_id: String,
}

/// Accept an answer on one of the caller's questions.
async fn accept(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AnswerIdRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .acceptance_service
        .accept_answer(&user.caller(), &req.answer_id)
        .await?;
    Ok(empty())
}

/// Answer a question.
async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateAnswerRequest>,
) -> AppResult<ApiResponse<AnswerResponse>> {
    let answer = state
        .answer_service
        .create(&user.caller(), &user.0.username, &req.question_id, req.input)
        .await?;
    Ok(ApiResponse::ok(answer.into()))
}

/// Edit an answer.
async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateAnswerRequest>,
) -> AppResult<ApiResponse<AnswerResponse>> {
    let answer = state
        .answer_service
        .update(&user.caller(), &req.answer_id, req.input)
        .await?;
    Ok(ApiResponse::ok(answer.into()))
}

/// Delete an answer with its votes.
async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AnswerIdRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .answer_service
        .delete(&user.caller(), &req.answer_id)
        .await?;
    Ok(empty())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/accept", post(accept))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
}
