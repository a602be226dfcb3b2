//! Question endpoints.

use axum::{Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use stackit_common::{AppResult, PageInfo};
use stackit_core::{
    AnswerView, CreateQuestionInput, ListQuestionsInput, QuestionDetail, QuestionSummary,
    TaggedQuestion, UpdateQuestionInput,
};
use stackit_db::entities::question;

use super::{answers::AnswerResponse, tags::TagResponse, users::UserSummary};
use crate::{
    extractors::{ApiJson, AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, Empty, empty},
};

/// Question response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub votes: i32,
    pub view_count: i32,
    pub answers_count: i32,
    pub accepted_answer_id: Option<String>,
    pub tags: Vec<TagResponse>,
}

impl QuestionResponse {
    fn new(q: question::Model, tags: Vec<TagResponse>) -> Self {
        Self {
            id: q.id,
            created_at: q.created_at.to_rfc3339(),
            updated_at: q.updated_at.map(|t| t.to_rfc3339()),
            user_id: q.user_id,
            title: q.title,
            description: q.description,
            votes: q.votes,
            view_count: q.view_count,
            answers_count: q.answers_count,
            accepted_answer_id: q.accepted_answer_id,
            tags,
        }
    }
}

impl From<TaggedQuestion> for QuestionResponse {
    fn from(t: TaggedQuestion) -> Self {
        Self::new(t.question, t.tags.into_iter().map(Into::into).collect())
    }
}

/// Question list row.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummaryResponse {
    #[serde(flatten)]
    pub question: QuestionResponse,
    pub author: Option<UserSummary>,
    pub user_vote: Option<i16>,
}

impl From<QuestionSummary> for QuestionSummaryResponse {
    fn from(s: QuestionSummary) -> Self {
        Self {
            question: QuestionResponse::new(
                s.question,
                s.tags.into_iter().map(Into::into).collect(),
            ),
            author: s.author.map(Into::into),
            user_vote: s.user_vote,
        }
    }
}

/// Question list page.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionListResponse {
    pub questions: Vec<QuestionSummaryResponse>,
    pub pagination: PageInfo,
}

/// Answer as shown on the question page.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerViewResponse {
    #[serde(flatten)]
    pub answer: AnswerResponse,
    pub author: Option<UserSummary>,
    pub user_vote: Option<i16>,
    pub can_edit: bool,
}

impl From<AnswerView> for AnswerViewResponse {
    fn from(v: AnswerView) -> Self {
        Self {
            answer: v.answer.into(),
            author: v.author.map(Into::into),
            user_vote: v.user_vote,
            can_edit: v.can_edit,
        }
    }
}

/// Question page.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDetailResponse {
    #[serde(flatten)]
    pub question: QuestionResponse,
    pub author: Option<UserSummary>,
    pub answers: Vec<AnswerViewResponse>,
    pub user_vote: Option<i16>,
    pub can_edit: bool,
}

impl From<QuestionDetail> for QuestionDetailResponse {
    fn from(d: QuestionDetail) -> Self {
        Self {
            question: QuestionResponse::new(
                d.question,
                d.tags.into_iter().map(Into::into).collect(),
            ),
            author: d.author.map(Into::into),
            answers: d.answers.into_iter().map(Into::into).collect(),
            user_vote: d.user_vote,
            can_edit: d.can_edit,
        }
    }
}

/// Show question request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowQuestionRequest {
    pub question_id: String,
}

/// Update question request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    pub question_id: String,
    #[serde(flatten)]
    pub input: UpdateQuestionInput,
}

/// Delete question request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuestionRequest {
    pub question_id: String,
}

/// List questions with search, tag filter and sort.
async fn list(
    user: MaybeAuthUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ListQuestionsInput>,
) -> AppResult<ApiResponse<QuestionListResponse>> {
    let page = state
        .question_service
        .list(input, user.caller().as_ref())
        .await?;

    Ok(ApiResponse::ok(QuestionListResponse {
        questions: page.items.into_iter().map(Into::into).collect(),
        pagination: page.info,
    }))
}

/// Show a question, counting the view.
async fn show(
    user: MaybeAuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ShowQuestionRequest>,
) -> AppResult<ApiResponse<QuestionDetailResponse>> {
    let viewer = user.caller();
    state
        .question_service
        .record_view(&req.question_id, viewer.as_ref())
        .await?;
    let detail = state
        .question_service
        .get(&req.question_id, viewer.as_ref())
        .await?;

    Ok(ApiResponse::ok(detail.into()))
}

/// Ask a question.
async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateQuestionInput>,
) -> AppResult<ApiResponse<QuestionResponse>> {
    let question = state
        .question_service
        .create(&user.caller(), input)
        .await?;
    Ok(ApiResponse::ok(question.into()))
}

/// Edit a question.
async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateQuestionRequest>,
) -> AppResult<ApiResponse<QuestionResponse>> {
    let question = state
        .question_service
        .update(&user.caller(), &req.question_id, req.input)
        .await?;
    Ok(ApiResponse::ok(question.into()))
}

/// Delete a question with its answers and votes.
async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<DeleteQuestionRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .question_service
        .delete(&user.caller(), &req.question_id)
        .await?;
    Ok(empty())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/show", post(show))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
}
