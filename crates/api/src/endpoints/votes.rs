//! Vote endpoints.

use std::collections::HashMap;

use axum::{Router, extract::State, routing::post};
use serde::Deserialize;
use stackit_common::AppResult;
use stackit_core::{VoteOutcome, VoteValue};
use stackit_db::entities::TargetKind;
use validator::Validate;

use crate::{extractors::{ApiJson, AuthUser}, middleware::AppState, response::ApiResponse};

/// Cast vote request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub target_kind: TargetKind,
    #[validate(length(min = 1, max = 32))]
    pub target_id: String,
    /// `1` or `-1`; anything else is rejected.
    pub value: i64,
}

/// Own votes lookup request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MyVotesRequest {
    pub target_kind: TargetKind,
    #[validate(length(max = 100))]
    pub target_ids: Vec<String>,
}

/// Cast, flip or retract a vote.
async fn cast(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CastVoteRequest>,
) -> AppResult<ApiResponse<VoteOutcome>> {
    req.validate()?;
    let value = VoteValue::try_from(req.value)?;

    let outcome = state
        .vote_service
        .cast_vote(&user.caller(), req.target_kind, &req.target_id, value)
        .await?;

    Ok(ApiResponse::ok(outcome))
}

/// The caller's votes on the given targets, keyed by target id.
async fn mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MyVotesRequest>,
) -> AppResult<ApiResponse<HashMap<String, i16>>> {
    req.validate()?;

    let votes = state
        .vote_service
        .user_votes(&user.id, req.target_kind, &req.target_ids)
        .await?;

    Ok(ApiResponse::ok(votes))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cast", post(cast))
        .route("/mine", post(mine))
}
