//! Report endpoints.

use axum::{Router, extract::State, routing::post};
use serde::Serialize;
use stackit_common::AppResult;
use stackit_core::{ReportWithReporter, SubmitReportInput};
use stackit_db::entities::{
    TargetKind,
    report::{self, ReportStatus},
};

use crate::{extractors::{ApiJson, AuthUser}, middleware::AppState, response::ApiResponse};

/// Report response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub created_at: String,
    pub reporter_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_username: Option<String>,
    pub target_type: TargetKind,
    pub target_id: String,
    pub reason: String,
    pub details: Option<String>,
    pub status: ReportStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
}

impl From<report::Model> for ReportResponse {
    fn from(r: report::Model) -> Self {
        Self {
            id: r.id,
            created_at: r.created_at.to_rfc3339(),
            reporter_id: r.reporter_id,
            reporter_username: None,
            target_type: r.target_type,
            target_id: r.target_id,
            reason: r.reason,
            details: r.details,
            status: r.status,
            reviewed_by: r.reviewed_by,
            reviewed_at: r.reviewed_at.map(|t| t.to_rfc3339()),
        }
    }
}

impl From<ReportWithReporter> for ReportResponse {
    fn from(r: ReportWithReporter) -> Self {
        Self {
            reporter_username: r.reporter,
            ..r.report.into()
        }
    }
}

/// Report a question or an answer.
async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SubmitReportInput>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state
        .moderation_service
        .submit_report(&user.caller(), input)
        .await?;
    Ok(ApiResponse::ok(report.into()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/create", post(create))
}
