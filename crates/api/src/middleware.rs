//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use stackit_common::{AppError, PageRequest, config::QuestionsConfig};
use stackit_core::{
    AcceptanceService, AnswerService, ModerationService, NotificationService, QuestionService,
    TagService, UserService, VoteService,
};

use crate::sse::SseBroadcaster;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub vote_service: VoteService,
    pub acceptance_service: AcceptanceService,
    pub question_service: QuestionService,
    pub answer_service: AnswerService,
    pub tag_service: TagService,
    pub notification_service: NotificationService,
    pub moderation_service: ModerationService,
    pub sse_broadcaster: SseBroadcaster,
    /// Paging defaults shared by list endpoints.
    pub questions: QuestionsConfig,
}

impl AppState {
    /// Clamp raw paging input with the configured defaults.
    #[must_use]
    pub fn page_request(&self, page: Option<u64>, limit: Option<u64>) -> PageRequest {
        PageRequest::new(
            page,
            limit,
            self.questions.default_page_size,
            self.questions.max_page_size,
        )
    }
}

/// Resolve `Authorization: Bearer <token>` into a `user::Model` request extension.
///
/// Requests without a valid credential continue anonymously; a banned
/// account is rejected outright.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(AppError::Unauthorized) => {}
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}
