//! API endpoints.

#![allow(missing_docs)]

mod admin;
mod answers;
mod notifications;
mod questions;
mod reports;
mod tags;
mod users;
mod votes;

use axum::{Router, routing::post};

use crate::{middleware::AppState, sse};

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/i", post(users::me))
        .nest("/questions", questions::router())
        .nest("/answers", answers::router())
        .nest("/votes", votes::router())
        .nest("/tags", tags::router())
        .nest("/notifications", notifications::router())
        .nest("/reports", reports::router())
        .nest("/admin", admin::router())
        .nest("/streaming/sse", sse::router())
}
