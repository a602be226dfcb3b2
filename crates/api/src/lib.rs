//! HTTP API layer for StackIt.
//!
//! This crate provides the JSON API and real-time notification stream:
//!
//! - **Endpoints**: RPC-style `POST` routes for questions, answers, votes and moderation
//! - **Extractors**: Authenticated, optional and admin callers
//! - **Middleware**: Bearer credential resolution
//! - **Streaming**: Server-Sent Events for notifications
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod sse;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
pub use sse::{SseBroadcaster, SseEvent};
