//! StackIt server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use sea_orm::DatabaseConnection;
use stackit_api::{SseBroadcaster, auth_middleware, middleware::AppState, router as api_router};
use stackit_common::Config;
use stackit_core::{
    AcceptanceService, AnswerService, ModerationService, NotificationService, QuestionService,
    TagService, UserService, VoteService,
};
use stackit_db::repositories::{
    AnswerRepository, NotificationRepository, QuestionRepository, QuestionViewRepository,
    ReportRepository, TagRepository, UserRepository, VoteRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often idle SSE rooms are dropped.
const SSE_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Wire repositories and services over one pool.
fn build_state(db: &Arc<DatabaseConnection>, config: &Config) -> AppState {
    let user_repo = UserRepository::new(Arc::clone(db));
    let question_repo = QuestionRepository::new(Arc::clone(db));
    let answer_repo = AnswerRepository::new(Arc::clone(db));
    let tag_repo = TagRepository::new(Arc::clone(db));
    let vote_repo = VoteRepository::new(Arc::clone(db));
    let view_repo = QuestionViewRepository::new(Arc::clone(db));
    let notification_repo = NotificationRepository::new(Arc::clone(db));
    let report_repo = ReportRepository::new(Arc::clone(db));

    // Notifications fan out to open SSE streams
    let sse_broadcaster = SseBroadcaster::new();
    let mut notification_service = NotificationService::new(notification_repo);
    notification_service.set_event_publisher(Arc::new(sse_broadcaster.clone()));

    let question_service = QuestionService::new(
        question_repo.clone(),
        answer_repo.clone(),
        tag_repo.clone(),
        vote_repo.clone(),
        view_repo,
        user_repo.clone(),
        config.questions.clone(),
    );
    let answer_service = AnswerService::new(
        answer_repo.clone(),
        question_repo.clone(),
        vote_repo.clone(),
        notification_service.clone(),
    );
    let vote_service = VoteService::new(vote_repo, question_repo.clone(), answer_repo.clone());
    let acceptance_service = AcceptanceService::new(
        question_repo.clone(),
        answer_repo.clone(),
        notification_service.clone(),
    );
    let user_service = UserService::new(
        user_repo.clone(),
        question_repo.clone(),
        answer_repo.clone(),
        tag_repo.clone(),
        report_repo.clone(),
    );
    let moderation_service = ModerationService::new(
        report_repo,
        question_repo,
        answer_repo,
        user_repo,
        question_service.clone(),
        answer_service.clone(),
    );
    let tag_service = TagService::new(tag_repo);

    AppState {
        user_service,
        vote_service,
        acceptance_service,
        question_service,
        answer_service,
        tag_service,
        notification_service,
        moderation_service,
        sse_broadcaster,
        questions: config.questions.clone(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stackit=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting StackIt server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(stackit_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    stackit_db::migrate(&db).await?;
    info!("Migrations completed");

    let state = build_state(&db, &config);

    let sse = state.sse_broadcaster.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SSE_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            sse.cleanup().await;
        }
    });

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Release pooled connections before exit
    match Arc::try_unwrap(db) {
        Ok(db) => db.close().await?,
        Err(_) => info!("Connection pool still shared at exit; dropping"),
    }

    info!("Server shutdown complete");
    Ok(())
}
