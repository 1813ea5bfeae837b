//! HTTP transport - maps REST requests onto [`ProgressEngine`] calls.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `POST /users/:user_id/contents/:content_id/watch-time` — body `{"seconds": 42.5}`.
//! - `POST /users/:user_id/quizzes/:quiz_id/submissions` — body `{"answers": {"q1": 2, "q2": true}}`.
//! - `GET /users/:user_id/contents/:content_id/unlocked`
//! - `GET /users/:user_id/chapters/:chapter_id/quiz-unlocked`
//! - `GET /users/:user_id/modules/:module_id/unlocked`
//! - `GET /users/:user_id/overview`
//! - `GET /health`
//!
//! Engine calls may block on the per-user lock, so they run on the blocking
//! pool.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use formation_progress::{http, ProgressEngine, InMemoryCatalog, InMemoryProgressStore};
//!
//! let engine = Arc::new(ProgressEngine::new(InMemoryProgressStore::new(), catalog));
//! http::serve(engine, "0.0.0.0:3000").await?;
//! ```

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::engine::ProgressEngine;
use crate::error::ProgressError;
use crate::hierarchy::HierarchyStore;
use crate::lock::LockManager;
use crate::outbox::OutboxStore;
use crate::quiz::AnswerSheet;
use crate::store::ProgressStore;

#[derive(Debug, Deserialize)]
pub struct WatchTimeRequest {
    pub seconds: f64,
}

#[derive(Debug, Deserialize)]
pub struct QuizSubmissionRequest {
    pub answers: AnswerSheet,
}

#[derive(Debug, Serialize)]
struct Unlocked {
    unlocked: bool,
}

/// Build an axum `Router` over a shared engine.
pub fn router<S, H, L>(engine: Arc<ProgressEngine<S, H, L>>) -> Router
where
    S: ProgressStore + OutboxStore + 'static,
    H: HierarchyStore + 'static,
    L: LockManager + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/users/:user_id/contents/:content_id/watch-time",
            post(watch_time_handler::<S, H, L>),
        )
        .route(
            "/users/:user_id/quizzes/:quiz_id/submissions",
            post(submit_quiz_handler::<S, H, L>),
        )
        .route(
            "/users/:user_id/contents/:content_id/unlocked",
            get(content_unlocked_handler::<S, H, L>),
        )
        .route(
            "/users/:user_id/chapters/:chapter_id/quiz-unlocked",
            get(quiz_unlocked_handler::<S, H, L>),
        )
        .route(
            "/users/:user_id/modules/:module_id/unlocked",
            get(module_unlocked_handler::<S, H, L>),
        )
        .route("/users/:user_id/overview", get(overview_handler::<S, H, L>))
        .with_state(engine)
}

/// Serve the engine over HTTP at the given address (e.g. `"0.0.0.0:3000"`).
pub async fn serve<S, H, L>(
    engine: Arc<ProgressEngine<S, H, L>>,
    addr: &str,
) -> Result<(), std::io::Error>
where
    S: ProgressStore + OutboxStore + 'static,
    H: HierarchyStore + 'static,
    L: LockManager + 'static,
{
    let app = router(engine);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "progress engine listening");
    axum::serve(listener, app).await
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn watch_time_handler<S, H, L>(
    State(engine): State<Arc<ProgressEngine<S, H, L>>>,
    Path((user_id, content_id)): Path<(String, String)>,
    body: Result<Json<WatchTimeRequest>, JsonRejection>,
) -> Response
where
    S: ProgressStore + OutboxStore + 'static,
    H: HierarchyStore + 'static,
    L: LockManager + 'static,
{
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection),
    };
    run(move || engine.record_watch_time(&user_id, &content_id, request.seconds)).await
}

async fn submit_quiz_handler<S, H, L>(
    State(engine): State<Arc<ProgressEngine<S, H, L>>>,
    Path((user_id, quiz_id)): Path<(String, String)>,
    body: Result<Json<QuizSubmissionRequest>, JsonRejection>,
) -> Response
where
    S: ProgressStore + OutboxStore + 'static,
    H: HierarchyStore + 'static,
    L: LockManager + 'static,
{
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection),
    };
    run(move || engine.submit_quiz(&user_id, &quiz_id, request.answers)).await
}

async fn content_unlocked_handler<S, H, L>(
    State(engine): State<Arc<ProgressEngine<S, H, L>>>,
    Path((user_id, content_id)): Path<(String, String)>,
) -> Response
where
    S: ProgressStore + OutboxStore + 'static,
    H: HierarchyStore + 'static,
    L: LockManager + 'static,
{
    run(move || {
        engine
            .is_content_unlocked(&user_id, &content_id)
            .map(|unlocked| Unlocked { unlocked })
    })
    .await
}

async fn quiz_unlocked_handler<S, H, L>(
    State(engine): State<Arc<ProgressEngine<S, H, L>>>,
    Path((user_id, chapter_id)): Path<(String, String)>,
) -> Response
where
    S: ProgressStore + OutboxStore + 'static,
    H: HierarchyStore + 'static,
    L: LockManager + 'static,
{
    run(move || {
        engine
            .is_chapter_quiz_unlocked(&user_id, &chapter_id)
            .map(|unlocked| Unlocked { unlocked })
    })
    .await
}

async fn module_unlocked_handler<S, H, L>(
    State(engine): State<Arc<ProgressEngine<S, H, L>>>,
    Path((user_id, module_id)): Path<(String, String)>,
) -> Response
where
    S: ProgressStore + OutboxStore + 'static,
    H: HierarchyStore + 'static,
    L: LockManager + 'static,
{
    run(move || {
        engine
            .is_module_unlocked(&user_id, &module_id)
            .map(|unlocked| Unlocked { unlocked })
    })
    .await
}

async fn overview_handler<S, H, L>(
    State(engine): State<Arc<ProgressEngine<S, H, L>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: ProgressStore + OutboxStore + 'static,
    H: HierarchyStore + 'static,
    L: LockManager + 'static,
{
    run(move || engine.progress_overview(&user_id)).await
}

async fn run<T, F>(call: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> Result<T, ProgressError> + Send + 'static,
{
    match tokio::task::spawn_blocking(call).await {
        Ok(Ok(value)) => (StatusCode::OK, Json(value)).into_response(),
        Ok(Err(error)) => error_response(&error),
        Err(join_error) => {
            tracing::warn!(error = %join_error, "engine task failed");
            let body = json!({ "error": "internal error" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

fn error_response(error: &ProgressError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = match error {
        ProgressError::AlreadyPassed { result } => {
            json!({ "error": error.to_string(), "result": result })
        }
        _ => json!({ "error": error.to_string() }),
    };
    (status, Json(body)).into_response()
}

fn bad_request(rejection: JsonRejection) -> Response {
    let body = json!({ "error": rejection.body_text() });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}
