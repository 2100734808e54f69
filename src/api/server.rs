//! HTTP surface of the move server.
//!
//! | Method | Path                           | Body / result                      |
//! |--------|--------------------------------|------------------------------------|
//! | POST   | `/api/tasks/move`              | [`MoveRequest`] → [`MoveResponse`] |
//! | GET    | `/api/boards/{boardId}/tasks`  | board snapshot                     |
//! | GET    | `/health`                      | `{"status":"ok"}`                  |
//!
//! The caller is identified by the `x-user-id` header, set by the gateway in
//! front of this service. Every request opens its own SQLite connection on a
//! blocking thread; the move itself runs in an IMMEDIATE transaction.

use crate::db::boards::Boards;
use crate::db::db::Db;
use crate::libs::board::{BoardInvalidation, BoardSnapshot};
use crate::libs::error::{ErrorKind, MoveError};
use crate::libs::messages::Message;
use crate::libs::move_task::{execute_move, MoveRequest, MoveResponse, MoveSettings};
use crate::libs::task::{BoardId, UserId};
use crate::{msg_debug, msg_info, msg_warning};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

/// Identity header set by the upstream gateway.
pub const USER_HEADER: &str = "x-user-id";

const INVALIDATION_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    db_path: Arc<PathBuf>,
    settings: MoveSettings,
    invalidations: broadcast::Sender<BoardInvalidation>,
}

impl AppState {
    /// The database at `db_path` must already be migrated.
    pub fn new(db_path: PathBuf, settings: MoveSettings) -> Self {
        let (invalidations, _) = broadcast::channel(INVALIDATION_CAPACITY);
        AppState {
            db_path: Arc::new(db_path),
            settings,
            invalidations,
        }
    }

    /// Receives `{boardId, taskId}` after every committed move.
    pub fn subscribe(&self) -> broadcast::Receiver<BoardInvalidation> {
        self.invalidations.subscribe()
    }

    /// Best effort: nobody listening is not an error.
    fn publish(&self, invalidation: BoardInvalidation) {
        if self.invalidations.send(invalidation).is_err() {
            msg_debug!(Message::InvalidationDropped(invalidation.board_id));
        }
    }

    /// Runs `work` on a blocking thread with a fresh connection.
    async fn with_connection<F, R>(&self, work: F) -> Result<R, MoveError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, MoveError> + Send + 'static,
        R: Send + 'static,
    {
        let db_path = Arc::clone(&self.db_path);
        tokio::task::spawn_blocking(move || {
            let mut conn = Db::connect(db_path.as_path())?;
            work(&mut conn)
        })
        .await
        .map_err(|e| MoveError::Internal(e.to_string()))?
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/tasks/move", post(move_task))
        .route("/api/boards/{board_id}/tasks", get(board_tasks))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `bind` and serves until Ctrl+C.
pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    msg_info!(Message::ServerListening(listener.local_addr()?.to_string()));

    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await?;

    msg_info!(Message::ServerStopped);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

fn actor(headers: &HeaderMap) -> Result<UserId, MoveError> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<UserId>().ok())
        .filter(|&user_id| user_id > 0)
        .ok_or(MoveError::Authorization)
}

async fn move_task(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<MoveResponse>, MoveError> {
    let actor = actor(&headers)?;
    let request = MoveRequest::parse(&body)?;
    let task_id = request.task_id;
    let settings = state.settings;

    let outcome = state
        .with_connection(move |conn| execute_move(conn, actor, &request, &settings))
        .await
        .inspect_err(|e| {
            msg_warning!(Message::MoveRejected {
                task_id,
                reason: e.to_string(),
            })
        })?;

    msg_info!(Message::MoveCommitted {
        task_id: outcome.task.id,
        container: outcome.task.container().to_string(),
    });
    state.publish(BoardInvalidation {
        board_id: outcome.task.board_id,
        task_id: outcome.task.id,
    });

    Ok(Json(outcome.response()))
}

async fn board_tasks(State(state): State<AppState>, Path(board_id): Path<BoardId>, headers: HeaderMap) -> Result<Json<BoardSnapshot>, MoveError> {
    let actor = actor(&headers)?;

    let snapshot = state
        .with_connection(move |conn| {
            let boards = Boards::new(conn);
            let board = boards.get(board_id)?.ok_or_else(|| MoveError::not_found("Board", board_id))?;
            if !boards.is_member(board.organization_id, actor)? {
                return Err(MoveError::Authorization);
            }
            Ok(boards.snapshot(board_id)?)
        })
        .await?;

    Ok(Json(snapshot))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

impl MoveError {
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::CapacityExceeded | ErrorKind::CycleDetected => StatusCode::BAD_REQUEST,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::TransientNetwork | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MoveError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "move request failed");
        }
        (status, Json(self.to_body())).into_response()
    }
}
