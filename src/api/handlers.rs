//! HTTP request handlers

use super::types::{
    AdminSummaryResponse, CreateSessionRequest, CreateSessionResponse, DepthChoice,
    DepthsResponse, ErrorResponse, RatingsRequest, RowsResponse, SavedResponse, SessionView,
    SubmitTurnRequest, SuccessResponse,
};
use super::AppState;
use crate::partner::DisclosureDepth;
use crate::runtime::{RuntimeError, SessionHandle};
use crate::state_machine::TransitionError;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use subtle::ConstantTimeEq;

const ADMIN_KEY_HEADER: &str = "x-admin-key";
const EXPORT_FILENAME: &str = "disclosure_game_data.csv";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Participant flow
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/turns", post(submit_turn))
        .route("/api/sessions/:id/ratings", post(submit_ratings))
        .route("/api/sessions/:id/reset", post(reset_session))
        .route("/api/depths", get(list_depths))
        // Researcher access
        .route("/api/admin/summary", get(admin_summary))
        .route("/api/admin/rows", get(admin_rows))
        .route("/api/admin/export", get(admin_export))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Participant Flow
// ============================================================

async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let Json(req) = payload?;
    let (session_id, handle) = state.runtime.create().await;

    let mut runtime = handle.lock().await;
    if let Err(e) = runtime.start(req.participant_id).await {
        drop(runtime);
        state.runtime.release(&session_id).await;
        return Err(e.into());
    }

    tracing::info!(session_id = %session_id, "Session started");
    let session = SessionView::new(runtime.state(), state.config.expose_condition);
    Ok(Json(CreateSessionResponse {
        session_id,
        session,
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let handle = lookup(&state, &id).await?;
    let runtime = handle.lock().await;
    Ok(Json(SessionView::new(
        runtime.state(),
        state.config.expose_condition,
    )))
}

async fn submit_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SubmitTurnRequest>, JsonRejection>,
) -> Result<Json<SessionView>, AppError> {
    let Json(req) = payload?;
    let depth =
        DisclosureDepth::try_from(req.depth).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let handle = lookup(&state, &id).await?;
    let mut runtime = handle.lock().await;
    runtime.submit_turn(depth).await?;

    Ok(Json(SessionView::new(
        runtime.state(),
        state.config.expose_condition,
    )))
}

async fn submit_ratings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RatingsRequest>, JsonRejection>,
) -> Result<Json<SavedResponse>, AppError> {
    let Json(req) = payload?;
    let ratings = req.validate().map_err(AppError::BadRequest)?;

    let handle = lookup(&state, &id).await?;
    {
        let mut runtime = handle.lock().await;
        runtime.submit_ratings(ratings).await?;
    }

    // Rows are durable; the runtime has nothing left to hold
    state.runtime.release(&id).await;
    Ok(Json(SavedResponse { saved: true }))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let handle = lookup(&state, &id).await?;
    {
        let mut runtime = handle.lock().await;
        runtime.reset().await?;
    }

    state.runtime.release(&id).await;
    tracing::info!(session_id = %id, "Session reset");
    Ok(Json(SuccessResponse { success: true }))
}

async fn list_depths() -> Json<DepthsResponse> {
    let depths = DisclosureDepth::ALL
        .into_iter()
        .map(|depth| DepthChoice {
            value: depth,
            prompt: depth.prompt(),
            label: depth.label(),
        })
        .collect();
    Json(DepthsResponse { depths })
}

async fn lookup(state: &AppState, id: &str) -> Result<SessionHandle, AppError> {
    state
        .runtime
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

// ============================================================
// Researcher Access
// ============================================================

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = state.config.admin_key.as_deref() else {
        return Err(AppError::Forbidden(
            "Admin access is not configured".to_string(),
        ));
    };

    let provided = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        tracing::warn!("Rejected admin request");
        Err(AppError::Unauthorized("Invalid admin key".to_string()))
    }
}

async fn admin_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AdminSummaryResponse>, AppError> {
    require_admin(&state, &headers)?;
    let dataset = state
        .runtime
        .db()
        .summary()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(AdminSummaryResponse {
        dataset,
        active_sessions: state.runtime.active_count().await,
    }))
}

async fn admin_rows(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RowsResponse>, AppError> {
    require_admin(&state, &headers)?;
    let rows = state
        .runtime
        .db()
        .list_rows()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(RowsResponse { rows }))
}

async fn admin_export(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_admin(&state, &headers)?;
    let csv = state
        .runtime
        .db()
        .export_csv()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("disclosure-game ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<RuntimeError> for AppError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Transition(
                TransitionError::InvalidInput(msg) | TransitionError::InvalidState(msg),
            ) => AppError::BadRequest(msg),
            RuntimeError::Transition(e @ TransitionError::Configuration(_)) => {
                AppError::Internal(e.to_string())
            }
            e @ RuntimeError::Persistence(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
