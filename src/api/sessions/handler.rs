//! Session API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::TableSession;
use crate::sessions::{SessionEndOutcome, SessionSummary, TimelineEntry};
use crate::utils::{AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct RestaurantQuery {
    pub restaurant: String,
}

/// GET /api/sessions/active?restaurant= - all ACTIVE sessions
pub async fn active(
    State(state): State<ServerState>,
    Query(query): Query<RestaurantQuery>,
) -> AppResult<Json<AppResponse<Vec<TableSession>>>> {
    let sessions = state.sessions().active_sessions(&query.restaurant).await?;
    Ok(ok(sessions))
}

/// POST /api/sessions/:id/first-order - ordering pipeline hook
pub async fn first_order(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<TableSession>>> {
    let session = state.sessions().record_first_order(&id).await?;
    Ok(ok(session))
}

/// POST /api/sessions/:id/food-served - kitchen hook
pub async fn food_served(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<TableSession>>> {
    let session = state.sessions().record_first_food_served(&id).await?;
    Ok(ok(session))
}

/// POST /api/sessions/:id/bill - guest asked for the bill
pub async fn request_bill(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<TableSession>>> {
    let session = state.sessions().request_bill(&id).await?;
    Ok(ok(session))
}

#[derive(Debug, Deserialize, Default)]
pub struct AssistRequest {
    pub message: Option<String>,
}

/// POST /api/sessions/:id/assist - call-waiter button
pub async fn request_assistance(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Option<Json<AssistRequest>>,
) -> AppResult<Json<AppResponse<TableSession>>> {
    let message = payload.and_then(|Json(p)| p.message);
    let session = state.sessions().request_assistance(&id, message).await?;
    Ok(ok(session))
}

#[derive(Debug, Deserialize)]
pub struct GuestCountRequest {
    pub guest_count: i32,
    pub reason: Option<String>,
    pub changed_by: Option<String>,
}

/// POST /api/sessions/:id/guest-count - edit the party size
pub async fn guest_count(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<GuestCountRequest>,
) -> AppResult<Json<AppResponse<TableSession>>> {
    if payload.guest_count < 0 {
        return Err(crate::utils::AppError::validation(
            "Guest count cannot be negative".to_string(),
        ));
    }
    let session = state
        .sessions()
        .update_guest_count(&id, payload.guest_count, payload.reason, payload.changed_by)
        .await?;
    Ok(ok(session))
}

#[derive(Debug, Deserialize, Default)]
pub struct EndRequest {
    pub ended_by: Option<String>,
    pub reason: Option<String>,
}

/// POST /api/sessions/:id/end - complete the session and rotate the code
pub async fn end(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Option<Json<EndRequest>>,
) -> AppResult<Json<AppResponse<SessionEndOutcome>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let outcome = state
        .sessions()
        .end_session_and_rotate_otp(&id, payload.ended_by, payload.reason)
        .await?;
    Ok(ok(outcome))
}

/// GET /api/sessions/:id/timeline - chronological event reconstruction
pub async fn timeline(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<TimelineEntry>>>> {
    let entries = state.sessions().session_timeline(&id).await?;
    Ok(ok(entries))
}

/// GET /api/sessions/:id/summary - named phase deltas
pub async fn summary(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<SessionSummary>>> {
    let summary = state.sessions().session_summary(&id).await?;
    Ok(ok(summary))
}
