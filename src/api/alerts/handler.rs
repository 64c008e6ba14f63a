//! Alert API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::SessionAlert;
use crate::utils::{AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct RestaurantQuery {
    pub restaurant: String,
}

/// GET /api/alerts?restaurant= - unresolved alerts, newest first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<RestaurantQuery>,
) -> AppResult<Json<AppResponse<Vec<SessionAlert>>>> {
    let alerts = state.assistance().active_alerts(&query.restaurant).await?;
    Ok(ok(alerts))
}

#[derive(Debug, Deserialize, Default)]
pub struct AcknowledgeRequest {
    pub by: Option<String>,
}

/// POST /api/alerts/:id/acknowledge
pub async fn acknowledge(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Option<Json<AcknowledgeRequest>>,
) -> AppResult<Json<AppResponse<SessionAlert>>> {
    let by = payload.and_then(|Json(p)| p.by);
    let alert = state.sessions().acknowledge_alert(&id, by).await?;
    Ok(ok(alert))
}

#[derive(Debug, Deserialize, Default)]
pub struct ResolveRequest {
    pub by: Option<String>,
    pub note: Option<String>,
}

/// POST /api/alerts/:id/resolve - acknowledgment is not required first
pub async fn resolve(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Option<Json<ResolveRequest>>,
) -> AppResult<Json<AppResponse<SessionAlert>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let alert = state
        .sessions()
        .resolve_alert(&id, payload.by, payload.note)
        .await?;
    Ok(ok(alert))
}
