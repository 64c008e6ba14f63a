//! Cleaning API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::sessions::CleaningStats;
use crate::utils::{AppResponse, AppResult, ok, time};

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub restaurant: String,
    /// Unix millis, defaults to 24h ago
    pub from: Option<i64>,
    /// Unix millis, defaults to now
    pub to: Option<i64>,
}

/// GET /api/cleaning/stats?restaurant=&from=&to=
pub async fn stats(
    State(state): State<ServerState>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<AppResponse<CleaningStats>>> {
    let now = time::now_millis();
    let from = query.from.unwrap_or_else(|| time::minutes_ago(24 * 60, now));
    let to = query.to.unwrap_or(now);
    let stats = state
        .cleaning()
        .cleaning_stats(&query.restaurant, from, to)
        .await?;
    Ok(ok(stats))
}
