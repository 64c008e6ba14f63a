//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{CleaningRecord, DiningTable, OtpHistory, TableSession};
use crate::db::repository::DiningTableRepository;
use crate::sessions::{StayClassification, classify};
use crate::utils::{AppResponse, AppResult, ok, time};

#[derive(Debug, Deserialize)]
pub struct RestaurantQuery {
    pub restaurant: String,
}

/// One floor-map row: the table plus its live session, if any
#[derive(Debug, Serialize)]
pub struct TableView {
    #[serde(flatten)]
    pub table: DiningTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<TableSession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seated_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stay: Option<StayClassification>,
}

/// GET /api/tables?restaurant= - floor map with stay classification
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<RestaurantQuery>,
) -> AppResult<Json<AppResponse<Vec<TableView>>>> {
    let tables = DiningTableRepository::new(state.db.clone())
        .find_all(&query.restaurant)
        .await?;
    let sessions = state.sessions().active_sessions(&query.restaurant).await?;
    let now = time::now_millis();

    let views = tables
        .into_iter()
        .map(|table| {
            let session = table.id.as_ref().and_then(|table_id| {
                sessions
                    .iter()
                    .find(|s| s.table == *table_id)
                    .cloned()
            });
            let seated_minutes = session
                .as_ref()
                .and_then(|s| s.seated_at)
                .map(|at| time::elapsed_minutes(at, now));
            let stay = seated_minutes.map(|m| classify(m.max(0) as u64));
            TableView {
                table,
                session,
                seated_minutes,
                stay,
            }
        })
        .collect();
    Ok(ok(views))
}

#[derive(Debug, Deserialize, Default)]
pub struct MarkCleanedRequest {
    pub cleaned_by: Option<String>,
}

/// POST /api/tables/:id/mark-cleaned - close the open cleaning cycle
///
/// Succeeds with a null record when no cycle was open; the table still goes
/// back to AVAILABLE.
pub async fn mark_cleaned(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Option<Json<MarkCleanedRequest>>,
) -> AppResult<Json<AppResponse<Option<CleaningRecord>>>> {
    let cleaned_by = payload.and_then(|Json(p)| p.cleaned_by);
    let record = state.sessions().mark_table_cleaned(&id, cleaned_by).await?;
    Ok(ok(record))
}

#[derive(Debug, Deserialize, Default)]
pub struct RegenerateOtpRequest {
    pub issued_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegenerateOtpResponse {
    pub table: DiningTable,
    pub otp: String,
}

/// POST /api/tables/:id/regenerate-otp - staff-triggered code rotation
pub async fn regenerate_otp(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Option<Json<RegenerateOtpRequest>>,
) -> AppResult<Json<AppResponse<RegenerateOtpResponse>>> {
    let issued_by = payload.and_then(|Json(p)| p.issued_by);
    let (table, otp) = state.otp().regenerate_manual(&id, issued_by).await?;
    Ok(ok(RegenerateOtpResponse { table, otp }))
}

/// GET /api/tables/:id/otp-history - issuance log, newest first
pub async fn otp_history(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<OtpHistory>>>> {
    let history = state.otp().history_for_table(&id).await?;
    Ok(ok(history))
}
