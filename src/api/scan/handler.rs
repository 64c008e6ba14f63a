//! QR Scan API Handlers

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{QrScanEvent, TableSession};
use crate::utils::{AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub restaurant: String,
    pub table: String,
    pub fingerprint: Option<String>,
    pub ip: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub scan: QrScanEvent,
    pub session: TableSession,
    /// False when this scan was correlated to a recent one from the same
    /// device instead of opening a new event
    pub new_scan: bool,
}

/// POST /api/scan - record a scan and bootstrap the table session
///
/// A retry from the same device inside the correlation window reuses the
/// open scan event; everything else inserts a new one. Either way the
/// table's ACTIVE session is returned (created if missing).
pub async fn record_scan(
    State(state): State<ServerState>,
    Json(payload): Json<ScanRequest>,
) -> AppResult<Json<AppResponse<ScanResponse>>> {
    let tracker = state.scans();

    let existing = tracker
        .find_recent_scan_for_table(
            &payload.table,
            payload.fingerprint.as_deref(),
            payload.ip.as_deref(),
        )
        .await?;
    let (scan, new_scan) = match existing {
        Some(scan) => (scan, false),
        None => (
            tracker
                .record_scan(
                    &payload.restaurant,
                    &payload.table,
                    payload.fingerprint,
                    payload.ip,
                )
                .await?,
            true,
        ),
    };

    let scan_id = scan
        .id
        .as_ref()
        .map(|id| id.to_string())
        .ok_or_else(|| crate::utils::AppError::internal("Scan event without id".to_string()))?;
    let session = state
        .sessions()
        .start_session(&payload.restaurant, &payload.table, 0, Some(&scan_id))
        .await?;

    Ok(ok(ScanResponse {
        scan,
        session,
        new_scan,
    }))
}
