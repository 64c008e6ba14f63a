//! Table OTP API Handlers

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::core::ServerState;
use crate::sessions::OtpSeating;
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub restaurant: String,
    pub table: String,
    pub code: String,
    /// Scan event to credit the attempt to, if known
    pub scan: Option<String>,
}

/// POST /api/otp/verify - check the table code and seat the guests
///
/// A wrong code is a 200 with `verification` set accordingly, not an error;
/// the guest retries on the same screen.
pub async fn verify(
    State(state): State<ServerState>,
    Json(payload): Json<VerifyRequest>,
) -> AppResult<Json<AppResponse<OtpSeating>>> {
    let seating = state
        .sessions()
        .verify_otp_and_seat(
            &payload.restaurant,
            &payload.table,
            &payload.code,
            payload.scan.as_deref(),
        )
        .await?;

    if seating.verification.is_valid() {
        Ok(ok(seating))
    } else {
        Ok(ok_with_message(seating, "Verification failed"))
    }
}
