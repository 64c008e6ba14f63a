//! Job trigger API module
//!
//! Manual entry points for the poll jobs, used by external schedulers and
//! for support diagnostics. With `restaurant` set the run covers that one
//! tenant; without it, every active restaurant.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/jobs/assistance/run", post(handler::run_assistance))
        .route("/api/jobs/long-stay/run", post(handler::run_long_stay))
        .route("/api/jobs/cleaning/run", post(handler::run_cleaning))
}
