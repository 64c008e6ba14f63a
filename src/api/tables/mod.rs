//! Dining Table API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}/mark-cleaned", post(handler::mark_cleaned))
        .route("/{id}/regenerate-otp", post(handler::regenerate_otp))
        .route("/{id}/otp-history", get(handler::otp_history))
}
