//! Session API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sessions", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/active", get(handler::active))
        .route("/{id}/first-order", post(handler::first_order))
        .route("/{id}/food-served", post(handler::food_served))
        .route("/{id}/bill", post(handler::request_bill))
        .route("/{id}/assist", post(handler::request_assistance))
        .route("/{id}/guest-count", post(handler::guest_count))
        .route("/{id}/end", post(handler::end))
        .route("/{id}/timeline", get(handler::timeline))
        .route("/{id}/summary", get(handler::summary))
}
