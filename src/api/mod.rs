//! API route modules
//!
//! Thin axum handlers over the domain services. Every success response uses
//! the [`AppResponse`] envelope via [`crate::utils::ok`]; errors map through
//! `AppError::into_response`.
//!
//! # Structure
//!
//! - [`health`] - liveness and component checks
//! - [`scan`] - QR scan intake and session bootstrap
//! - [`otp`] - table code verification
//! - [`sessions`] - session lifecycle operations
//! - [`alerts`] - staff alert list and lifecycle
//! - [`tables`] - floor view, cleaning and code rotation
//! - [`cleaning`] - cleaning statistics
//! - [`jobs`] - manual job triggers for external schedulers
//! - [`events`] - SSE notification stream

pub mod alerts;
pub mod cleaning;
pub mod events;
pub mod health;
pub mod jobs;
pub mod otp;
pub mod scan;
pub mod sessions;
pub mod tables;

use axum::Router;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Every route of the server
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(scan::router())
        .merge(otp::router())
        .merge(sessions::router())
        .merge(alerts::router())
        .merge(tables::router())
        .merge(cleaning::router())
        .merge(jobs::router())
        .merge(events::router())
}
