//! Bhoj Edge - restaurant table-session and alerting service
//!
//! Tracks each table from QR scan through payment and keeps staff informed
//! when guests stall, stay long or a table waits too long for cleaning.
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── core/        # configuration, shared state, background tasks
//! ├── db/          # embedded SurrealDB: models and repositories
//! ├── sessions/    # domain core: scans, OTP, lifecycle, timers, cleaning
//! ├── jobs/        # poll jobs and the periodic scheduler
//! ├── notify/      # staff notification events and the in-process hub
//! ├── api/         # HTTP routes and handlers
//! └── utils/       # errors, logging, time helpers
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod jobs;
pub mod notify;
pub mod sessions;
pub mod utils;

// Re-export the types nearly every consumer needs
pub use core::{Config, ServerState};
pub use utils::{AppError, AppResult};
pub use utils::logger::{init_logger, init_logger_with_file};
