//! Repository Module
//!
//! CRUD and selection queries over the SurrealDB tables, one repository per
//! table. Record-link fields (restaurant/table/session) are stored as
//! "table:id" strings, so queries bind `RecordId::to_string()` values.

// Tenancy
pub mod restaurant;

// Floor
pub mod dining_table;

// Session lifecycle
pub mod guest_count_history;
pub mod table_session;

// Funnel trail
pub mod qr_scan_event;

// OTP
pub mod otp_history;

// Alerting
pub mod session_alert;

// Cleaning
pub mod cleaning_record;

// Configuration
pub mod timer_settings;

// Order read-model
pub mod session_order;

// Re-exports
pub use cleaning_record::CleaningRecordRepository;
pub use dining_table::DiningTableRepository;
pub use guest_count_history::GuestCountHistoryRepository;
pub use otp_history::OtpHistoryRepository;
pub use qr_scan_event::QrScanEventRepository;
pub use restaurant::RestaurantRepository;
pub use session_alert::SessionAlertRepository;
pub use session_order::SessionOrderRepository;
pub use table_session::TableSessionRepository;
pub use timer_settings::TimerSettingsRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }

    /// Parse a "table:id" string into a RecordId
    pub fn parse_id(&self, id: &str) -> RepoResult<surrealdb::RecordId> {
        id.parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))
    }
}
