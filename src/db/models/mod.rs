//! Database models
//!
//! Serde structs for every SurrealDB table. Enum variants are stored as
//! SCREAMING_SNAKE_CASE strings (statuses/phases) or snake_case strings
//! (alert types, reasons), matching what staff dashboards consume.

pub mod serde_helpers;

pub mod cleaning_record;
pub mod dining_table;
pub mod guest_count_history;
pub mod otp_history;
pub mod qr_scan_event;
pub mod restaurant;
pub mod session_alert;
pub mod session_order;
pub mod table_session;
pub mod timer_settings;

pub use cleaning_record::{ChecklistItem, CleaningRecord};
pub use dining_table::{DiningTable, DiningTableCreate, TableStatus};
pub use guest_count_history::GuestCountHistory;
pub use otp_history::{OtpHistory, OtpReason};
pub use qr_scan_event::QrScanEvent;
pub use restaurant::Restaurant;
pub use session_alert::{AlertPriority, AlertStatus, AlertType, SessionAlert, StaffRole};
pub use session_order::{SessionOrder, SessionOrderItem};
pub use table_session::{SessionPhase, SessionStatus, TableSession, TableSessionCreate};
pub use timer_settings::TimerSettings;
