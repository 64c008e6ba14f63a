//! Staff notification events
//!
//! Typed events broadcast to staff dashboards. The transport is the
//! in-process [`NotificationHub`]; services and jobs only ever see the
//! [`Notifier`] trait, so a brokered implementation can replace the hub when
//! the platform scales past one process.

pub mod hub;

pub use hub::NotificationHub;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::models::{AlertPriority, StaffRole};

/// What happened
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    // Session lifecycle
    SessionStarted,
    SessionEnded,
    GuestCountChanged,
    OtpRotated,
    // Floor state
    BillRequested,
    NeedsAttention,
    CleaningStarted,
    TableCleaned,
    // Timer alerts
    OtpHelp,
    OrderHelp,
    LongStayWarning,
    LongStayCritical,
    CleaningDelay,
    // Alert lifecycle
    AlertAcknowledged,
    AlertResolved,
}

/// One staff-facing notification
///
/// Record references travel as "table:id" strings so the payload serializes
/// straight onto the SSE stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub restaurant: String,
    pub event: NotificationEvent,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    /// Empty means every role
    #[serde(default)]
    pub target_roles: Vec<StaffRole>,
    #[serde(default)]
    pub priority: AlertPriority,
    pub sent_at: i64,
}

/// Notification sink used by services and jobs
///
/// Fire-and-forget: delivery is best-effort and never blocks business logic.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification);
}

/// Notifier that drops everything (tests, headless tools)
#[derive(Debug, Default, Clone)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send(&self, _notification: Notification) {}
}

/// Notifier that records everything it is handed (test assertions)
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: std::sync::Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) {
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .push(notification);
    }
}
