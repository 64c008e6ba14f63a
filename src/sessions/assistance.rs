//! Assistance timer service - the stalled-session detector
//!
//! Finds sessions that crossed a help threshold without progress and owns
//! the alert records raised for them. Per session and alert type the
//! lifecycle is NONE → ACTIVE → (ACKNOWLEDGED) → RESOLVED; the NONE→ACTIVE
//! edge is gated on a dedupe marker so one stall raises one alert.
//!
//! The check/mark pair is deliberately not atomic: callers mark after a
//! successful notify, and a crash in between surfaces the same candidate on
//! the next poll (at-least-once).

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{
    AlertPriority, AlertStatus, AlertType, SessionAlert, StaffRole, TableSession, TimerSettings,
};
use crate::db::repository::{SessionAlertRepository, TableSessionRepository, TimerSettingsRepository};
use crate::utils::{AppError, AppResult, time};

/// Parameters for raising one alert
#[derive(Debug, Clone)]
pub struct CreateAlert {
    pub restaurant: String,
    pub session: Option<String>,
    pub table: String,
    pub alert_type: AlertType,
    pub message: String,
    /// Defaults to [Waiter, Manager]
    pub target_roles: Option<Vec<StaffRole>>,
    /// Defaults to normal
    pub priority: Option<AlertPriority>,
}

/// Stalled-session detection and alert CRUD
#[derive(Clone)]
pub struct AssistanceTimerService {
    db: Surreal<Db>,
}

impl AssistanceTimerService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    fn sessions(&self) -> TableSessionRepository {
        TableSessionRepository::new(self.db.clone())
    }

    fn alerts(&self) -> SessionAlertRepository {
        SessionAlertRepository::new(self.db.clone())
    }

    /// Restaurant thresholds, or the documented defaults when unset
    pub async fn timer_settings(&self, restaurant: &str) -> AppResult<TimerSettings> {
        let repo = TimerSettingsRepository::new(self.db.clone());
        if let Some(settings) = repo.find_for_restaurant(restaurant).await? {
            return Ok(settings);
        }
        let restaurant = restaurant
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid restaurant ID: {restaurant}")))?;
        Ok(TimerSettings::default_for(restaurant))
    }

    // ========================================================================
    // Detection queries
    // ========================================================================

    /// CREATED sessions stuck on the OTP screen past `threshold_minutes`
    pub async fn check_otp_help_needed(
        &self,
        restaurant: &str,
        threshold_minutes: i64,
    ) -> AppResult<Vec<TableSession>> {
        let cutoff = time::minutes_ago(threshold_minutes, time::now_millis());
        Ok(self.sessions().find_pending_otp_help(restaurant, cutoff).await?)
    }

    /// SEATED sessions with no first order past `threshold_minutes`
    pub async fn check_order_help_needed(
        &self,
        restaurant: &str,
        threshold_minutes: i64,
    ) -> AppResult<Vec<TableSession>> {
        let cutoff = time::minutes_ago(threshold_minutes, time::now_millis());
        Ok(self
            .sessions()
            .find_pending_order_help(restaurant, cutoff)
            .await?)
    }

    /// Sessions past the warning threshold with no long-stay alert yet
    pub async fn check_long_stay_warning_needed(
        &self,
        restaurant: &str,
        warning_minutes: i64,
    ) -> AppResult<Vec<TableSession>> {
        let cutoff = time::minutes_ago(warning_minutes, time::now_millis());
        Ok(self
            .sessions()
            .find_long_stay_warning(restaurant, cutoff)
            .await?)
    }

    /// Sessions past the critical threshold that have not escalated yet.
    /// A session already alerted at warning tier qualifies again here - the
    /// one intentional second alert per session.
    pub async fn check_long_stay_critical_needed(
        &self,
        restaurant: &str,
        critical_minutes: i64,
    ) -> AppResult<Vec<TableSession>> {
        let cutoff = time::minutes_ago(critical_minutes, time::now_millis());
        Ok(self
            .sessions()
            .find_long_stay_critical(restaurant, cutoff)
            .await?)
    }

    // ========================================================================
    // Dedupe markers (callers invoke these after a successful notify)
    // ========================================================================

    pub async fn mark_otp_help_notified(&self, session_id: &str) -> AppResult<()> {
        self.sessions()
            .mark_otp_help_notified(session_id, time::now_millis())
            .await?;
        Ok(())
    }

    pub async fn mark_order_help_notified(&self, session_id: &str) -> AppResult<()> {
        self.sessions()
            .mark_order_help_notified(session_id, time::now_millis())
            .await?;
        Ok(())
    }

    pub async fn mark_long_stay_warned(&self, session_id: &str) -> AppResult<()> {
        self.sessions()
            .mark_long_stay_warning(session_id, time::now_millis())
            .await?;
        Ok(())
    }

    pub async fn mark_long_stay_escalated(&self, session_id: &str) -> AppResult<()> {
        self.sessions()
            .mark_long_stay_critical(session_id, time::now_millis())
            .await?;
        Ok(())
    }

    // ========================================================================
    // Alert CRUD
    // ========================================================================

    /// Insert an ACTIVE alert with the default targeting unless overridden
    pub async fn create_alert(&self, params: CreateAlert) -> AppResult<SessionAlert> {
        let restaurant = params.restaurant.parse().map_err(|_| {
            AppError::validation(format!("Invalid restaurant ID: {}", params.restaurant))
        })?;
        let table = params
            .table
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid table ID: {}", params.table)))?;
        let session = match params.session {
            Some(s) => Some(
                s.parse()
                    .map_err(|_| AppError::validation(format!("Invalid session ID: {s}")))?,
            ),
            None => None,
        };

        let alert = SessionAlert {
            id: None,
            restaurant,
            session,
            table,
            alert_type: params.alert_type,
            status: AlertStatus::Active,
            message: params.message,
            target_roles: params
                .target_roles
                .unwrap_or_else(|| vec![StaffRole::Waiter, StaffRole::Manager]),
            priority: params.priority.unwrap_or_default(),
            created_at: time::now_millis(),
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
            resolved_by: None,
            resolution_note: None,
        };
        Ok(self.alerts().create(alert).await?)
    }

    pub async fn acknowledge_alert(
        &self,
        alert_id: &str,
        by: Option<String>,
    ) -> AppResult<SessionAlert> {
        Ok(self
            .alerts()
            .acknowledge(alert_id, by, time::now_millis())
            .await?)
    }

    /// Resolve directly; acknowledgment is not a prerequisite
    pub async fn resolve_alert(
        &self,
        alert_id: &str,
        by: Option<String>,
        note: Option<String>,
    ) -> AppResult<SessionAlert> {
        Ok(self
            .alerts()
            .resolve(alert_id, by, note, time::now_millis())
            .await?)
    }

    /// Sweep every open alert of a session, e.g. when the session ends
    pub async fn resolve_alerts_for_session(
        &self,
        session_id: &str,
        note: &str,
    ) -> AppResult<usize> {
        let open = self.alerts().find_open_for_session(session_id).await?;
        let mut resolved = 0;
        for alert in &open {
            let Some(id) = alert.id.as_ref() else {
                continue;
            };
            self.alerts()
                .resolve(
                    &id.to_string(),
                    None,
                    Some(note.to_string()),
                    time::now_millis(),
                )
                .await?;
            resolved += 1;
        }
        Ok(resolved)
    }

    /// Unresolved alerts of a restaurant
    pub async fn active_alerts(&self, restaurant: &str) -> AppResult<Vec<SessionAlert>> {
        Ok(self.alerts().find_unresolved(restaurant).await?)
    }
}
