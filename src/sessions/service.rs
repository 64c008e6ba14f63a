//! Session lifecycle orchestration
//!
//! Ties the trackers, OTP service, alerts and cleaning cycles together into
//! the guest-visible flow: scan, seat, order, dine, pay, leave. Each public
//! method is one API-facing operation; invariants that span tables
//! (OTP rotation before the table is re-exposed, alert sweep on end) live
//! here and nowhere else.

use std::sync::Arc;

use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{
    AlertPriority, AlertType, CleaningRecord, SessionAlert, SessionPhase, SessionStatus,
    StaffRole, TableSession, TableSessionCreate, TableStatus,
};
use crate::db::repository::{
    DiningTableRepository, GuestCountHistoryRepository, SessionOrderRepository,
    TableSessionRepository,
};
use crate::notify::{Notification, NotificationEvent, Notifier};
use crate::sessions::assistance::{AssistanceTimerService, CreateAlert};
use crate::sessions::cleaning::CleaningService;
use crate::sessions::duration::{self, PhaseTimestamps, StayClassification};
use crate::sessions::otp::{OtpService, OtpVerification};
use crate::sessions::qr_scan::QrScanTracker;
use crate::utils::{AppError, AppResult, time};

/// Result of an OTP verification attempt against a table
#[derive(Debug, Clone, Serialize)]
pub struct OtpSeating {
    pub verification: OtpVerification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<TableSession>,
}

/// Everything `end_session_and_rotate_otp` produced
#[derive(Debug, Clone, Serialize)]
pub struct SessionEndOutcome {
    pub session: TableSession,
    pub cleaning_record: CleaningRecord,
    pub new_otp: String,
    pub resolved_alerts: usize,
}

/// One reconstructed timeline event
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimelineEntry {
    pub at: i64,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Named phase deltas of one session; `None` where a pair is incomplete
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session: String,
    pub phase: SessionPhase,
    pub status: SessionStatus,
    pub guest_count: i32,
    pub seated_to_first_order_minutes: Option<i64>,
    pub order_to_first_food_minutes: Option<i64>,
    pub dining_minutes: Option<i64>,
    pub bill_to_payment_minutes: Option<i64>,
    pub total_minutes: Option<i64>,
    pub stay: StayClassification,
}

/// The session lifecycle orchestrator
#[derive(Clone)]
pub struct SessionService {
    db: Surreal<Db>,
    notifier: Arc<dyn Notifier>,
}

impl SessionService {
    pub fn new(db: Surreal<Db>, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    fn sessions(&self) -> TableSessionRepository {
        TableSessionRepository::new(self.db.clone())
    }

    fn tables(&self) -> DiningTableRepository {
        DiningTableRepository::new(self.db.clone())
    }

    fn scans(&self) -> QrScanTracker {
        QrScanTracker::new(self.db.clone())
    }

    fn otp(&self) -> OtpService {
        OtpService::new(self.db.clone())
    }

    fn assistance(&self) -> AssistanceTimerService {
        AssistanceTimerService::new(self.db.clone())
    }

    fn cleaning(&self) -> CleaningService {
        CleaningService::new(self.db.clone())
    }

    async fn broadcast(
        &self,
        restaurant: String,
        table: Option<String>,
        session: Option<String>,
        event: NotificationEvent,
        title: &str,
        message: String,
        target_roles: Vec<StaffRole>,
        priority: AlertPriority,
    ) {
        self.notifier
            .send(Notification {
                restaurant,
                event,
                title: title.to_string(),
                message,
                table,
                session,
                target_roles,
                priority,
                sent_at: time::now_millis(),
            })
            .await;
    }

    async fn notify(
        &self,
        session: &TableSession,
        event: NotificationEvent,
        title: &str,
        message: String,
        target_roles: Vec<StaffRole>,
        priority: AlertPriority,
    ) {
        self.broadcast(
            session.restaurant.to_string(),
            Some(session.table.to_string()),
            session.id.as_ref().map(|id| id.to_string()),
            event,
            title,
            message,
            target_roles,
            priority,
        )
        .await;
    }

    /// Bump the phase, never backwards. Stamp replays keep the later phase.
    async fn advance_phase(
        &self,
        session: TableSession,
        target: SessionPhase,
    ) -> AppResult<TableSession> {
        if session.phase >= target {
            return Ok(session);
        }
        let id = Self::id_of(&session)?;
        Ok(self.sessions().set_phase(&id, target).await?)
    }

    fn id_of(session: &TableSession) -> AppResult<String> {
        session
            .id
            .as_ref()
            .map(|id| id.to_string())
            .ok_or_else(|| AppError::internal("Session record without id".to_string()))
    }

    /// Guest-facing mutations only apply to ACTIVE sessions
    async fn require_active(&self, session_id: &str) -> AppResult<TableSession> {
        let session = self.sessions().require(session_id).await?;
        if session.status != SessionStatus::Active {
            return Err(AppError::business_rule(format!(
                "Session {session_id} is not active"
            )));
        }
        Ok(session)
    }

    /// Open a session on a table, or return the one already running.
    /// A duplicate scan must never open a second concurrent session, so the
    /// bootstrap is idempotent per table.
    pub async fn start_session(
        &self,
        restaurant: &str,
        table: &str,
        guest_count: i32,
        scan_event: Option<&str>,
    ) -> AppResult<TableSession> {
        if let Some(existing) = self.sessions().find_active_for_table(table).await? {
            if let Some(scan) = scan_event {
                self.scans().link_session(scan, &Self::id_of(&existing)?).await?;
            }
            return Ok(existing);
        }

        let restaurant_id = restaurant
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid restaurant ID: {restaurant}")))?;
        let table_id = table
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid table ID: {table}")))?;
        let session = self
            .sessions()
            .create(TableSessionCreate {
                restaurant: restaurant_id,
                table: table_id,
                guest_count,
                qr_scanned_at: Some(time::now_millis()),
            })
            .await?;

        if let Some(scan) = scan_event {
            self.scans().link_session(scan, &Self::id_of(&session)?).await?;
        }
        self.tables().set_status(table, TableStatus::Occupied).await?;

        self.notify(
            &session,
            NotificationEvent::SessionStarted,
            "Session started",
            format!("New session opened on table {}", session.table),
            Vec::new(),
            AlertPriority::Normal,
        )
        .await;
        Ok(session)
    }

    /// Verify the table code and seat the guests on success. Guest mistakes
    /// come back as a verification value; only infrastructure fails the call.
    pub async fn verify_otp_and_seat(
        &self,
        restaurant: &str,
        table: &str,
        code: &str,
        scan_event: Option<&str>,
    ) -> AppResult<OtpSeating> {
        let verification = self.otp().verify(table, code).await?;
        if !verification.is_valid() {
            if let Some(scan) = scan_event {
                self.scans().mark_otp_entered(scan, false).await?;
            }
            return Ok(OtpSeating {
                verification,
                session: None,
            });
        }

        let session = self
            .start_session(restaurant, table, 0, scan_event)
            .await?;
        let id = Self::id_of(&session)?;
        let session = self.sessions().mark_seated(&id, time::now_millis()).await?;
        let session = self.advance_phase(session, SessionPhase::Seated).await?;

        if let Some(scan) = scan_event {
            self.scans().mark_otp_entered(scan, true).await?;
        }

        Ok(OtpSeating {
            verification,
            session: Some(session),
        })
    }

    /// First order placed: stamp, close the scan funnel, move to ORDERING
    pub async fn record_first_order(&self, session_id: &str) -> AppResult<TableSession> {
        let session = self
            .sessions()
            .stamp_first_order(session_id, time::now_millis())
            .await?;

        // The party has ordered, so their scans leave the browse-nudge pool
        for scan in self.scans().find_by_session(session_id).await? {
            if let Some(id) = scan.id.as_ref() {
                self.scans().mark_order_placed(&id.to_string()).await?;
            }
        }

        self.advance_phase(session, SessionPhase::Ordering).await
    }

    /// First dish served: stamp and move to DINING
    pub async fn record_first_food_served(&self, session_id: &str) -> AppResult<TableSession> {
        let session = self
            .sessions()
            .stamp_first_food_served(session_id, time::now_millis())
            .await?;
        self.advance_phase(session, SessionPhase::Dining).await
    }

    /// Guest asked for the bill: phase, table status, alert, broadcast
    pub async fn request_bill(&self, session_id: &str) -> AppResult<TableSession> {
        self.require_active(session_id).await?;
        let session = self
            .sessions()
            .stamp_bill_requested(session_id, time::now_millis())
            .await?;
        let session = self
            .advance_phase(session, SessionPhase::BillRequested)
            .await?;
        self.tables()
            .set_status(&session.table.to_string(), TableStatus::BillRequested)
            .await?;

        self.assistance()
            .create_alert(CreateAlert {
                restaurant: session.restaurant.to_string(),
                session: Some(Self::id_of(&session)?),
                table: session.table.to_string(),
                alert_type: AlertType::BillRequested,
                message: format!("Table {} asked for the bill", session.table),
                target_roles: Some(vec![StaffRole::Waiter, StaffRole::Cashier]),
                priority: None,
            })
            .await?;
        self.notify(
            &session,
            NotificationEvent::BillRequested,
            "Bill requested",
            format!("Table {} asked for the bill", session.table),
            vec![StaffRole::Waiter, StaffRole::Cashier],
            AlertPriority::Normal,
        )
        .await;
        Ok(session)
    }

    /// Guest pressed the call-waiter button
    pub async fn request_assistance(
        &self,
        session_id: &str,
        message: Option<String>,
    ) -> AppResult<TableSession> {
        self.require_active(session_id).await?;
        let session = self
            .sessions()
            .stamp_waiter_notified(session_id, time::now_millis())
            .await?;
        self.tables()
            .set_status(&session.table.to_string(), TableStatus::NeedsAttention)
            .await?;

        let message =
            message.unwrap_or_else(|| format!("Table {} requested assistance", session.table));
        self.assistance()
            .create_alert(CreateAlert {
                restaurant: session.restaurant.to_string(),
                session: Some(Self::id_of(&session)?),
                table: session.table.to_string(),
                alert_type: AlertType::NeedsAttention,
                message: message.clone(),
                target_roles: Some(vec![StaffRole::Waiter]),
                priority: None,
            })
            .await?;
        self.notify(
            &session,
            NotificationEvent::NeedsAttention,
            "Assistance requested",
            message,
            vec![StaffRole::Waiter],
            AlertPriority::Normal,
        )
        .await;
        Ok(session)
    }

    /// Close out a session: complete it, rotate the table code, open the
    /// cleaning cycle and sweep its alerts. The status check runs before any
    /// side effect, so ending a non-ACTIVE session changes nothing.
    pub async fn end_session_and_rotate_otp(
        &self,
        session_id: &str,
        ended_by: Option<String>,
        reason: Option<String>,
    ) -> AppResult<SessionEndOutcome> {
        self.require_active(session_id).await?;

        let session = self
            .sessions()
            .complete(session_id, time::now_millis(), ended_by, reason)
            .await?;
        let table = session.table.to_string();

        let (_, new_otp) = self.otp().rotate_after_session(&table, session_id).await?;
        self.notify(
            &session,
            NotificationEvent::OtpRotated,
            "Table code rotated",
            format!("Table {table} has a fresh access code"),
            Vec::new(),
            AlertPriority::Normal,
        )
        .await;

        let cleaning_record = self
            .cleaning()
            .start_cleaning(&session.restaurant.to_string(), &table, Some(session_id))
            .await?;
        self.notify(
            &session,
            NotificationEvent::CleaningStarted,
            "Cleaning started",
            format!("Table {table} is waiting to be cleaned"),
            Vec::new(),
            AlertPriority::Normal,
        )
        .await;

        let resolved_alerts = self
            .assistance()
            .resolve_alerts_for_session(session_id, "Session ended")
            .await?;

        self.notify(
            &session,
            NotificationEvent::SessionEnded,
            "Session ended",
            format!("Table {table} is now being cleaned"),
            Vec::new(),
            AlertPriority::Normal,
        )
        .await;

        Ok(SessionEndOutcome {
            session,
            cleaning_record,
            new_otp,
            resolved_alerts,
        })
    }

    /// Change the party size, keeping the audit trail
    pub async fn update_guest_count(
        &self,
        session_id: &str,
        new_count: i32,
        reason: Option<String>,
        changed_by: Option<String>,
    ) -> AppResult<TableSession> {
        let current = self.require_active(session_id).await?;
        let previous = current.guest_count;
        let session = self.sessions().set_guest_count(session_id, new_count).await?;

        GuestCountHistoryRepository::new(self.db.clone())
            .append(
                session.restaurant.clone(),
                session.id.clone().ok_or_else(|| {
                    AppError::internal("Session record without id".to_string())
                })?,
                previous,
                new_count,
                reason,
                changed_by,
                time::now_millis(),
            )
            .await?;

        self.notify(
            &session,
            NotificationEvent::GuestCountChanged,
            "Guest count changed",
            format!("Table {}: {previous} -> {new_count} guests", session.table),
            Vec::new(),
            AlertPriority::Normal,
        )
        .await;
        Ok(session)
    }

    /// All ACTIVE sessions of a restaurant
    pub async fn active_sessions(&self, restaurant: &str) -> AppResult<Vec<TableSession>> {
        Ok(self.sessions().find_active(restaurant).await?)
    }

    /// Close the open cleaning cycle on a table (fail-open when there is
    /// none) and tell the floor the table is back
    pub async fn mark_table_cleaned(
        &self,
        table_id: &str,
        cleaned_by: Option<String>,
    ) -> AppResult<Option<CleaningRecord>> {
        let record = self.cleaning().mark_table_cleaned(table_id, cleaned_by).await?;
        let table = self.tables().require(table_id).await?;
        self.broadcast(
            table.restaurant.to_string(),
            Some(table_id.to_string()),
            record
                .as_ref()
                .and_then(|r| r.session.as_ref().map(|s| s.to_string())),
            NotificationEvent::TableCleaned,
            "Table cleaned",
            format!("Table {table_id} is available again"),
            Vec::new(),
            AlertPriority::Normal,
        )
        .await;
        Ok(record)
    }

    pub async fn acknowledge_alert(
        &self,
        alert_id: &str,
        by: Option<String>,
    ) -> AppResult<SessionAlert> {
        let alert = self.assistance().acknowledge_alert(alert_id, by).await?;
        self.broadcast(
            alert.restaurant.to_string(),
            Some(alert.table.to_string()),
            alert.session.as_ref().map(|s| s.to_string()),
            NotificationEvent::AlertAcknowledged,
            "Alert acknowledged",
            alert.message.clone(),
            alert.target_roles.clone(),
            alert.priority,
        )
        .await;
        Ok(alert)
    }

    /// Resolve directly; acknowledgment is not a prerequisite
    pub async fn resolve_alert(
        &self,
        alert_id: &str,
        by: Option<String>,
        note: Option<String>,
    ) -> AppResult<SessionAlert> {
        let alert = self.assistance().resolve_alert(alert_id, by, note).await?;
        self.broadcast(
            alert.restaurant.to_string(),
            Some(alert.table.to_string()),
            alert.session.as_ref().map(|s| s.to_string()),
            NotificationEvent::AlertResolved,
            "Alert resolved",
            alert.message.clone(),
            alert.target_roles.clone(),
            alert.priority,
        )
        .await;
        Ok(alert)
    }

    /// Chronological reconstruction of everything that happened in a
    /// session. Pure merge of stored records; absent timestamps produce no
    /// entry.
    pub async fn session_timeline(&self, session_id: &str) -> AppResult<Vec<TimelineEntry>> {
        let session = self.sessions().require(session_id).await?;
        let mut entries: Vec<TimelineEntry> = Vec::new();
        let mut push = |at: Option<i64>, event: &str, detail: Option<String>| {
            if let Some(at) = at {
                entries.push(TimelineEntry {
                    at,
                    event: event.to_string(),
                    detail,
                });
            }
        };

        let scans = self.scans().find_by_session(session_id).await?;
        if scans.is_empty() {
            push(session.qr_scanned_at, "qr_scanned", None);
        }
        for scan in &scans {
            push(Some(scan.scanned_at), "qr_scanned", scan.fingerprint.clone());
            push(
                scan.otp_entered_at,
                "otp_entered",
                Some(format!("{} attempt(s)", scan.otp_attempts)),
            );
        }

        push(session.seated_at, "seated", None);
        push(session.waiter_notified_at, "assistance_requested", None);

        for change in GuestCountHistoryRepository::new(self.db.clone())
            .find_by_session(session_id)
            .await?
        {
            push(
                Some(change.changed_at),
                "guest_count_changed",
                Some(format!("{} -> {}", change.previous_count, change.new_count)),
            );
        }

        for order in SessionOrderRepository::new(self.db.clone())
            .find_by_session(session_id)
            .await?
        {
            let detail = order
                .order_number
                .clone()
                .unwrap_or_else(|| format!("{} item(s)", order.items.len()));
            push(Some(order.placed_at), "order_placed", Some(detail));
            for item in &order.items {
                push(item.preparing_at, "item_preparing", Some(item.name.clone()));
                push(item.ready_at, "item_ready", Some(item.name.clone()));
                push(item.served_at, "item_served", Some(item.name.clone()));
            }
        }

        push(session.first_food_served_at, "first_food_served", None);
        push(session.bill_requested_at, "bill_requested", None);
        push(session.payment_completed_at, "payment_completed", None);
        push(
            session.ended_at,
            "session_ended",
            session.end_reason.clone(),
        );

        for record in self.cleaning().records_for_session(session_id).await? {
            push(Some(record.requested_at), "cleaning_started", None);
            push(record.cleaned_at, "table_cleaned", record.cleaned_by.clone());
        }

        entries.sort_by_key(|e| e.at);
        Ok(entries)
    }

    /// Named phase deltas; `None` wherever a pair is incomplete
    pub async fn session_summary(&self, session_id: &str) -> AppResult<SessionSummary> {
        let session = self.sessions().require(session_id).await?;
        let delta = |from: Option<i64>, to: Option<i64>| match (from, to) {
            (Some(from), Some(to)) => Some(time::elapsed_minutes(from, to)),
            _ => None,
        };

        let stay_minutes = match (session.seated_at, session.ended_at) {
            (Some(seated), Some(ended)) => time::elapsed_minutes(seated, ended),
            (Some(seated), None) => time::elapsed_minutes(seated, time::now_millis()),
            _ => 0,
        };

        let phase = duration::determine_session_phase(&PhaseTimestamps {
            otp_verified: session.otp_verified,
            first_order_at: session.first_order_at,
            first_food_served_at: session.first_food_served_at,
            bill_requested_at: session.bill_requested_at,
            payment_completed_at: session.payment_completed_at,
        });

        Ok(SessionSummary {
            session: Self::id_of(&session)?,
            phase,
            status: session.status,
            guest_count: session.guest_count,
            seated_to_first_order_minutes: delta(session.seated_at, session.first_order_at),
            order_to_first_food_minutes: delta(session.first_order_at, session.first_food_served_at),
            dining_minutes: delta(session.first_food_served_at, session.bill_requested_at),
            bill_to_payment_minutes: delta(session.bill_requested_at, session.payment_completed_at),
            total_minutes: delta(session.seated_at, session.ended_at),
            stay: duration::classify(stay_minutes.max(0) as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::sessions::test_support::{backdate, fixtures};

    fn service(fx: &crate::sessions::test_support::Fixtures) -> (SessionService, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        (
            SessionService::new(fx.db.clone(), notifier.clone()),
            notifier,
        )
    }

    #[tokio::test]
    async fn scan_to_payment_walks_the_phases_forward() {
        let fx = fixtures().await;
        let (service, notifier) = service(&fx);
        let tables = DiningTableRepository::new(fx.db.clone());

        let (_, otp) = OtpService::new(fx.db.clone())
            .regenerate_manual(&fx.table_id, None)
            .await
            .unwrap();

        let seating = service
            .verify_otp_and_seat(&fx.restaurant_id, &fx.table_id, &otp, None)
            .await
            .unwrap();
        let session = seating.session.unwrap();
        assert_eq!(session.phase, SessionPhase::Seated);
        assert!(session.otp_verified);
        assert_eq!(
            tables.require(&fx.table_id).await.unwrap().status,
            TableStatus::Occupied
        );

        let id = session.id.unwrap().to_string();
        let session = service.record_first_order(&id).await.unwrap();
        assert_eq!(session.phase, SessionPhase::Ordering);
        let session = service.record_first_food_served(&id).await.unwrap();
        assert_eq!(session.phase, SessionPhase::Dining);
        let session = service.request_bill(&id).await.unwrap();
        assert_eq!(session.phase, SessionPhase::BillRequested);
        assert_eq!(
            tables.require(&fx.table_id).await.unwrap().status,
            TableStatus::BillRequested
        );

        let outcome = service
            .end_session_and_rotate_otp(&id, Some("cashier-1".into()), None)
            .await
            .unwrap();
        assert_eq!(outcome.session.status, SessionStatus::Completed);
        assert_eq!(outcome.session.phase, SessionPhase::Completed);
        assert_ne!(outcome.new_otp, otp);
        assert!(outcome.cleaning_record.cleaned_at.is_none());
        assert_eq!(
            tables.require(&fx.table_id).await.unwrap().status,
            TableStatus::Cleaning
        );

        let events: Vec<_> = notifier.sent().iter().map(|n| n.event).collect();
        assert!(events.contains(&NotificationEvent::SessionStarted));
        assert!(events.contains(&NotificationEvent::BillRequested));
        assert!(events.contains(&NotificationEvent::OtpRotated));
        assert!(events.contains(&NotificationEvent::CleaningStarted));
        assert!(events.contains(&NotificationEvent::SessionEnded));
    }

    #[tokio::test]
    async fn first_order_closes_the_scan_funnel() {
        let fx = fixtures().await;
        let (service, _) = service(&fx);
        let tracker = QrScanTracker::new(fx.db.clone());

        let (_, otp) = OtpService::new(fx.db.clone())
            .regenerate_manual(&fx.table_id, None)
            .await
            .unwrap();
        let scan = tracker
            .record_scan(&fx.restaurant_id, &fx.table_id, None, None)
            .await
            .unwrap();
        let scan_id = scan.id.unwrap().to_string();

        let seating = service
            .verify_otp_and_seat(&fx.restaurant_id, &fx.table_id, &otp, Some(&scan_id))
            .await
            .unwrap();
        let session_id = seating.session.unwrap().id.unwrap().to_string();
        backdate(&fx.db, &scan_id, "otp_entered_at", 10).await;

        // Browsing too long: the nudge pool sees the scan
        assert_eq!(
            tracker
                .scans_pending_browse_help(&fx.restaurant_id, 5)
                .await
                .unwrap()
                .len(),
            1
        );

        service.record_first_order(&session_id).await.unwrap();

        let scans = tracker.find_by_session(&session_id).await.unwrap();
        assert_eq!(scans.len(), 1);
        assert!(scans[0].order_placed);
        assert!(
            tracker
                .scans_pending_browse_help(&fx.restaurant_id, 5)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn bill_and_assist_are_rejected_after_the_session_ends() {
        let fx = fixtures().await;
        let (service, _) = service(&fx);

        let session = service
            .start_session(&fx.restaurant_id, &fx.table_id, 2, None)
            .await
            .unwrap();
        let id = session.id.unwrap().to_string();
        service
            .end_session_and_rotate_otp(&id, None, None)
            .await
            .unwrap();

        let err = service.request_bill(&id).await;
        assert!(matches!(err, Err(AppError::BusinessRule(_))));
        let err = service.request_assistance(&id, None).await;
        assert!(matches!(err, Err(AppError::BusinessRule(_))));

        // No alert rows were recorded against the dead session
        let open = crate::db::repository::SessionAlertRepository::new(fx.db.clone())
            .find_open_for_session(&id)
            .await
            .unwrap();
        assert!(open.is_empty());
    }

    #[tokio::test]
    async fn alert_lifecycle_and_table_cleaning_are_broadcast() {
        let fx = fixtures().await;
        let (service, notifier) = service(&fx);

        let session = service
            .start_session(&fx.restaurant_id, &fx.table_id, 2, None)
            .await
            .unwrap();
        let session_id = session.id.unwrap().to_string();
        service
            .request_assistance(&session_id, None)
            .await
            .unwrap();
        let alert = crate::db::repository::SessionAlertRepository::new(fx.db.clone())
            .find_open_for_session(&session_id)
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        let alert_id = alert.id.unwrap().to_string();

        service
            .acknowledge_alert(&alert_id, Some("waiter-2".into()))
            .await
            .unwrap();
        service
            .resolve_alert(&alert_id, Some("waiter-2".into()), None)
            .await
            .unwrap();

        let outcome = service
            .end_session_and_rotate_otp(&session_id, None, None)
            .await
            .unwrap();
        assert_eq!(outcome.resolved_alerts, 0);
        service
            .mark_table_cleaned(&fx.table_id, Some("busser-1".into()))
            .await
            .unwrap();

        let events: Vec<_> = notifier.sent().iter().map(|n| n.event).collect();
        assert!(events.contains(&NotificationEvent::AlertAcknowledged));
        assert!(events.contains(&NotificationEvent::AlertResolved));
        assert!(events.contains(&NotificationEvent::TableCleaned));
    }

    #[tokio::test]
    async fn replayed_stamps_never_move_the_phase_backwards() {
        let fx = fixtures().await;
        let (service, _) = service(&fx);

        let session = service
            .start_session(&fx.restaurant_id, &fx.table_id, 2, None)
            .await
            .unwrap();
        let id = session.id.unwrap().to_string();
        service.record_first_order(&id).await.unwrap();
        let session = service.record_first_food_served(&id).await.unwrap();
        assert_eq!(session.phase, SessionPhase::Dining);

        // A late duplicate of the first-order webhook
        let session = service.record_first_order(&id).await.unwrap();
        assert_eq!(session.phase, SessionPhase::Dining);
    }

    #[tokio::test]
    async fn duplicate_scan_reuses_the_active_session() {
        let fx = fixtures().await;
        let (service, _) = service(&fx);

        let first = service
            .start_session(&fx.restaurant_id, &fx.table_id, 2, None)
            .await
            .unwrap();
        let second = service
            .start_session(&fx.restaurant_id, &fx.table_id, 4, None)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.guest_count, 2);
    }

    #[tokio::test]
    async fn ending_twice_fails_and_leaves_the_otp_alone() {
        let fx = fixtures().await;
        let (service, _) = service(&fx);
        let tables = DiningTableRepository::new(fx.db.clone());

        let session = service
            .start_session(&fx.restaurant_id, &fx.table_id, 2, None)
            .await
            .unwrap();
        let id = session.id.unwrap().to_string();
        let outcome = service
            .end_session_and_rotate_otp(&id, None, None)
            .await
            .unwrap();

        let otp_after_end = tables.require(&fx.table_id).await.unwrap().current_otp;
        assert_eq!(otp_after_end.as_deref(), Some(outcome.new_otp.as_str()));

        let err = service.end_session_and_rotate_otp(&id, None, None).await;
        assert!(matches!(err, Err(AppError::BusinessRule(_))));
        assert_eq!(
            tables.require(&fx.table_id).await.unwrap().current_otp,
            otp_after_end
        );
    }

    #[tokio::test]
    async fn invalid_otp_counts_the_attempt_and_opens_no_session() {
        let fx = fixtures().await;
        let (service, _) = service(&fx);

        OtpService::new(fx.db.clone())
            .regenerate_manual(&fx.table_id, None)
            .await
            .unwrap();
        let scan = QrScanTracker::new(fx.db.clone())
            .record_scan(&fx.restaurant_id, &fx.table_id, None, None)
            .await
            .unwrap();
        let scan_id = scan.id.unwrap().to_string();

        let seating = service
            .verify_otp_and_seat(&fx.restaurant_id, &fx.table_id, "no", Some(&scan_id))
            .await
            .unwrap();
        assert_eq!(seating.verification, OtpVerification::Invalid);
        assert!(seating.session.is_none());
        assert!(service.active_sessions(&fx.restaurant_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn guest_count_changes_are_audited() {
        let fx = fixtures().await;
        let (service, _) = service(&fx);

        let session = service
            .start_session(&fx.restaurant_id, &fx.table_id, 2, None)
            .await
            .unwrap();
        let id = session.id.unwrap().to_string();
        let session = service
            .update_guest_count(&id, 4, Some("two more joined".into()), Some("waiter-1".into()))
            .await
            .unwrap();
        assert_eq!(session.guest_count, 4);

        let history = GuestCountHistoryRepository::new(fx.db.clone())
            .find_by_session(&id)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].previous_count, 2);
        assert_eq!(history[0].new_count, 4);
    }

    #[tokio::test]
    async fn timeline_is_chronological_and_skips_missing_stamps() {
        let fx = fixtures().await;
        let (service, _) = service(&fx);

        let session = service
            .start_session(&fx.restaurant_id, &fx.table_id, 2, None)
            .await
            .unwrap();
        let id = session.id.unwrap().to_string();
        backdate(&fx.db, &id, "qr_scanned_at", 40).await;
        TableSessionRepository::new(fx.db.clone())
            .mark_seated(&id, crate::utils::time::now_millis())
            .await
            .unwrap();
        backdate(&fx.db, &id, "seated_at", 35).await;

        let now = crate::utils::time::now_millis();
        SessionOrderRepository::new(fx.db.clone())
            .create(
                fx.restaurant_id.parse().unwrap(),
                id.parse().unwrap(),
                Some("A-17".into()),
                crate::utils::time::minutes_ago(30, now),
                vec![crate::db::models::SessionOrderItem {
                    name: "Dal makhani".into(),
                    quantity: 1,
                    preparing_at: None,
                    ready_at: None,
                    served_at: Some(crate::utils::time::minutes_ago(20, now)),
                }],
            )
            .await
            .unwrap();

        let timeline = service.session_timeline(&id).await.unwrap();
        let events: Vec<&str> = timeline.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(
            events,
            vec!["qr_scanned", "seated", "order_placed", "item_served"]
        );
        assert!(timeline.windows(2).all(|w| w[0].at <= w[1].at));
    }

    #[tokio::test]
    async fn summary_reports_deltas_and_none_for_open_pairs() {
        let fx = fixtures().await;
        let (service, _) = service(&fx);

        let session = service
            .start_session(&fx.restaurant_id, &fx.table_id, 3, None)
            .await
            .unwrap();
        let id = session.id.unwrap().to_string();
        TableSessionRepository::new(fx.db.clone())
            .mark_seated(&id, crate::utils::time::now_millis())
            .await
            .unwrap();
        service.record_first_order(&id).await.unwrap();
        backdate(&fx.db, &id, "seated_at", 12).await;

        let summary = service.session_summary(&id).await.unwrap();
        assert_eq!(summary.guest_count, 3);
        assert_eq!(summary.seated_to_first_order_minutes, Some(12));
        assert_eq!(summary.order_to_first_food_minutes, None);
        assert_eq!(summary.total_minutes, None);
        assert_eq!(summary.phase, SessionPhase::Ordering);
    }
}
