//! QR Scan Event Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::QrScanEvent;
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "qr_scan_event";

#[derive(Clone)]
pub struct QrScanEventRepository {
    base: BaseRepository,
}

impl QrScanEventRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Insert a scan attempt. Duplicate scans are expected and all recorded.
    pub async fn create(
        &self,
        restaurant: RecordId,
        table: RecordId,
        fingerprint: Option<String>,
        ip: Option<String>,
        now: i64,
    ) -> RepoResult<QrScanEvent> {
        let event = QrScanEvent {
            id: None,
            restaurant,
            table,
            fingerprint,
            ip,
            scanned_at: now,
            otp_entered: false,
            otp_entered_at: None,
            otp_attempts: 0,
            order_placed: false,
            order_placed_at: None,
            otp_help_notified_at: None,
            browse_help_notified_at: None,
            session: None,
        };
        let created: Option<QrScanEvent> = self.base.db().create(TABLE).content(event).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create scan event".to_string()))
    }

    /// Find scan event by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<QrScanEvent>> {
        let thing = self.base.parse_id(id)?;
        let event: Option<QrScanEvent> = self.base.db().select(thing).await?;
        Ok(event)
    }

    pub async fn require(&self, id: &str) -> RepoResult<QrScanEvent> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Scan event {} not found", id)))
    }

    /// Unconsumed (OTP not yet entered) scans for a table since `cutoff`,
    /// newest first. The service applies fingerprint/IP preference on top.
    pub async fn find_recent_unconsumed(
        &self,
        table: &str,
        cutoff: i64,
    ) -> RepoResult<Vec<QrScanEvent>> {
        let events: Vec<QrScanEvent> = self
            .base
            .db()
            .query(
                "SELECT * FROM qr_scan_event WHERE dining_table = $table \
                 AND otp_entered = false AND scanned_at >= $cutoff \
                 ORDER BY scanned_at DESC",
            )
            .bind(("table", table.to_string()))
            .bind(("cutoff", cutoff))
            .await?
            .take(0)?;
        Ok(events)
    }

    /// Successful OTP entry: close the window and count the attempt
    pub async fn mark_otp_success(&self, id: &str, now: i64) -> RepoResult<QrScanEvent> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query(
                "UPDATE $thing SET otp_entered = true, otp_entered_at = $now, \
                 otp_attempts += 1",
            )
            .bind(("thing", thing))
            .bind(("now", now))
            .await?;
        self.require(id).await
    }

    /// Failed OTP entry: count the attempt, leave the window open for retry
    pub async fn record_failed_attempt(&self, id: &str) -> RepoResult<QrScanEvent> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET otp_attempts += 1")
            .bind(("thing", thing))
            .await?;
        self.require(id).await
    }

    /// One-way flag, safe to re-apply
    pub async fn mark_order_placed(&self, id: &str, now: i64) -> RepoResult<QrScanEvent> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET order_placed = true, order_placed_at = $now")
            .bind(("thing", thing))
            .bind(("now", now))
            .await?;
        self.require(id).await
    }

    pub async fn mark_otp_help_notified(&self, id: &str, now: i64) -> RepoResult<()> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET otp_help_notified_at = $now")
            .bind(("thing", thing))
            .bind(("now", now))
            .await?;
        Ok(())
    }

    pub async fn mark_browse_help_notified(&self, id: &str, now: i64) -> RepoResult<()> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET browse_help_notified_at = $now")
            .bind(("thing", thing))
            .bind(("now", now))
            .await?;
        Ok(())
    }

    /// Back-link the scan to the session that consumed it
    pub async fn link_session(&self, id: &str, session: &str) -> RepoResult<()> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET session = $session")
            .bind(("thing", thing))
            .bind(("session", session.to_string()))
            .await?;
        Ok(())
    }

    /// Scans consumed by a session, oldest first (timeline reconstruction)
    pub async fn find_by_session(&self, session: &str) -> RepoResult<Vec<QrScanEvent>> {
        let events: Vec<QrScanEvent> = self
            .base
            .db()
            .query(
                "SELECT * FROM qr_scan_event WHERE session = $session ORDER BY scanned_at",
            )
            .bind(("session", session.to_string()))
            .await?
            .take(0)?;
        Ok(events)
    }

    /// Scanned before `cutoff`, OTP never entered, not yet nudged
    pub async fn find_pending_otp_help(
        &self,
        restaurant: &str,
        cutoff: i64,
    ) -> RepoResult<Vec<QrScanEvent>> {
        let events: Vec<QrScanEvent> = self
            .base
            .db()
            .query(
                "SELECT * FROM qr_scan_event WHERE restaurant = $restaurant \
                 AND otp_entered = false AND scanned_at <= $cutoff \
                 AND otp_help_notified_at IS NONE",
            )
            .bind(("restaurant", restaurant.to_string()))
            .bind(("cutoff", cutoff))
            .await?
            .take(0)?;
        Ok(events)
    }

    /// OTP entered before `cutoff` but still browsing with no order, not yet
    /// nudged
    pub async fn find_pending_browse_help(
        &self,
        restaurant: &str,
        cutoff: i64,
    ) -> RepoResult<Vec<QrScanEvent>> {
        let events: Vec<QrScanEvent> = self
            .base
            .db()
            .query(
                "SELECT * FROM qr_scan_event WHERE restaurant = $restaurant \
                 AND otp_entered = true AND order_placed = false \
                 AND otp_entered_at IS NOT NONE AND otp_entered_at <= $cutoff \
                 AND browse_help_notified_at IS NONE",
            )
            .bind(("restaurant", restaurant.to_string()))
            .bind(("cutoff", cutoff))
            .await?
            .take(0)?;
        Ok(events)
    }
}
