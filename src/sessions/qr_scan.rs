//! QR scan tracker
//!
//! Records every physical scan attempt and its funnel flags (OTP entered,
//! order placed). This trail is deliberately looser than `table_session`:
//! a scan exists before a session does, and the two are only correlated
//! best-effort inside a time window.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::QrScanEvent;
use crate::db::repository::QrScanEventRepository;
use crate::utils::{AppError, AppResult, time};

/// How far back a scan can be matched to a retry from the same device
pub const CORRELATION_WINDOW_MINUTES: i64 = 30;

/// Scan funnel tracking service
#[derive(Clone)]
pub struct QrScanTracker {
    db: Surreal<Db>,
}

impl QrScanTracker {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    fn repo(&self) -> QrScanEventRepository {
        QrScanEventRepository::new(self.db.clone())
    }

    /// Record a scan attempt. Never fails on duplicates - every scan of the
    /// same table is its own event.
    pub async fn record_scan(
        &self,
        restaurant: &str,
        table: &str,
        fingerprint: Option<String>,
        ip: Option<String>,
    ) -> AppResult<QrScanEvent> {
        let restaurant = restaurant
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid restaurant ID: {restaurant}")))?;
        let table = table
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid table ID: {table}")))?;
        let event = self
            .repo()
            .create(restaurant, table, fingerprint, ip, time::now_millis())
            .await?;
        Ok(event)
    }

    /// Most recent unconsumed scan for a table inside the correlation
    /// window, preferring a fingerprint match, then an IP match, then the
    /// newest. Used to avoid opening a fresh event per OTP retry.
    pub async fn find_recent_scan_for_table(
        &self,
        table: &str,
        fingerprint: Option<&str>,
        ip: Option<&str>,
    ) -> AppResult<Option<QrScanEvent>> {
        let cutoff = time::minutes_ago(CORRELATION_WINDOW_MINUTES, time::now_millis());
        let candidates = self.repo().find_recent_unconsumed(table, cutoff).await?;
        if candidates.is_empty() {
            return Ok(None);
        }

        if let Some(fp) = fingerprint
            && let Some(event) = candidates
                .iter()
                .find(|e| e.fingerprint.as_deref() == Some(fp))
        {
            return Ok(Some(event.clone()));
        }
        if let Some(ip) = ip
            && let Some(event) = candidates.iter().find(|e| e.ip.as_deref() == Some(ip))
        {
            return Ok(Some(event.clone()));
        }
        Ok(candidates.into_iter().next())
    }

    /// Track an OTP entry against the scan. Success closes the correlation
    /// window; failure only counts the attempt so the guest can retry.
    pub async fn mark_otp_entered(&self, event_id: &str, success: bool) -> AppResult<QrScanEvent> {
        let event = if success {
            self.repo()
                .mark_otp_success(event_id, time::now_millis())
                .await?
        } else {
            self.repo().record_failed_attempt(event_id).await?
        };
        Ok(event)
    }

    /// One-way flag; re-applying is harmless
    pub async fn mark_order_placed(&self, event_id: &str) -> AppResult<QrScanEvent> {
        let event = self
            .repo()
            .mark_order_placed(event_id, time::now_millis())
            .await?;
        Ok(event)
    }

    pub async fn mark_otp_help_notified(&self, event_id: &str) -> AppResult<()> {
        self.repo()
            .mark_otp_help_notified(event_id, time::now_millis())
            .await?;
        Ok(())
    }

    pub async fn mark_browse_help_notified(&self, event_id: &str) -> AppResult<()> {
        self.repo()
            .mark_browse_help_notified(event_id, time::now_millis())
            .await?;
        Ok(())
    }

    /// Link the scan to the session that consumed it
    pub async fn link_session(&self, event_id: &str, session: &str) -> AppResult<()> {
        self.repo().link_session(event_id, session).await?;
        Ok(())
    }

    /// Scans consumed by a session, oldest first
    pub async fn find_by_session(&self, session: &str) -> AppResult<Vec<QrScanEvent>> {
        Ok(self.repo().find_by_session(session).await?)
    }

    /// Scans sitting on the OTP screen past `minutes`, not yet nudged
    pub async fn scans_pending_otp_help(
        &self,
        restaurant: &str,
        minutes: i64,
    ) -> AppResult<Vec<QrScanEvent>> {
        let cutoff = time::minutes_ago(minutes, time::now_millis());
        Ok(self.repo().find_pending_otp_help(restaurant, cutoff).await?)
    }

    /// Verified scans still browsing with no order past `minutes`
    pub async fn scans_pending_browse_help(
        &self,
        restaurant: &str,
        minutes: i64,
    ) -> AppResult<Vec<QrScanEvent>> {
        let cutoff = time::minutes_ago(minutes, time::now_millis());
        Ok(self
            .repo()
            .find_pending_browse_help(restaurant, cutoff)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::test_support::{backdate, fixtures};

    #[tokio::test]
    async fn duplicate_scans_all_recorded() {
        let fx = fixtures().await;
        let tracker = QrScanTracker::new(fx.db.clone());

        let a = tracker
            .record_scan(&fx.restaurant_id, &fx.table_id, None, None)
            .await
            .unwrap();
        let b = tracker
            .record_scan(&fx.restaurant_id, &fx.table_id, None, None)
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn recent_scan_prefers_fingerprint_over_ip() {
        let fx = fixtures().await;
        let tracker = QrScanTracker::new(fx.db.clone());

        let by_ip = tracker
            .record_scan(
                &fx.restaurant_id,
                &fx.table_id,
                None,
                Some("10.0.0.7".into()),
            )
            .await
            .unwrap();
        let by_fp = tracker
            .record_scan(
                &fx.restaurant_id,
                &fx.table_id,
                Some("device-42".into()),
                None,
            )
            .await
            .unwrap();

        let found = tracker
            .find_recent_scan_for_table(&fx.table_id, Some("device-42"), Some("10.0.0.7"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, by_fp.id);

        let found = tracker
            .find_recent_scan_for_table(&fx.table_id, Some("other-device"), Some("10.0.0.7"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, by_ip.id);
    }

    #[tokio::test]
    async fn failed_otp_attempt_keeps_window_open() {
        let fx = fixtures().await;
        let tracker = QrScanTracker::new(fx.db.clone());

        let event = tracker
            .record_scan(&fx.restaurant_id, &fx.table_id, None, None)
            .await
            .unwrap();
        let id = event.id.as_ref().unwrap().to_string();

        let after_fail = tracker.mark_otp_entered(&id, false).await.unwrap();
        assert!(!after_fail.otp_entered);
        assert_eq!(after_fail.otp_attempts, 1);

        // Still findable for retry
        assert!(
            tracker
                .find_recent_scan_for_table(&fx.table_id, None, None)
                .await
                .unwrap()
                .is_some()
        );

        let after_success = tracker.mark_otp_entered(&id, true).await.unwrap();
        assert!(after_success.otp_entered);
        assert_eq!(after_success.otp_attempts, 2);
        assert!(after_success.otp_entered_at.is_some());

        // Consumed: no longer offered for correlation
        assert!(
            tracker
                .find_recent_scan_for_table(&fx.table_id, None, None)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn pending_otp_help_excludes_notified_scans() {
        let fx = fixtures().await;
        let tracker = QrScanTracker::new(fx.db.clone());

        let event = tracker
            .record_scan(&fx.restaurant_id, &fx.table_id, None, None)
            .await
            .unwrap();
        let id = event.id.as_ref().unwrap().to_string();
        backdate(&fx.db, &id, "scanned_at", 5).await;

        let pending = tracker
            .scans_pending_otp_help(&fx.restaurant_id, 2)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);

        tracker.mark_otp_help_notified(&id).await.unwrap();
        let pending = tracker
            .scans_pending_otp_help(&fx.restaurant_id, 2)
            .await
            .unwrap();
        assert!(pending.is_empty());
    }
}
