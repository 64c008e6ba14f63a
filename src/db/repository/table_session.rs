//! Table Session Repository
//!
//! Timestamp stamps are first-write-wins UPDATE statements guarded in the
//! WHERE clause, so replays never move a phase timestamp backwards.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{SessionPhase, SessionStatus, TableSession, TableSessionCreate};
use crate::utils::time;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "table_session";

#[derive(Clone)]
pub struct TableSessionRepository {
    base: BaseRepository,
}

impl TableSessionRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a session in CREATED phase
    pub async fn create(&self, data: TableSessionCreate) -> RepoResult<TableSession> {
        let now = time::now_millis();
        let session = TableSession {
            id: None,
            restaurant: data.restaurant,
            table: data.table,
            status: SessionStatus::Active,
            phase: SessionPhase::Created,
            guest_count: data.guest_count,
            otp_verified: false,
            qr_scanned_at: data.qr_scanned_at,
            seated_at: None,
            first_order_at: None,
            first_food_served_at: None,
            bill_requested_at: None,
            payment_completed_at: None,
            ended_at: None,
            waiter_notified_at: None,
            otp_help_notified_at: None,
            order_help_notified_at: None,
            long_stay_alert_at: None,
            long_stay_critical_at: None,
            ended_by: None,
            end_reason: None,
            created_at: now,
        };
        let created: Option<TableSession> = self.base.db().create(TABLE).content(session).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create session".to_string()))
    }

    /// Find session by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<TableSession>> {
        let thing = self.base.parse_id(id)?;
        let session: Option<TableSession> = self.base.db().select(thing).await?;
        Ok(session)
    }

    /// Find session by id, erroring when absent
    pub async fn require(&self, id: &str) -> RepoResult<TableSession> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Session {} not found", id)))
    }

    /// Newest ACTIVE session on a table, if any
    pub async fn find_active_for_table(&self, table: &str) -> RepoResult<Option<TableSession>> {
        let sessions: Vec<TableSession> = self
            .base
            .db()
            .query(
                "SELECT * FROM table_session WHERE dining_table = $table AND status = 'ACTIVE' \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(("table", table.to_string()))
            .await?
            .take(0)?;
        Ok(sessions.into_iter().next())
    }

    /// All ACTIVE sessions of a restaurant
    pub async fn find_active(&self, restaurant: &str) -> RepoResult<Vec<TableSession>> {
        let sessions: Vec<TableSession> = self
            .base
            .db()
            .query(
                "SELECT * FROM table_session WHERE restaurant = $restaurant AND status = 'ACTIVE' \
                 ORDER BY created_at",
            )
            .bind(("restaurant", restaurant.to_string()))
            .await?
            .take(0)?;
        Ok(sessions)
    }

    // ========================================================================
    // Phase stamps (first-write-wins)
    // ========================================================================

    /// OTP verified: seat the guests
    pub async fn mark_seated(&self, id: &str, now: i64) -> RepoResult<TableSession> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query(
                "UPDATE $thing SET otp_verified = true, seated_at = $now \
                 WHERE status = 'ACTIVE' AND seated_at IS NONE",
            )
            .bind(("thing", thing))
            .bind(("now", now))
            .await?;
        self.require(id).await
    }

    /// First order placed
    pub async fn stamp_first_order(&self, id: &str, now: i64) -> RepoResult<TableSession> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query(
                "UPDATE $thing SET first_order_at = $now \
                 WHERE status = 'ACTIVE' AND first_order_at IS NONE",
            )
            .bind(("thing", thing))
            .bind(("now", now))
            .await?;
        self.require(id).await
    }

    /// First dish hit the table
    pub async fn stamp_first_food_served(&self, id: &str, now: i64) -> RepoResult<TableSession> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query(
                "UPDATE $thing SET first_food_served_at = $now \
                 WHERE status = 'ACTIVE' AND first_food_served_at IS NONE",
            )
            .bind(("thing", thing))
            .bind(("now", now))
            .await?;
        self.require(id).await
    }

    /// Guest asked for the bill
    pub async fn stamp_bill_requested(&self, id: &str, now: i64) -> RepoResult<TableSession> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query(
                "UPDATE $thing SET bill_requested_at = $now \
                 WHERE status = 'ACTIVE' AND bill_requested_at IS NONE",
            )
            .bind(("thing", thing))
            .bind(("now", now))
            .await?;
        self.require(id).await
    }

    /// Waiter acknowledged an assistance call
    pub async fn stamp_waiter_notified(&self, id: &str, now: i64) -> RepoResult<TableSession> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query(
                "UPDATE $thing SET waiter_notified_at = $now \
                 WHERE status = 'ACTIVE' AND waiter_notified_at IS NONE",
            )
            .bind(("thing", thing))
            .bind(("now", now))
            .await?;
        self.require(id).await
    }

    /// Advance the phase; callers must only pass a phase >= the current one
    pub async fn set_phase(&self, id: &str, phase: SessionPhase) -> RepoResult<TableSession> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET phase = $phase WHERE status = 'ACTIVE'")
            .bind(("thing", thing))
            .bind(("phase", phase))
            .await?;
        self.require(id).await
    }

    /// Close the session: COMPLETED status + phase, end stamps, audit fields
    pub async fn complete(
        &self,
        id: &str,
        now: i64,
        ended_by: Option<String>,
        reason: Option<String>,
    ) -> RepoResult<TableSession> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query(
                "UPDATE $thing SET status = 'COMPLETED', phase = 'COMPLETED', \
                 ended_at = $now, payment_completed_at = $now, \
                 ended_by = $ended_by, end_reason = $reason \
                 WHERE status = 'ACTIVE'",
            )
            .bind(("thing", thing))
            .bind(("now", now))
            .bind(("ended_by", ended_by))
            .bind(("reason", reason))
            .await?;
        self.require(id).await
    }

    /// Update the guest count (audit trail is the service's job)
    pub async fn set_guest_count(&self, id: &str, count: i32) -> RepoResult<TableSession> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET guest_count = $count WHERE status = 'ACTIVE'")
            .bind(("thing", thing))
            .bind(("count", count))
            .await?;
        self.require(id).await
    }

    // ========================================================================
    // Notification dedupe markers
    // ========================================================================

    pub async fn mark_otp_help_notified(&self, id: &str, now: i64) -> RepoResult<()> {
        self.set_marker(id, "otp_help_notified_at", now).await
    }

    pub async fn mark_order_help_notified(&self, id: &str, now: i64) -> RepoResult<()> {
        self.set_marker(id, "order_help_notified_at", now).await
    }

    pub async fn mark_long_stay_warning(&self, id: &str, now: i64) -> RepoResult<()> {
        self.set_marker(id, "long_stay_alert_at", now).await
    }

    pub async fn mark_long_stay_critical(&self, id: &str, now: i64) -> RepoResult<()> {
        self.set_marker(id, "long_stay_critical_at", now).await
    }

    async fn set_marker(&self, id: &str, field: &'static str, now: i64) -> RepoResult<()> {
        let thing = self.base.parse_id(id)?;
        // Field name comes from the fixed list above, never from input
        self.base
            .db()
            .query(format!("UPDATE $thing SET {field} = $now"))
            .bind(("thing", thing))
            .bind(("now", now))
            .await?;
        Ok(())
    }

    // ========================================================================
    // Timer selection queries
    // ========================================================================

    /// CREATED sessions scanned before `cutoff` with OTP still unverified
    /// and no help notification sent yet
    pub async fn find_pending_otp_help(
        &self,
        restaurant: &str,
        cutoff: i64,
    ) -> RepoResult<Vec<TableSession>> {
        let sessions: Vec<TableSession> = self
            .base
            .db()
            .query(
                "SELECT * FROM table_session WHERE restaurant = $restaurant \
                 AND status = 'ACTIVE' AND phase = 'CREATED' AND otp_verified = false \
                 AND qr_scanned_at IS NOT NONE AND qr_scanned_at <= $cutoff \
                 AND otp_help_notified_at IS NONE",
            )
            .bind(("restaurant", restaurant.to_string()))
            .bind(("cutoff", cutoff))
            .await?
            .take(0)?;
        Ok(sessions)
    }

    /// SEATED sessions with no order placed before `cutoff` and no help
    /// notification sent yet
    pub async fn find_pending_order_help(
        &self,
        restaurant: &str,
        cutoff: i64,
    ) -> RepoResult<Vec<TableSession>> {
        let sessions: Vec<TableSession> = self
            .base
            .db()
            .query(
                "SELECT * FROM table_session WHERE restaurant = $restaurant \
                 AND status = 'ACTIVE' AND phase = 'SEATED' AND otp_verified = true \
                 AND first_order_at IS NONE \
                 AND seated_at IS NOT NONE AND seated_at <= $cutoff \
                 AND order_help_notified_at IS NONE",
            )
            .bind(("restaurant", restaurant.to_string()))
            .bind(("cutoff", cutoff))
            .await?
            .take(0)?;
        Ok(sessions)
    }

    /// Sessions seated before the warning cutoff with no long-stay alert of
    /// either tier yet
    pub async fn find_long_stay_warning(
        &self,
        restaurant: &str,
        cutoff: i64,
    ) -> RepoResult<Vec<TableSession>> {
        let sessions: Vec<TableSession> = self
            .base
            .db()
            .query(
                "SELECT * FROM table_session WHERE restaurant = $restaurant \
                 AND status = 'ACTIVE' \
                 AND seated_at IS NOT NONE AND seated_at <= $cutoff \
                 AND long_stay_alert_at IS NONE AND long_stay_critical_at IS NONE",
            )
            .bind(("restaurant", restaurant.to_string()))
            .bind(("cutoff", cutoff))
            .await?
            .take(0)?;
        Ok(sessions)
    }

    /// Sessions seated before the critical cutoff that have not escalated
    /// yet. A prior warning does not exclude them - this is the one alert
    /// that intentionally fires a second time.
    pub async fn find_long_stay_critical(
        &self,
        restaurant: &str,
        cutoff: i64,
    ) -> RepoResult<Vec<TableSession>> {
        let sessions: Vec<TableSession> = self
            .base
            .db()
            .query(
                "SELECT * FROM table_session WHERE restaurant = $restaurant \
                 AND status = 'ACTIVE' \
                 AND seated_at IS NOT NONE AND seated_at <= $cutoff \
                 AND long_stay_critical_at IS NONE",
            )
            .bind(("restaurant", restaurant.to_string()))
            .bind(("cutoff", cutoff))
            .await?
            .take(0)?;
        Ok(sessions)
    }
}
