//! Cleaning Record Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{ChecklistItem, CleaningRecord};
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "cleaning_record";

#[derive(Clone)]
pub struct CleaningRecordRepository {
    base: BaseRepository,
}

impl CleaningRecordRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Open a cleaning cycle
    pub async fn create(
        &self,
        restaurant: RecordId,
        table: RecordId,
        session: Option<RecordId>,
        checklist: Vec<ChecklistItem>,
        now: i64,
    ) -> RepoResult<CleaningRecord> {
        let record = CleaningRecord {
            id: None,
            restaurant,
            table,
            session,
            requested_at: now,
            cleaned_at: None,
            duration_minutes: None,
            cleaned_by: None,
            alert_sent_at: None,
            escalated_at: None,
            checklist,
        };
        let created: Option<CleaningRecord> = self.base.db().create(TABLE).content(record).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create cleaning record".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<CleaningRecord>> {
        let thing = self.base.parse_id(id)?;
        let record: Option<CleaningRecord> = self.base.db().select(thing).await?;
        Ok(record)
    }

    pub async fn require(&self, id: &str) -> RepoResult<CleaningRecord> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Cleaning record {} not found", id)))
    }

    /// Newest still-open record for a table, if any
    pub async fn find_open_for_table(&self, table: &str) -> RepoResult<Option<CleaningRecord>> {
        let records: Vec<CleaningRecord> = self
            .base
            .db()
            .query(
                "SELECT * FROM cleaning_record WHERE dining_table = $table \
                 AND cleaned_at IS NONE ORDER BY requested_at DESC LIMIT 1",
            )
            .bind(("table", table.to_string()))
            .await?
            .take(0)?;
        Ok(records.into_iter().next())
    }

    /// Cleaning cycles opened by one session, oldest first
    pub async fn find_by_session(&self, session: &str) -> RepoResult<Vec<CleaningRecord>> {
        let records: Vec<CleaningRecord> = self
            .base
            .db()
            .query(
                "SELECT * FROM cleaning_record WHERE session = $session ORDER BY requested_at",
            )
            .bind(("session", session.to_string()))
            .await?
            .take(0)?;
        Ok(records)
    }

    /// Open records older than `cutoff` that have not been alerted yet.
    /// Records already past `escalation_cutoff` belong to the escalation
    /// tier and are excluded here, so a record first seen that late gets
    /// exactly one alert.
    pub async fn find_needing_alert(
        &self,
        restaurant: &str,
        cutoff: i64,
        escalation_cutoff: i64,
    ) -> RepoResult<Vec<CleaningRecord>> {
        let records: Vec<CleaningRecord> = self
            .base
            .db()
            .query(
                "SELECT * FROM cleaning_record WHERE restaurant = $restaurant \
                 AND cleaned_at IS NONE AND requested_at <= $cutoff \
                 AND requested_at > $escalation_cutoff \
                 AND alert_sent_at IS NONE",
            )
            .bind(("restaurant", restaurant.to_string()))
            .bind(("cutoff", cutoff))
            .bind(("escalation_cutoff", escalation_cutoff))
            .await?
            .take(0)?;
        Ok(records)
    }

    /// Open records older than `cutoff` that have not been escalated
    pub async fn find_needing_escalation(
        &self,
        restaurant: &str,
        cutoff: i64,
    ) -> RepoResult<Vec<CleaningRecord>> {
        let records: Vec<CleaningRecord> = self
            .base
            .db()
            .query(
                "SELECT * FROM cleaning_record WHERE restaurant = $restaurant \
                 AND cleaned_at IS NONE AND requested_at <= $cutoff \
                 AND escalated_at IS NONE",
            )
            .bind(("restaurant", restaurant.to_string()))
            .bind(("cutoff", cutoff))
            .await?
            .take(0)?;
        Ok(records)
    }

    /// Close a cleaning cycle
    pub async fn close(
        &self,
        id: &str,
        now: i64,
        duration_minutes: i64,
        cleaned_by: Option<String>,
    ) -> RepoResult<CleaningRecord> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query(
                "UPDATE $thing SET cleaned_at = $now, duration_minutes = $duration, \
                 cleaned_by = $by WHERE cleaned_at IS NONE",
            )
            .bind(("thing", thing))
            .bind(("now", now))
            .bind(("duration", duration_minutes))
            .bind(("by", cleaned_by))
            .await?;
        self.require(id).await
    }

    pub async fn mark_alert_sent(&self, id: &str, now: i64) -> RepoResult<()> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET alert_sent_at = $now")
            .bind(("thing", thing))
            .bind(("now", now))
            .await?;
        Ok(())
    }

    pub async fn mark_escalated(&self, id: &str, now: i64) -> RepoResult<()> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET escalated_at = $now")
            .bind(("thing", thing))
            .bind(("now", now))
            .await?;
        Ok(())
    }

    /// All records in a requested_at range (open and closed)
    pub async fn find_between(
        &self,
        restaurant: &str,
        from: i64,
        to: i64,
    ) -> RepoResult<Vec<CleaningRecord>> {
        let records: Vec<CleaningRecord> = self
            .base
            .db()
            .query(
                "SELECT * FROM cleaning_record WHERE restaurant = $restaurant \
                 AND requested_at >= $from AND requested_at < $to",
            )
            .bind(("restaurant", restaurant.to_string()))
            .bind(("from", from))
            .bind(("to", to))
            .await?
            .take(0)?;
        Ok(records)
    }
}
