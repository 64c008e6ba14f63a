//! Cleaning cycle service
//!
//! A cleaning record opens when a session ends and closes when staff mark
//! the table cleaned. Tables can also be marked cleaned with no open record
//! (walk-in resets, crash recovery); that path is fail-open and only forces
//! the floor status back to AVAILABLE.

use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{ChecklistItem, CleaningRecord, TableStatus};
use crate::db::repository::{CleaningRecordRepository, DiningTableRepository, TimerSettingsRepository};
use crate::utils::{AppError, AppResult, time};

/// Escalation threshold is this multiple of the alert threshold
const ESCALATION_FACTOR: i64 = 2;

/// Read-side aggregate over a requested_at range
#[derive(Debug, Clone, Serialize)]
pub struct CleaningStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub average_duration_minutes: Option<f64>,
    pub longest_duration_minutes: Option<i64>,
}

/// Cleaning cycle lifecycle and stats
#[derive(Clone)]
pub struct CleaningService {
    db: Surreal<Db>,
}

impl CleaningService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    fn records(&self) -> CleaningRecordRepository {
        CleaningRecordRepository::new(self.db.clone())
    }

    fn tables(&self) -> DiningTableRepository {
        DiningTableRepository::new(self.db.clone())
    }

    /// Open a cleaning cycle and flip the table to CLEANING. The checklist
    /// is snapshotted from the restaurant template at open time so later
    /// template edits never rewrite history.
    pub async fn start_cleaning(
        &self,
        restaurant: &str,
        table: &str,
        session: Option<&str>,
    ) -> AppResult<CleaningRecord> {
        let restaurant_id = restaurant
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid restaurant ID: {restaurant}")))?;
        let table_id = table
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid table ID: {table}")))?;
        let session_id = match session {
            Some(s) => Some(
                s.parse()
                    .map_err(|_| AppError::validation(format!("Invalid session ID: {s}")))?,
            ),
            None => None,
        };

        let settings = TimerSettingsRepository::new(self.db.clone())
            .find_for_restaurant(restaurant)
            .await?;
        let checklist = match settings {
            Some(s) if s.checklist_enabled => s
                .checklist_template
                .into_iter()
                .map(|label| ChecklistItem { label, done: false })
                .collect(),
            _ => Vec::new(),
        };

        let record = self
            .records()
            .create(restaurant_id, table_id, session_id, checklist, time::now_millis())
            .await?;
        self.tables().set_status(table, TableStatus::Cleaning).await?;
        Ok(record)
    }

    /// Close a cycle by record id and free the table
    pub async fn mark_cleaned(
        &self,
        record_id: &str,
        cleaned_by: Option<String>,
    ) -> AppResult<CleaningRecord> {
        let record = self.records().require(record_id).await?;
        if record.cleaned_at.is_some() {
            return Err(AppError::business_rule(
                "Cleaning record is already closed".to_string(),
            ));
        }
        let now = time::now_millis();
        let duration = time::elapsed_minutes(record.requested_at, now);
        let closed = self
            .records()
            .close(record_id, now, duration, cleaned_by)
            .await?;
        self.tables()
            .set_status(&record.table.to_string(), TableStatus::Available)
            .await?;
        Ok(closed)
    }

    /// Close whatever cycle is open on the table. No open record is not an
    /// error: log it and force the table back to AVAILABLE anyway, so a lost
    /// record can never wedge a table in CLEANING.
    pub async fn mark_table_cleaned(
        &self,
        table: &str,
        cleaned_by: Option<String>,
    ) -> AppResult<Option<CleaningRecord>> {
        match self.records().find_open_for_table(table).await? {
            Some(record) => {
                let id = record.id.as_ref().ok_or_else(|| {
                    AppError::internal("Cleaning record without id".to_string())
                })?;
                let closed = self.mark_cleaned(&id.to_string(), cleaned_by).await?;
                Ok(Some(closed))
            }
            None => {
                tracing::warn!(table = %table, "Table marked cleaned with no open cleaning record");
                self.tables().set_status(table, TableStatus::Available).await?;
                Ok(None)
            }
        }
    }

    /// Open cycles past the alert threshold, not yet alerted. Cycles
    /// already past the escalation threshold are the escalation tier's
    /// business and never show up here.
    pub async fn records_needing_alert(
        &self,
        restaurant: &str,
        alert_minutes: i64,
    ) -> AppResult<Vec<CleaningRecord>> {
        let now = time::now_millis();
        let cutoff = time::minutes_ago(alert_minutes, now);
        let escalation_cutoff = time::minutes_ago(alert_minutes * ESCALATION_FACTOR, now);
        Ok(self
            .records()
            .find_needing_alert(restaurant, cutoff, escalation_cutoff)
            .await?)
    }

    /// Open cycles past twice the alert threshold, not yet escalated
    pub async fn records_needing_escalation(
        &self,
        restaurant: &str,
        alert_minutes: i64,
    ) -> AppResult<Vec<CleaningRecord>> {
        let cutoff = time::minutes_ago(alert_minutes * ESCALATION_FACTOR, time::now_millis());
        Ok(self
            .records()
            .find_needing_escalation(restaurant, cutoff)
            .await?)
    }

    pub async fn mark_alert_sent(&self, record_id: &str) -> AppResult<()> {
        self.records()
            .mark_alert_sent(record_id, time::now_millis())
            .await?;
        Ok(())
    }

    pub async fn mark_escalated(&self, record_id: &str) -> AppResult<()> {
        self.records()
            .mark_escalated(record_id, time::now_millis())
            .await?;
        Ok(())
    }

    /// Cycles opened by a session, oldest first
    pub async fn records_for_session(&self, session: &str) -> AppResult<Vec<CleaningRecord>> {
        Ok(self.records().find_by_session(session).await?)
    }

    /// Aggregate cycles whose requested_at falls in `[from, to)`
    pub async fn cleaning_stats(
        &self,
        restaurant: &str,
        from: i64,
        to: i64,
    ) -> AppResult<CleaningStats> {
        let records = self.records().find_between(restaurant, from, to).await?;
        let total = records.len();
        let durations: Vec<i64> = records
            .iter()
            .filter_map(|r| r.duration_minutes)
            .collect();
        let completed = records.iter().filter(|r| r.cleaned_at.is_some()).count();

        let average_duration_minutes = if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<i64>() as f64 / durations.len() as f64)
        };
        let longest_duration_minutes = durations.iter().copied().max();

        Ok(CleaningStats {
            total,
            completed,
            pending: total - completed,
            average_duration_minutes,
            longest_duration_minutes,
        })
    }
}
