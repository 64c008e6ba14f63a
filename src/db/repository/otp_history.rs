//! OTP History Repository (append-only)

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{OtpHistory, OtpReason};
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "otp_history";

#[derive(Clone)]
pub struct OtpHistoryRepository {
    base: BaseRepository,
}

impl OtpHistoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Append an issued-OTP row. History rows are never mutated.
    #[allow(clippy::too_many_arguments)]
    pub async fn append(
        &self,
        restaurant: RecordId,
        table: RecordId,
        otp: &str,
        reason: OtpReason,
        session: Option<RecordId>,
        issued_by: Option<String>,
        now: i64,
    ) -> RepoResult<OtpHistory> {
        let entry = OtpHistory {
            id: None,
            restaurant,
            table,
            otp: otp.to_string(),
            reason,
            session,
            issued_by,
            issued_at: now,
        };
        let created: Option<OtpHistory> = self.base.db().create(TABLE).content(entry).await?;
        created.ok_or_else(|| RepoError::Database("Failed to append OTP history".to_string()))
    }

    /// Full issuance log for a table, newest first
    pub async fn find_by_table(&self, table: &str) -> RepoResult<Vec<OtpHistory>> {
        let entries: Vec<OtpHistory> = self
            .base
            .db()
            .query(
                "SELECT * FROM otp_history WHERE dining_table = $table ORDER BY issued_at DESC",
            )
            .bind(("table", table.to_string()))
            .await?
            .take(0)?;
        Ok(entries)
    }
}
