//! Guest Count History Repository (append-only)

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::GuestCountHistory;
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "guest_count_history";

#[derive(Clone)]
pub struct GuestCountHistoryRepository {
    base: BaseRepository,
}

impl GuestCountHistoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn append(
        &self,
        restaurant: RecordId,
        session: RecordId,
        previous_count: i32,
        new_count: i32,
        reason: Option<String>,
        changed_by: Option<String>,
        now: i64,
    ) -> RepoResult<GuestCountHistory> {
        let entry = GuestCountHistory {
            id: None,
            restaurant,
            session,
            previous_count,
            new_count,
            reason,
            changed_by,
            changed_at: now,
        };
        let created: Option<GuestCountHistory> =
            self.base.db().create(TABLE).content(entry).await?;
        created
            .ok_or_else(|| RepoError::Database("Failed to append guest count history".to_string()))
    }

    /// Edits for one session in chronological order
    pub async fn find_by_session(&self, session: &str) -> RepoResult<Vec<GuestCountHistory>> {
        let entries: Vec<GuestCountHistory> = self
            .base
            .db()
            .query(
                "SELECT * FROM guest_count_history WHERE session = $session ORDER BY changed_at",
            )
            .bind(("session", session.to_string()))
            .await?
            .take(0)?;
        Ok(entries)
    }
}
