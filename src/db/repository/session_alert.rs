//! Session Alert Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{AlertStatus, SessionAlert};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "session_alert";

#[derive(Clone)]
pub struct SessionAlertRepository {
    base: BaseRepository,
}

impl SessionAlertRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, alert: SessionAlert) -> RepoResult<SessionAlert> {
        let created: Option<SessionAlert> = self.base.db().create(TABLE).content(alert).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create alert".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<SessionAlert>> {
        let thing = self.base.parse_id(id)?;
        let alert: Option<SessionAlert> = self.base.db().select(thing).await?;
        Ok(alert)
    }

    pub async fn require(&self, id: &str) -> RepoResult<SessionAlert> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Alert {} not found", id)))
    }

    /// Unresolved alerts of a restaurant, oldest first
    pub async fn find_unresolved(&self, restaurant: &str) -> RepoResult<Vec<SessionAlert>> {
        let alerts: Vec<SessionAlert> = self
            .base
            .db()
            .query(
                "SELECT * FROM session_alert WHERE restaurant = $restaurant \
                 AND status != 'RESOLVED' ORDER BY created_at",
            )
            .bind(("restaurant", restaurant.to_string()))
            .await?
            .take(0)?;
        Ok(alerts)
    }

    /// Unresolved alerts tied to one session
    pub async fn find_open_for_session(&self, session: &str) -> RepoResult<Vec<SessionAlert>> {
        let alerts: Vec<SessionAlert> = self
            .base
            .db()
            .query(
                "SELECT * FROM session_alert WHERE session = $session \
                 AND status != 'RESOLVED' ORDER BY created_at",
            )
            .bind(("session", session.to_string()))
            .await?
            .take(0)?;
        Ok(alerts)
    }

    /// ACTIVE → ACKNOWLEDGED
    pub async fn acknowledge(
        &self,
        id: &str,
        by: Option<String>,
        now: i64,
    ) -> RepoResult<SessionAlert> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query(
                "UPDATE $thing SET status = 'ACKNOWLEDGED', acknowledged_at = $now, \
                 acknowledged_by = $by WHERE status = 'ACTIVE'",
            )
            .bind(("thing", thing))
            .bind(("now", now))
            .bind(("by", by))
            .await?;
        self.require(id).await
    }

    /// Any open status → RESOLVED. Acknowledgment is not a prerequisite.
    pub async fn resolve(
        &self,
        id: &str,
        by: Option<String>,
        note: Option<String>,
        now: i64,
    ) -> RepoResult<SessionAlert> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query(
                "UPDATE $thing SET status = 'RESOLVED', resolved_at = $now, \
                 resolved_by = $by, resolution_note = $note WHERE status != 'RESOLVED'",
            )
            .bind(("thing", thing))
            .bind(("now", now))
            .bind(("by", by))
            .bind(("note", note))
            .await?;
        self.require(id).await
    }
}
