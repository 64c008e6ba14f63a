//! Session Order Repository (read-model)

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{SessionOrder, SessionOrderItem};
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "session_order";

#[derive(Clone)]
pub struct SessionOrderRepository {
    base: BaseRepository,
}

impl SessionOrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Orders of a session in placement order
    pub async fn find_by_session(&self, session: &str) -> RepoResult<Vec<SessionOrder>> {
        let orders: Vec<SessionOrder> = self
            .base
            .db()
            .query("SELECT * FROM session_order WHERE session = $session ORDER BY placed_at")
            .bind(("session", session.to_string()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Insert an order row. The ordering pipeline owns this table in
    /// production; this method exists for fixtures and tests.
    pub async fn create(
        &self,
        restaurant: RecordId,
        session: RecordId,
        order_number: Option<String>,
        placed_at: i64,
        items: Vec<SessionOrderItem>,
    ) -> RepoResult<SessionOrder> {
        let order = SessionOrder {
            id: None,
            restaurant,
            session,
            order_number,
            placed_at,
            items,
        };
        let created: Option<SessionOrder> = self.base.db().create(TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create session order".to_string()))
    }
}
