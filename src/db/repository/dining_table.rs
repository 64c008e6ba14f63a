//! Dining Table Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{DiningTable, DiningTableCreate, TableStatus};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "dining_table";

#[derive(Clone)]
pub struct DiningTableRepository {
    base: BaseRepository,
}

impl DiningTableRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active tables of a restaurant
    pub async fn find_all(&self, restaurant: &str) -> RepoResult<Vec<DiningTable>> {
        let tables: Vec<DiningTable> = self
            .base
            .db()
            .query(
                "SELECT * FROM dining_table WHERE restaurant = $restaurant AND is_active = true ORDER BY name",
            )
            .bind(("restaurant", restaurant.to_string()))
            .await?
            .take(0)?;
        Ok(tables)
    }

    /// Find table by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<DiningTable>> {
        let thing = self.base.parse_id(id)?;
        let table: Option<DiningTable> = self.base.db().select(thing).await?;
        Ok(table)
    }

    /// Find table by id, erroring when absent
    pub async fn require(&self, id: &str) -> RepoResult<DiningTable> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Table {} not found", id)))
    }

    /// Create a new dining table (starts AVAILABLE, no OTP yet)
    pub async fn create(&self, data: DiningTableCreate) -> RepoResult<DiningTable> {
        let table = DiningTable {
            id: None,
            restaurant: data.restaurant,
            name: data.name,
            zone_name: data.zone_name,
            capacity: data.capacity.unwrap_or(4),
            status: TableStatus::Available,
            current_otp: None,
            otp_generated_at: None,
            is_active: true,
        };
        let created: Option<DiningTable> = self.base.db().create(TABLE).content(table).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create dining table".to_string()))
    }

    /// Set the floor status
    pub async fn set_status(&self, id: &str, status: TableStatus) -> RepoResult<DiningTable> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET status = $status")
            .bind(("thing", thing))
            .bind(("status", status))
            .await?;
        self.require(id).await
    }

    /// Persist a freshly drawn OTP
    pub async fn set_otp(&self, id: &str, otp: &str, now: i64) -> RepoResult<DiningTable> {
        let thing = self.base.parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET current_otp = $otp, otp_generated_at = $now")
            .bind(("thing", thing))
            .bind(("otp", otp.to_string()))
            .bind(("now", now))
            .await?;
        self.require(id).await
    }
}
