//! Restaurant Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Restaurant;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "restaurant";

#[derive(Clone)]
pub struct RestaurantRepository {
    base: BaseRepository,
}

impl RestaurantRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a restaurant tenant
    pub async fn create(&self, name: &str) -> RepoResult<Restaurant> {
        let restaurant = Restaurant {
            id: None,
            name: name.to_string(),
            is_active: true,
        };
        let created: Option<Restaurant> =
            self.base.db().create(TABLE).content(restaurant).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create restaurant".to_string()))
    }

    /// Find restaurant by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Restaurant>> {
        let thing = self.base.parse_id(id)?;
        let restaurant: Option<Restaurant> = self.base.db().select(thing).await?;
        Ok(restaurant)
    }

    /// All active restaurants, for the "run for all" job wrappers
    pub async fn find_active(&self) -> RepoResult<Vec<Restaurant>> {
        let restaurants: Vec<Restaurant> = self
            .base
            .db()
            .query("SELECT * FROM restaurant WHERE is_active = true ORDER BY name")
            .await?
            .take(0)?;
        Ok(restaurants)
    }
}
