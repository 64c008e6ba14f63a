//! Timer Settings Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::TimerSettings;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "timer_settings";

#[derive(Clone)]
pub struct TimerSettingsRepository {
    base: BaseRepository,
}

impl TimerSettingsRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Stored settings row for a restaurant, if one exists
    pub async fn find_for_restaurant(
        &self,
        restaurant: &str,
    ) -> RepoResult<Option<TimerSettings>> {
        let settings: Vec<TimerSettings> = self
            .base
            .db()
            .query("SELECT * FROM timer_settings WHERE restaurant = $restaurant LIMIT 1")
            .bind(("restaurant", restaurant.to_string()))
            .await?
            .take(0)?;
        Ok(settings.into_iter().next())
    }

    /// Insert or replace the restaurant's settings row
    pub async fn upsert(&self, settings: TimerSettings) -> RepoResult<TimerSettings> {
        let restaurant = settings.restaurant.to_string();
        if let Some(existing) = self.find_for_restaurant(&restaurant).await? {
            let thing = existing
                .id
                .ok_or_else(|| RepoError::Database("Settings row without id".to_string()))?;
            let mut replacement = settings;
            replacement.id = Some(thing.clone());
            let updated: Option<TimerSettings> =
                self.base.db().update(thing).content(replacement).await?;
            updated.ok_or_else(|| RepoError::Database("Failed to update settings".to_string()))
        } else {
            let created: Option<TimerSettings> =
                self.base.db().create(TABLE).content(settings).await?;
            created.ok_or_else(|| RepoError::Database("Failed to create settings".to_string()))
        }
    }
}
