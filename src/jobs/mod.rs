//! Background poll jobs
//!
//! Three checks run per restaurant on a timer (or on demand through the job
//! API routes): stalled-session assistance, long-stay tiers and cleaning
//! delays. Every candidate is processed under per-item error capture so one
//! bad record never aborts a batch; the dedupe markers are written only
//! after the notification went out, which makes delivery at-least-once.

pub mod assistance_check;
pub mod cleaning_alert;
pub mod long_stay_check;
pub mod scheduler;

pub use assistance_check::{AssistanceReport, run_assistance_check};
pub use cleaning_alert::{CleaningAlertReport, run_cleaning_alert_check};
pub use long_stay_check::{LongStayReport, run_long_stay_check};
pub use scheduler::JobScheduler;

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::repository::RestaurantRepository;
use crate::notify::Notifier;
use crate::utils::AppResult;

/// Everything a job run needs
#[derive(Clone)]
pub struct JobDeps {
    pub db: Surreal<Db>,
    pub notifier: Arc<dyn Notifier>,
}

impl JobDeps {
    pub fn new(db: Surreal<Db>, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }
}

async fn active_restaurant_ids(deps: &JobDeps) -> AppResult<Vec<String>> {
    let restaurants = RestaurantRepository::new(deps.db.clone())
        .find_active()
        .await?;
    Ok(restaurants
        .into_iter()
        .filter_map(|r| r.id.map(|id| id.to_string()))
        .collect())
}

/// Run the assistance check for every active restaurant
pub async fn run_assistance_check_all(deps: &JobDeps) -> AppResult<AssistanceReport> {
    let mut total = AssistanceReport::default();
    for restaurant in active_restaurant_ids(deps).await? {
        let report = run_assistance_check(deps, &restaurant).await;
        total.merge(report);
    }
    Ok(total)
}

/// Run the long-stay check for every active restaurant
pub async fn run_long_stay_check_all(deps: &JobDeps) -> AppResult<LongStayReport> {
    let mut total = LongStayReport::default();
    for restaurant in active_restaurant_ids(deps).await? {
        let report = run_long_stay_check(deps, &restaurant).await;
        total.merge(report);
    }
    Ok(total)
}

/// Run the cleaning delay check for every active restaurant
pub async fn run_cleaning_alert_check_all(deps: &JobDeps) -> AppResult<CleaningAlertReport> {
    let mut total = CleaningAlertReport::default();
    for restaurant in active_restaurant_ids(deps).await? {
        let report = run_cleaning_alert_check(deps, &restaurant).await;
        total.merge(report);
    }
    Ok(total)
}
