//! Server state - shared handles for every request and job
//!
//! Cheap to clone: the database handle and the hub are reference-counted,
//! and domain services are constructed on demand from them.

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::Config;
use crate::db::DbService;
use crate::jobs::JobDeps;
use crate::notify::{NotificationHub, Notifier};
use crate::sessions::{
    AssistanceTimerService, CleaningService, OtpService, QrScanTracker, SessionService,
};
use crate::utils::AppResult;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Surreal<Db>,
    pub hub: Arc<NotificationHub>,
}

impl ServerState {
    /// Open the on-disk database under the configured working directory
    pub async fn new(config: Config) -> AppResult<Self> {
        std::fs::create_dir_all(&config.work_dir).map_err(|e| {
            crate::utils::AppError::internal(format!(
                "Failed to create working directory {}: {e}",
                config.work_dir
            ))
        })?;
        let db = DbService::new(&config.db_path()).await?.db;
        Ok(Self {
            config,
            db,
            hub: Arc::new(NotificationHub::new()),
        })
    }

    /// In-memory state for tests and demos
    pub async fn open_in_memory(config: Config) -> AppResult<Self> {
        let db = DbService::open_in_memory().await?.db;
        Ok(Self {
            config,
            db,
            hub: Arc::new(NotificationHub::new()),
        })
    }

    /// The hub viewed through the `Notifier` seam
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.hub.clone()
    }

    pub fn sessions(&self) -> SessionService {
        SessionService::new(self.db.clone(), self.notifier())
    }

    pub fn assistance(&self) -> AssistanceTimerService {
        AssistanceTimerService::new(self.db.clone())
    }

    pub fn cleaning(&self) -> CleaningService {
        CleaningService::new(self.db.clone())
    }

    pub fn otp(&self) -> OtpService {
        OtpService::new(self.db.clone())
    }

    pub fn scans(&self) -> QrScanTracker {
        QrScanTracker::new(self.db.clone())
    }

    pub fn job_deps(&self) -> JobDeps {
        JobDeps::new(self.db.clone(), self.notifier())
    }
}
