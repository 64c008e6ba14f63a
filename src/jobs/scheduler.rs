//! Periodic job scheduler
//!
//! Drives the three checks on a fixed tick for deployments without an
//! external cron. Deployments with one can disable the scheduler and hit
//! the job API routes instead.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{
    JobDeps, run_assistance_check_all, run_cleaning_alert_check_all, run_long_stay_check_all,
};

pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

/// Fixed-interval driver for the poll jobs
pub struct JobScheduler {
    deps: JobDeps,
    tick: Duration,
    shutdown: CancellationToken,
}

impl JobScheduler {
    pub fn new(deps: JobDeps, tick: Duration, shutdown: CancellationToken) -> Self {
        Self {
            deps,
            tick,
            shutdown,
        }
    }

    /// Main loop: sweep, sleep, repeat until shutdown
    pub async fn run(self) {
        tracing::info!(tick_secs = self.tick.as_secs(), "Job scheduler started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.tick) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Job scheduler received shutdown signal");
                    return;
                }
            }
            self.sweep().await;
        }
    }

    /// One pass of all three checks over every active restaurant
    async fn sweep(&self) {
        match run_assistance_check_all(&self.deps).await {
            Ok(report) => {
                if report.otp_alerts + report.order_alerts
                    + report.scan_otp_nudges
                    + report.scan_browse_nudges
                    > 0
                    || !report.errors.is_empty()
                {
                    tracing::info!(
                        otp = report.otp_alerts,
                        order = report.order_alerts,
                        scan_otp = report.scan_otp_nudges,
                        scan_browse = report.scan_browse_nudges,
                        errors = report.errors.len(),
                        "Assistance check done"
                    );
                }
                for e in &report.errors {
                    tracing::warn!("Assistance check item failed: {}", e);
                }
            }
            Err(e) => tracing::error!("Assistance check failed: {}", e),
        }

        match run_long_stay_check_all(&self.deps).await {
            Ok(report) => {
                if report.warnings + report.criticals > 0 || !report.errors.is_empty() {
                    tracing::info!(
                        warnings = report.warnings,
                        criticals = report.criticals,
                        errors = report.errors.len(),
                        "Long-stay check done"
                    );
                }
                for e in &report.errors {
                    tracing::warn!("Long-stay check item failed: {}", e);
                }
            }
            Err(e) => tracing::error!("Long-stay check failed: {}", e),
        }

        match run_cleaning_alert_check_all(&self.deps).await {
            Ok(report) => {
                if report.alerts + report.escalations > 0 || !report.errors.is_empty() {
                    tracing::info!(
                        alerts = report.alerts,
                        escalations = report.escalations,
                        errors = report.errors.len(),
                        "Cleaning check done"
                    );
                }
                for e in &report.errors {
                    tracing::warn!("Cleaning check item failed: {}", e);
                }
            }
            Err(e) => tracing::error!("Cleaning check failed: {}", e),
        }
    }
}
