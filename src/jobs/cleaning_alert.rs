//! Cleaning delay check
//!
//! Tables stuck in CLEANING raise a waiter alert at the configured
//! threshold and a high-priority manager escalation at twice that. The two
//! tiers use separate stamps on the cleaning record, so each fires once;
//! a record first observed already past the escalation threshold skips the
//! waiter tier and goes straight to the manager.

use serde::Serialize;

use crate::db::models::{AlertPriority, AlertType, CleaningRecord, StaffRole};
use crate::notify::NotificationEvent;
use crate::sessions::{AssistanceTimerService, CleaningService, CreateAlert};
use crate::utils::time;

use super::JobDeps;
use super::assistance_check::job_notification;

/// Counts of what one cleaning sweep produced
#[derive(Debug, Default, Clone, Serialize)]
pub struct CleaningAlertReport {
    pub alerts: usize,
    pub escalations: usize,
    pub errors: Vec<String>,
}

impl CleaningAlertReport {
    pub fn merge(&mut self, other: CleaningAlertReport) {
        self.alerts += other.alerts;
        self.escalations += other.escalations;
        self.errors.extend(other.errors);
    }
}

/// One cleaning delay sweep over a restaurant
pub async fn run_cleaning_alert_check(deps: &JobDeps, restaurant: &str) -> CleaningAlertReport {
    let assistance = AssistanceTimerService::new(deps.db.clone());
    let cleaning = CleaningService::new(deps.db.clone());
    let mut report = CleaningAlertReport::default();

    let settings = match assistance.timer_settings(restaurant).await {
        Ok(s) => s,
        Err(e) => {
            report.errors.push(format!("timer settings: {e}"));
            return report;
        }
    };
    if !settings.enabled {
        return report;
    }
    let threshold = settings.cleaning_alert_minutes;

    match cleaning.records_needing_alert(restaurant, threshold).await {
        Ok(records) => {
            for record in records {
                match raise(deps, &assistance, &cleaning, restaurant, &record, Tier::Alert).await {
                    Ok(()) => report.alerts += 1,
                    Err(e) => report.errors.push(format!("cleaning alert: {e}")),
                }
            }
        }
        Err(e) => report.errors.push(format!("cleaning alert query: {e}")),
    }

    match cleaning
        .records_needing_escalation(restaurant, threshold)
        .await
    {
        Ok(records) => {
            for record in records {
                match raise(
                    deps,
                    &assistance,
                    &cleaning,
                    restaurant,
                    &record,
                    Tier::Escalation,
                )
                .await
                {
                    Ok(()) => report.escalations += 1,
                    Err(e) => report.errors.push(format!("cleaning escalation: {e}")),
                }
            }
        }
        Err(e) => report.errors.push(format!("cleaning escalation query: {e}")),
    }

    report
}

#[derive(Clone, Copy)]
enum Tier {
    Alert,
    Escalation,
}

async fn raise(
    deps: &JobDeps,
    assistance: &AssistanceTimerService,
    cleaning: &CleaningService,
    restaurant: &str,
    record: &CleaningRecord,
    tier: Tier,
) -> Result<(), String> {
    let id = record
        .id
        .as_ref()
        .ok_or("cleaning record without id".to_string())?
        .to_string();
    let waiting_minutes = time::elapsed_minutes(record.requested_at, time::now_millis());
    let session = record.session.as_ref().map(|s| s.to_string());

    let (title, roles, priority) = match tier {
        Tier::Alert => (
            "Table waiting for cleaning",
            vec![StaffRole::Waiter],
            AlertPriority::Normal,
        ),
        Tier::Escalation => (
            "Cleaning overdue",
            vec![StaffRole::Manager],
            AlertPriority::High,
        ),
    };
    let message = format!(
        "Table {} has been waiting for cleaning for {} minutes",
        record.table, waiting_minutes
    );

    assistance
        .create_alert(CreateAlert {
            restaurant: restaurant.to_string(),
            session: session.clone(),
            table: record.table.to_string(),
            alert_type: AlertType::CleaningDelay,
            message: message.clone(),
            target_roles: Some(roles.clone()),
            priority: Some(priority),
        })
        .await
        .map_err(|e| e.to_string())?;
    deps.notifier
        .send(job_notification(
            restaurant,
            NotificationEvent::CleaningDelay,
            title,
            message,
            &record.table.to_string(),
            session,
            roles,
            priority,
        ))
        .await;

    match tier {
        Tier::Alert => cleaning.mark_alert_sent(&id).await,
        Tier::Escalation => cleaning.mark_escalated(&id).await,
    }
    .map_err(|e| e.to_string())
}
