//! Long-stay check: two-tier occupancy alerts
//!
//! Criticals are processed before warnings so a session that blows straight
//! past both thresholds between two sweeps escalates once instead of
//! receiving a stale warning first. Warning and critical each fire at most
//! once per session; critical after warning is the one intended second
//! alert.

use serde::Serialize;

use crate::db::models::{AlertPriority, AlertType, StaffRole, TableSession};
use crate::notify::NotificationEvent;
use crate::sessions::{AssistanceTimerService, CreateAlert};
use crate::utils::time;

use super::JobDeps;
use super::assistance_check::job_notification;

/// Counts of what one long-stay run produced
#[derive(Debug, Default, Clone, Serialize)]
pub struct LongStayReport {
    pub warnings: usize,
    pub criticals: usize,
    pub errors: Vec<String>,
}

impl LongStayReport {
    pub fn merge(&mut self, other: LongStayReport) {
        self.warnings += other.warnings;
        self.criticals += other.criticals;
        self.errors.extend(other.errors);
    }
}

/// One long-stay sweep over a restaurant
pub async fn run_long_stay_check(deps: &JobDeps, restaurant: &str) -> LongStayReport {
    let assistance = AssistanceTimerService::new(deps.db.clone());
    let mut report = LongStayReport::default();

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

    // Criticals first; the warning query excludes freshly escalated sessions
    match assistance
        .check_long_stay_critical_needed(restaurant, settings.long_stay_critical_minutes)
        .await
    {
        Ok(sessions) => {
            for session in sessions {
                match raise_tier(deps, &assistance, restaurant, &session, Tier::Critical).await {
                    Ok(()) => report.criticals += 1,
                    Err(e) => report.errors.push(format!("critical: {e}")),
                }
            }
        }
        Err(e) => report.errors.push(format!("critical query: {e}")),
    }

    match assistance
        .check_long_stay_warning_needed(restaurant, settings.long_stay_warning_minutes)
        .await
    {
        Ok(sessions) => {
            for session in sessions {
                match raise_tier(deps, &assistance, restaurant, &session, Tier::Warning).await {
                    Ok(()) => report.warnings += 1,
                    Err(e) => report.errors.push(format!("warning: {e}")),
                }
            }
        }
        Err(e) => report.errors.push(format!("warning query: {e}")),
    }

    report
}

#[derive(Clone, Copy)]
enum Tier {
    Warning,
    Critical,
}

async fn raise_tier(
    deps: &JobDeps,
    assistance: &AssistanceTimerService,
    restaurant: &str,
    session: &TableSession,
    tier: Tier,
) -> Result<(), String> {
    let id = session
        .id
        .as_ref()
        .ok_or("session without id".to_string())?
        .to_string();
    let seated_minutes = session
        .seated_at
        .map(|at| time::elapsed_minutes(at, time::now_millis()))
        .unwrap_or(0);

    let (alert_type, event, title, roles, priority) = match tier {
        Tier::Warning => (
            AlertType::LongStayWarning,
            NotificationEvent::LongStayWarning,
            "Long stay",
            vec![StaffRole::Waiter, StaffRole::Manager],
            AlertPriority::Normal,
        ),
        Tier::Critical => (
            AlertType::LongStayCritical,
            NotificationEvent::LongStayCritical,
            "Very long stay",
            vec![StaffRole::Manager],
            AlertPriority::High,
        ),
    };
    let message = format!(
        "Table {} has been seated for {} minutes",
        session.table, seated_minutes
    );

    assistance
        .create_alert(CreateAlert {
            restaurant: restaurant.to_string(),
            session: Some(id.clone()),
            table: session.table.to_string(),
            alert_type,
            message: message.clone(),
            target_roles: Some(roles.clone()),
            priority: Some(priority),
        })
        .await
        .map_err(|e| e.to_string())?;
    deps.notifier
        .send(job_notification(
            restaurant,
            event,
            title,
            message,
            &session.table.to_string(),
            Some(id.clone()),
            roles,
            priority,
        ))
        .await;

    match tier {
        Tier::Warning => assistance.mark_long_stay_warned(&id).await,
        Tier::Critical => assistance.mark_long_stay_escalated(&id).await,
    }
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::sessions::test_support::{backdate, fixtures, seat_session, start_test_session};

    #[tokio::test]
    async fn warning_then_critical_fires_once_each() {
        let fx = fixtures().await;
        let notifier = Arc::new(RecordingNotifier::new());
        let deps = JobDeps::new(fx.db.clone(), notifier.clone());

        let session_id = start_test_session(&fx).await;
        seat_session(&fx, &session_id).await;
        backdate(&fx.db, &session_id, "seated_at", 95).await;

        let report = run_long_stay_check(&deps, &fx.restaurant_id).await;
        assert_eq!(report.warnings, 1);
        assert_eq!(report.criticals, 0);

        // No repeat while still under the critical threshold
        let report = run_long_stay_check(&deps, &fx.restaurant_id).await;
        assert_eq!(report.warnings, 0);
        assert_eq!(report.criticals, 0);

        backdate(&fx.db, &session_id, "seated_at", 125).await;
        let report = run_long_stay_check(&deps, &fx.restaurant_id).await;
        assert_eq!(report.criticals, 1);
        assert_eq!(report.warnings, 0);

        let report = run_long_stay_check(&deps, &fx.restaurant_id).await;
        assert_eq!(report.criticals, 0);

        let events: Vec<_> = notifier.sent().iter().map(|n| n.event).collect();
        assert_eq!(
            events,
            vec![
                NotificationEvent::LongStayWarning,
                NotificationEvent::LongStayCritical
            ]
        );
    }

    #[tokio::test]
    async fn session_past_both_thresholds_escalates_without_a_warning() {
        let fx = fixtures().await;
        let notifier = Arc::new(RecordingNotifier::new());
        let deps = JobDeps::new(fx.db.clone(), notifier.clone());

        let session_id = start_test_session(&fx).await;
        seat_session(&fx, &session_id).await;
        backdate(&fx.db, &session_id, "seated_at", 150).await;

        let report = run_long_stay_check(&deps, &fx.restaurant_id).await;
        assert_eq!(report.criticals, 1);
        assert_eq!(report.warnings, 0);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event, NotificationEvent::LongStayCritical);
        assert_eq!(sent[0].priority, AlertPriority::High);
        assert_eq!(sent[0].target_roles, vec![StaffRole::Manager]);
    }
}
