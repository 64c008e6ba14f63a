//! Assistance check: sessions and scans stuck before ordering
//!
//! Four candidate pools per restaurant: CREATED sessions stuck on the OTP
//! screen, SEATED sessions with no first order, and the session-less scan
//! equivalents of both (nudges, no alert record). Session candidates get an
//! alert row plus a broadcast; scan candidates only get the broadcast.

use serde::Serialize;

use crate::db::models::{AlertPriority, AlertType, StaffRole};
use crate::notify::{Notification, NotificationEvent};
use crate::sessions::{AssistanceTimerService, CreateAlert, QrScanTracker};
use crate::utils::time;

use super::JobDeps;

/// Counts of what one assistance run produced
#[derive(Debug, Default, Clone, Serialize)]
pub struct AssistanceReport {
    pub otp_alerts: usize,
    pub order_alerts: usize,
    pub scan_otp_nudges: usize,
    pub scan_browse_nudges: usize,
    pub errors: Vec<String>,
}

impl AssistanceReport {
    pub fn merge(&mut self, other: AssistanceReport) {
        self.otp_alerts += other.otp_alerts;
        self.order_alerts += other.order_alerts;
        self.scan_otp_nudges += other.scan_otp_nudges;
        self.scan_browse_nudges += other.scan_browse_nudges;
        self.errors.extend(other.errors);
    }
}

/// One assistance sweep over a restaurant. Never fails as a whole; item
/// failures land in `errors`.
pub async fn run_assistance_check(deps: &JobDeps, restaurant: &str) -> AssistanceReport {
    let assistance = AssistanceTimerService::new(deps.db.clone());
    let scans = QrScanTracker::new(deps.db.clone());
    let mut report = AssistanceReport::default();

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

    // --- Sessions stuck on the OTP screen ---
    match assistance
        .check_otp_help_needed(restaurant, settings.otp_help_minutes)
        .await
    {
        Ok(sessions) => {
            for session in sessions {
                let result = async {
                    let id = session
                        .id
                        .as_ref()
                        .ok_or("session without id".to_string())?
                        .to_string();
                    let message = format!(
                        "Table {} scanned {} min ago without entering the code",
                        session.table,
                        minutes_since(session.qr_scanned_at),
                    );
                    assistance
                        .create_alert(CreateAlert {
                            restaurant: restaurant.to_string(),
                            session: Some(id.clone()),
                            table: session.table.to_string(),
                            alert_type: AlertType::OtpHelp,
                            message: message.clone(),
                            target_roles: Some(vec![StaffRole::Waiter]),
                            priority: None,
                        })
                        .await
                        .map_err(|e| e.to_string())?;
                    deps.notifier
                        .send(job_notification(
                            restaurant,
                            NotificationEvent::OtpHelp,
                            "Guest may need help",
                            message,
                            &session.table.to_string(),
                            Some(id.clone()),
                            vec![StaffRole::Waiter],
                            AlertPriority::Normal,
                        ))
                        .await;
                    assistance
                        .mark_otp_help_notified(&id)
                        .await
                        .map_err(|e| e.to_string())
                }
                .await;
                match result {
                    Ok(()) => report.otp_alerts += 1,
                    Err(e) => report.errors.push(format!("otp help: {e}")),
                }
            }
        }
        Err(e) => report.errors.push(format!("otp help query: {e}")),
    }

    // --- Seated sessions with no first order ---
    match assistance
        .check_order_help_needed(restaurant, settings.order_help_minutes)
        .await
    {
        Ok(sessions) => {
            for session in sessions {
                let result = async {
                    let id = session
                        .id
                        .as_ref()
                        .ok_or("session without id".to_string())?
                        .to_string();
                    let message = format!(
                        "Table {} seated {} min ago without ordering",
                        session.table,
                        minutes_since(session.seated_at),
                    );
                    assistance
                        .create_alert(CreateAlert {
                            restaurant: restaurant.to_string(),
                            session: Some(id.clone()),
                            table: session.table.to_string(),
                            alert_type: AlertType::OrderHelp,
                            message: message.clone(),
                            target_roles: Some(vec![StaffRole::Waiter]),
                            priority: None,
                        })
                        .await
                        .map_err(|e| e.to_string())?;
                    deps.notifier
                        .send(job_notification(
                            restaurant,
                            NotificationEvent::OrderHelp,
                            "Table has not ordered",
                            message,
                            &session.table.to_string(),
                            Some(id.clone()),
                            vec![StaffRole::Waiter],
                            AlertPriority::Normal,
                        ))
                        .await;
                    assistance
                        .mark_order_help_notified(&id)
                        .await
                        .map_err(|e| e.to_string())
                }
                .await;
                match result {
                    Ok(()) => report.order_alerts += 1,
                    Err(e) => report.errors.push(format!("order help: {e}")),
                }
            }
        }
        Err(e) => report.errors.push(format!("order help query: {e}")),
    }

    // --- Session-less scan nudges ---
    match scans
        .scans_pending_otp_help(restaurant, settings.otp_help_minutes)
        .await
    {
        Ok(events) => {
            for event in events {
                let result = async {
                    let id = event
                        .id
                        .as_ref()
                        .ok_or("scan event without id".to_string())?
                        .to_string();
                    deps.notifier
                        .send(job_notification(
                            restaurant,
                            NotificationEvent::OtpHelp,
                            "Scan without code entry",
                            format!(
                                "Table {} was scanned but the code was never entered",
                                event.table
                            ),
                            &event.table.to_string(),
                            None,
                            vec![StaffRole::Waiter],
                            AlertPriority::Normal,
                        ))
                        .await;
                    scans
                        .mark_otp_help_notified(&id)
                        .await
                        .map_err(|e| e.to_string())
                }
                .await;
                match result {
                    Ok(()) => report.scan_otp_nudges += 1,
                    Err(e) => report.errors.push(format!("scan otp nudge: {e}")),
                }
            }
        }
        Err(e) => report.errors.push(format!("scan otp query: {e}")),
    }

    match scans
        .scans_pending_browse_help(restaurant, settings.order_help_minutes)
        .await
    {
        Ok(events) => {
            for event in events {
                let result = async {
                    let id = event
                        .id
                        .as_ref()
                        .ok_or("scan event without id".to_string())?
                        .to_string();
                    deps.notifier
                        .send(job_notification(
                            restaurant,
                            NotificationEvent::OrderHelp,
                            "Browsing without ordering",
                            format!(
                                "Table {} entered the code but has not ordered",
                                event.table
                            ),
                            &event.table.to_string(),
                            None,
                            vec![StaffRole::Waiter],
                            AlertPriority::Normal,
                        ))
                        .await;
                    scans
                        .mark_browse_help_notified(&id)
                        .await
                        .map_err(|e| e.to_string())
                }
                .await;
                match result {
                    Ok(()) => report.scan_browse_nudges += 1,
                    Err(e) => report.errors.push(format!("scan browse nudge: {e}")),
                }
            }
        }
        Err(e) => report.errors.push(format!("scan browse query: {e}")),
    }

    report
}

fn minutes_since(at: Option<i64>) -> i64 {
    at.map(|at| time::elapsed_minutes(at, time::now_millis()))
        .unwrap_or(0)
}

#[allow(clippy::too_many_arguments)]
pub(super) fn job_notification(
    restaurant: &str,
    event: NotificationEvent,
    title: &str,
    message: String,
    table: &str,
    session: Option<String>,
    target_roles: Vec<StaffRole>,
    priority: AlertPriority,
) -> Notification {
    Notification {
        restaurant: restaurant.to_string(),
        event,
        title: title.to_string(),
        message,
        table: Some(table.to_string()),
        session,
        target_roles,
        priority,
        sent_at: time::now_millis(),
    }
}
