//! Poll-job sweeps against a populated floor
//!
//! Drives the three background checks through realistic multi-step flows
//! and pins the dedupe behavior: every tier fires exactly once per session
//! no matter how often the sweep runs.

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use bhoj_edge::db::DbService;
use bhoj_edge::db::models::{AlertType, DiningTableCreate, StaffRole};
use bhoj_edge::db::repository::{
    DiningTableRepository, RestaurantRepository, SessionAlertRepository, TableSessionRepository,
};
use bhoj_edge::jobs::{
    JobDeps, run_assistance_check_all, run_cleaning_alert_check_all, run_long_stay_check_all,
};
use bhoj_edge::notify::{NotificationEvent, RecordingNotifier};
use bhoj_edge::sessions::SessionService;
use bhoj_edge::utils::time;

struct Floor {
    db: Surreal<Db>,
    deps: JobDeps,
    notifier: Arc<RecordingNotifier>,
    service: SessionService,
    restaurant_id: String,
}

async fn floor() -> Floor {
    let db = DbService::open_in_memory().await.unwrap().db;
    let restaurant = RestaurantRepository::new(db.clone())
        .create("Chai Corner")
        .await
        .unwrap();
    let restaurant_id = restaurant.id.unwrap().to_string();
    let notifier = Arc::new(RecordingNotifier::new());
    Floor {
        deps: JobDeps::new(db.clone(), notifier.clone()),
        service: SessionService::new(db.clone(), notifier.clone()),
        db,
        notifier,
        restaurant_id,
    }
}

async fn add_table(floor: &Floor, name: &str) -> String {
    DiningTableRepository::new(floor.db.clone())
        .create(DiningTableCreate {
            restaurant: floor.restaurant_id.parse().unwrap(),
            name: name.to_string(),
            zone_name: None,
            capacity: Some(2),
        })
        .await
        .unwrap()
        .id
        .unwrap()
        .to_string()
}

/// Rewind a millis field of any record to `minutes` ago
async fn backdate(db: &Surreal<Db>, id: &str, field: &str, minutes: i64) {
    let thing: surrealdb::RecordId = id.parse().unwrap();
    db.query(format!("UPDATE $thing SET {field} = $value"))
        .bind(("thing", thing))
        .bind(("value", time::minutes_ago(minutes, time::now_millis())))
        .await
        .unwrap()
        .check()
        .unwrap();
}

fn events_of(notifier: &RecordingNotifier) -> Vec<NotificationEvent> {
    notifier.sent().iter().map(|n| n.event).collect()
}

#[tokio::test]
async fn stalled_sessions_alert_once_across_repeated_sweeps() {
    let floor = floor().await;
    let table_a = add_table(&floor, "A1").await;
    let table_b = add_table(&floor, "B1").await;

    // A1 scanned three minutes ago, still on the OTP screen
    let stuck = floor
        .service
        .start_session(&floor.restaurant_id, &table_a, 0, None)
        .await
        .unwrap();
    let stuck_id = stuck.id.unwrap().to_string();
    backdate(&floor.db, &stuck_id, "qr_scanned_at", 3).await;

    // B1 seated six minutes ago, no order yet
    let idle = floor
        .service
        .start_session(&floor.restaurant_id, &table_b, 2, None)
        .await
        .unwrap();
    let idle_id = idle.id.unwrap().to_string();
    TableSessionRepository::new(floor.db.clone())
        .mark_seated(&idle_id, time::now_millis())
        .await
        .unwrap();
    backdate(&floor.db, &idle_id, "seated_at", 6).await;

    let report = run_assistance_check_all(&floor.deps).await.unwrap();
    assert_eq!(report.otp_alerts, 1);
    assert_eq!(report.order_alerts, 1);
    assert!(report.errors.is_empty());

    let events = events_of(&floor.notifier);
    assert!(events.contains(&NotificationEvent::OtpHelp));
    assert!(events.contains(&NotificationEvent::OrderHelp));

    let alerts = SessionAlertRepository::new(floor.db.clone())
        .find_unresolved(&floor.restaurant_id)
        .await
        .unwrap();
    let mut types: Vec<AlertType> = alerts.iter().map(|a| a.alert_type).collect();
    types.sort_by_key(|t| format!("{t:?}"));
    assert_eq!(types, vec![AlertType::OrderHelp, AlertType::OtpHelp]);

    // The markers hold on every later sweep
    let again = run_assistance_check_all(&floor.deps).await.unwrap();
    assert_eq!(again.otp_alerts, 0);
    assert_eq!(again.order_alerts, 0);
    assert_eq!(
        SessionAlertRepository::new(floor.db.clone())
            .find_unresolved(&floor.restaurant_id)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn long_stay_warning_then_critical_each_fire_once() {
    let floor = floor().await;
    let table = add_table(&floor, "L1").await;

    let session = floor
        .service
        .start_session(&floor.restaurant_id, &table, 2, None)
        .await
        .unwrap();
    let session_id = session.id.unwrap().to_string();
    TableSessionRepository::new(floor.db.clone())
        .mark_seated(&session_id, time::now_millis())
        .await
        .unwrap();
    backdate(&floor.db, &session_id, "seated_at", 95).await;

    let report = run_long_stay_check_all(&floor.deps).await.unwrap();
    assert_eq!(report.warnings, 1);
    assert_eq!(report.criticals, 0);

    // Past the second tier now
    backdate(&floor.db, &session_id, "seated_at", 125).await;
    let report = run_long_stay_check_all(&floor.deps).await.unwrap();
    assert_eq!(report.warnings, 0);
    assert_eq!(report.criticals, 1);

    let report = run_long_stay_check_all(&floor.deps).await.unwrap();
    assert_eq!(report.warnings, 0);
    assert_eq!(report.criticals, 0);

    let events = events_of(&floor.notifier);
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == NotificationEvent::LongStayWarning)
            .count(),
        1
    );
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == NotificationEvent::LongStayCritical)
            .count(),
        1
    );
}

#[tokio::test]
async fn ended_sessions_are_invisible_to_the_long_stay_sweep() {
    let floor = floor().await;
    let table = add_table(&floor, "E1").await;

    let session = floor
        .service
        .start_session(&floor.restaurant_id, &table, 2, None)
        .await
        .unwrap();
    let session_id = session.id.unwrap().to_string();
    TableSessionRepository::new(floor.db.clone())
        .mark_seated(&session_id, time::now_millis())
        .await
        .unwrap();
    floor
        .service
        .end_session_and_rotate_otp(&session_id, None, None)
        .await
        .unwrap();
    backdate(&floor.db, &session_id, "seated_at", 300).await;

    let report = run_long_stay_check_all(&floor.deps).await.unwrap();
    assert_eq!(report.warnings, 0);
    assert_eq!(report.criticals, 0);
}

#[tokio::test]
async fn cleaning_delay_alerts_then_escalates_then_goes_quiet() {
    let floor = floor().await;
    let table = add_table(&floor, "C1").await;

    let session = floor
        .service
        .start_session(&floor.restaurant_id, &table, 2, None)
        .await
        .unwrap();
    let session_id = session.id.unwrap().to_string();
    let outcome = floor
        .service
        .end_session_and_rotate_otp(&session_id, None, None)
        .await
        .unwrap();
    let record_id = outcome.cleaning_record.id.unwrap().to_string();

    // Past the alert threshold, below twice it
    backdate(&floor.db, &record_id, "requested_at", 12).await;
    let report = run_cleaning_alert_check_all(&floor.deps).await.unwrap();
    assert_eq!(report.alerts, 1);
    assert_eq!(report.escalations, 0);

    backdate(&floor.db, &record_id, "requested_at", 25).await;
    let report = run_cleaning_alert_check_all(&floor.deps).await.unwrap();
    assert_eq!(report.alerts, 0);
    assert_eq!(report.escalations, 1);

    // Once the table is cleaned the record never surfaces again
    bhoj_edge::sessions::CleaningService::new(floor.db.clone())
        .mark_cleaned(&record_id, Some("staff-3".into()))
        .await
        .unwrap();
    let report = run_cleaning_alert_check_all(&floor.deps).await.unwrap();
    assert_eq!(report.alerts, 0);
    assert_eq!(report.escalations, 0);
}

#[tokio::test]
async fn record_first_seen_past_double_threshold_escalates_without_an_alert() {
    let floor = floor().await;
    let table = add_table(&floor, "C2").await;

    let session = floor
        .service
        .start_session(&floor.restaurant_id, &table, 2, None)
        .await
        .unwrap();
    let session_id = session.id.unwrap().to_string();
    let outcome = floor
        .service
        .end_session_and_rotate_otp(&session_id, None, None)
        .await
        .unwrap();
    let record_id = outcome.cleaning_record.id.unwrap().to_string();

    // 21 minutes with a 10-minute threshold: the waiter tier is skipped
    backdate(&floor.db, &record_id, "requested_at", 21).await;
    let report = run_cleaning_alert_check_all(&floor.deps).await.unwrap();
    assert_eq!(report.alerts, 0);
    assert_eq!(report.escalations, 1);

    let alerts = SessionAlertRepository::new(floor.db.clone())
        .find_unresolved(&floor.restaurant_id)
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::CleaningDelay);
    assert_eq!(alerts[0].target_roles, vec![StaffRole::Manager]);

    let report = run_cleaning_alert_check_all(&floor.deps).await.unwrap();
    assert_eq!(report.alerts, 0);
    assert_eq!(report.escalations, 0);
}

#[tokio::test]
async fn cleaned_records_stay_quiet() {
    let floor = floor().await;
    let table = add_table(&floor, "C3").await;

    let session = floor
        .service
        .start_session(&floor.restaurant_id, &table, 2, None)
        .await
        .unwrap();
    let session_id = session.id.unwrap().to_string();
    let outcome = floor
        .service
        .end_session_and_rotate_otp(&session_id, None, None)
        .await
        .unwrap();
    let record_id = outcome.cleaning_record.id.unwrap().to_string();
    backdate(&floor.db, &record_id, "requested_at", 30).await;
    bhoj_edge::sessions::CleaningService::new(floor.db.clone())
        .mark_cleaned(&record_id, Some("staff-3".into()))
        .await
        .unwrap();
    let report = run_cleaning_alert_check_all(&floor.deps).await.unwrap();
    assert_eq!(report.alerts, 0);
    assert_eq!(report.escalations, 0);
}
