//! End-to-end session close-out behavior
//!
//! The end operation is the one orchestration point that touches four
//! tables; these tests pin its contract: precondition first, OTP rotation,
//! exactly one cleaning cycle, alert sweep.

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use bhoj_edge::db::DbService;
use bhoj_edge::db::models::{AlertStatus, DiningTableCreate, SessionStatus, TableStatus};
use bhoj_edge::db::repository::{
    CleaningRecordRepository, DiningTableRepository, RestaurantRepository, SessionAlertRepository,
};
use bhoj_edge::notify::RecordingNotifier;
use bhoj_edge::sessions::{OtpService, SessionService};
use bhoj_edge::utils::AppError;

struct Env {
    db: Surreal<Db>,
    restaurant_id: String,
    table_id: String,
    service: SessionService,
    notifier: Arc<RecordingNotifier>,
}

async fn env() -> Env {
    let db = DbService::open_in_memory().await.unwrap().db;
    let restaurant = RestaurantRepository::new(db.clone())
        .create("Spice Route")
        .await
        .unwrap();
    let restaurant_id = restaurant.id.unwrap().to_string();
    let table = DiningTableRepository::new(db.clone())
        .create(DiningTableCreate {
            restaurant: restaurant_id.parse().unwrap(),
            name: "T7".to_string(),
            zone_name: None,
            capacity: Some(4),
        })
        .await
        .unwrap();
    let table_id = table.id.unwrap().to_string();
    let notifier = Arc::new(RecordingNotifier::new());
    let service = SessionService::new(db.clone(), notifier.clone());
    Env {
        db,
        restaurant_id,
        table_id,
        service,
        notifier,
    }
}

#[tokio::test]
async fn ending_rotates_the_otp_and_opens_one_cleaning_cycle() {
    let env = env().await;

    let (_, otp_before) = OtpService::new(env.db.clone())
        .regenerate_manual(&env.table_id, None)
        .await
        .unwrap();

    let seating = env
        .service
        .verify_otp_and_seat(&env.restaurant_id, &env.table_id, &otp_before, None)
        .await
        .unwrap();
    let session_id = seating.session.unwrap().id.unwrap().to_string();
    env.service.request_bill(&session_id).await.unwrap();

    let outcome = env
        .service
        .end_session_and_rotate_otp(&session_id, Some("cashier-2".into()), None)
        .await
        .unwrap();

    // OTP differs from the code the ended party used
    assert_ne!(outcome.new_otp, otp_before);
    let table = DiningTableRepository::new(env.db.clone())
        .require(&env.table_id)
        .await
        .unwrap();
    assert_eq!(table.current_otp.as_deref(), Some(outcome.new_otp.as_str()));
    assert_eq!(table.status, TableStatus::Cleaning);

    // Exactly one open cleaning record for the session
    let records = CleaningRecordRepository::new(env.db.clone())
        .find_by_session(&session_id)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].cleaned_at.is_none());

    // The bill-request alert was swept with a resolution note
    assert_eq!(outcome.resolved_alerts, 1);
    let open = SessionAlertRepository::new(env.db.clone())
        .find_open_for_session(&session_id)
        .await
        .unwrap();
    assert!(open.is_empty());
    let all = SessionAlertRepository::new(env.db.clone())
        .find_unresolved(&env.restaurant_id)
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn ending_a_completed_session_fails_before_any_side_effect() {
    let env = env().await;

    let session = env
        .service
        .start_session(&env.restaurant_id, &env.table_id, 2, None)
        .await
        .unwrap();
    let session_id = session.id.unwrap().to_string();
    let first = env
        .service
        .end_session_and_rotate_otp(&session_id, None, None)
        .await
        .unwrap();
    assert_eq!(first.session.status, SessionStatus::Completed);

    let notifications_before = env.notifier.sent().len();
    let otp_before = DiningTableRepository::new(env.db.clone())
        .require(&env.table_id)
        .await
        .unwrap()
        .current_otp;

    let err = env
        .service
        .end_session_and_rotate_otp(&session_id, None, None)
        .await;
    assert!(matches!(err, Err(AppError::BusinessRule(_))));

    // No second rotation, no second cleaning cycle, no extra broadcast
    let otp_after = DiningTableRepository::new(env.db.clone())
        .require(&env.table_id)
        .await
        .unwrap()
        .current_otp;
    assert_eq!(otp_after, otp_before);
    let records = CleaningRecordRepository::new(env.db.clone())
        .find_by_session(&session_id)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(env.notifier.sent().len(), notifications_before);
}

#[tokio::test]
async fn ending_an_unknown_session_is_not_found() {
    let env = env().await;
    let err = env
        .service
        .end_session_and_rotate_otp("table_session:missing", None, None)
        .await;
    assert!(matches!(err, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn alert_sweep_notes_the_reason() {
    let env = env().await;

    let session = env
        .service
        .start_session(&env.restaurant_id, &env.table_id, 2, None)
        .await
        .unwrap();
    let session_id = session.id.unwrap().to_string();
    env.service
        .request_assistance(&session_id, None)
        .await
        .unwrap();

    env.service
        .end_session_and_rotate_otp(&session_id, None, None)
        .await
        .unwrap();

    let mut result = env
        .db
        .query("SELECT * FROM session_alert WHERE session = $session")
        .bind(("session", session_id.clone()))
        .await
        .unwrap();
    let alerts: Vec<bhoj_edge::db::models::SessionAlert> = result.take(0).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].status, AlertStatus::Resolved);
    assert_eq!(alerts[0].resolution_note.as_deref(), Some("Session ended"));
}
