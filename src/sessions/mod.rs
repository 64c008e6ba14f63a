//! Session domain services
//!
//! Everything between the raw repositories and the HTTP layer: scan
//! correlation, OTP verification, the session lifecycle, stalled-session
//! detection and cleaning cycles. Services are cheap handles over a shared
//! database connection; handlers construct them per request.

pub mod assistance;
pub mod cleaning;
pub mod duration;
pub mod otp;
pub mod qr_scan;
pub mod service;

pub use assistance::{AssistanceTimerService, CreateAlert};
pub use cleaning::{CleaningService, CleaningStats};
pub use duration::{
    PhaseTimestamps, StayAlertLevel, StayClassification, StayColor, classify,
    determine_session_phase,
};
pub use otp::{OtpService, OtpVerification};
pub use qr_scan::QrScanTracker;
pub use service::{OtpSeating, SessionEndOutcome, SessionService, SessionSummary, TimelineEntry};

#[cfg(test)]
pub(crate) mod test_support {
    use surrealdb::Surreal;
    use surrealdb::engine::local::Db;

    use crate::db::DbService;
    use crate::db::models::{DiningTableCreate, TableSessionCreate};
    use crate::db::repository::{
        DiningTableRepository, RestaurantRepository, TableSessionRepository,
    };
    use crate::utils::time;

    /// A fresh in-memory database with one restaurant and one table
    pub struct Fixtures {
        pub db: Surreal<Db>,
        pub restaurant_id: String,
        pub table_id: String,
    }

    pub async fn fixtures() -> Fixtures {
        let service = DbService::open_in_memory().await.unwrap();
        let db = service.db;

        let restaurant = RestaurantRepository::new(db.clone())
            .create("Test Bistro")
            .await
            .unwrap();
        let restaurant_id = restaurant.id.unwrap().to_string();

        let table = DiningTableRepository::new(db.clone())
            .create(DiningTableCreate {
                restaurant: restaurant_id.parse().unwrap(),
                name: "T1".to_string(),
                zone_name: Some("Main".to_string()),
                capacity: Some(4),
            })
            .await
            .unwrap();
        let table_id = table.id.unwrap().to_string();

        Fixtures {
            db,
            restaurant_id,
            table_id,
        }
    }

    /// Rewind a timestamp field so threshold queries see an aged record.
    /// Test-only, so the field name is interpolated directly.
    pub async fn backdate(db: &Surreal<Db>, id: &str, field: &str, minutes: i64) {
        let thing: surrealdb::RecordId = id.parse().unwrap();
        let value = time::minutes_ago(minutes, time::now_millis());
        db.query(format!("UPDATE $thing SET {field} = $value"))
            .bind(("thing", thing))
            .bind(("value", value))
            .await
            .unwrap();
    }

    /// Open an ACTIVE session in CREATED phase on the fixture table
    pub async fn start_test_session(fx: &Fixtures) -> String {
        let session = TableSessionRepository::new(fx.db.clone())
            .create(TableSessionCreate {
                restaurant: fx.restaurant_id.parse().unwrap(),
                table: fx.table_id.parse().unwrap(),
                guest_count: 2,
                qr_scanned_at: Some(time::now_millis()),
            })
            .await
            .unwrap();
        session.id.unwrap().to_string()
    }

    /// Verify the OTP stamp and move the session to SEATED
    pub async fn seat_session(fx: &Fixtures, session_id: &str) {
        let repo = TableSessionRepository::new(fx.db.clone());
        repo.mark_seated(session_id, time::now_millis())
            .await
            .unwrap();
        repo.set_phase(session_id, crate::db::models::SessionPhase::Seated)
            .await
            .unwrap();
    }
}
