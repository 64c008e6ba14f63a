//! Table OTP service
//!
//! Each table displays a short numeric code guests must enter before they
//! can self-order. The code is rotated on every session end so the next
//! party can never reuse a stale one. Codes are time-scoped, not globally
//! unique - a collision with an old code for the same table is acceptable.

use rand::Rng;
use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{DiningTable, OtpHistory, OtpReason};
use crate::db::repository::{DiningTableRepository, OtpHistoryRepository};
use crate::utils::{AppError, AppResult, time};

/// Outcome of an OTP verification. Guest mistakes are values, not errors.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OtpVerification {
    Valid,
    TableNotFound,
    OtpNotSet,
    Invalid,
}

impl OtpVerification {
    pub fn is_valid(self) -> bool {
        self == OtpVerification::Valid
    }
}

/// Table access code service
#[derive(Clone)]
pub struct OtpService {
    db: Surreal<Db>,
}

impl OtpService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    fn tables(&self) -> DiningTableRepository {
        DiningTableRepository::new(self.db.clone())
    }

    fn history(&self) -> OtpHistoryRepository {
        OtpHistoryRepository::new(self.db.clone())
    }

    /// Uniform random 3-digit code in [100, 999]
    pub fn generate_otp() -> String {
        rand::thread_rng().gen_range(100..=999).to_string()
    }

    /// Exact match against the table's current code
    pub async fn verify(&self, table_id: &str, code: &str) -> AppResult<OtpVerification> {
        let Some(table) = self.tables().find_by_id(table_id).await? else {
            return Ok(OtpVerification::TableNotFound);
        };
        let Some(current) = table.current_otp else {
            return Ok(OtpVerification::OtpNotSet);
        };
        if current == code {
            Ok(OtpVerification::Valid)
        } else {
            Ok(OtpVerification::Invalid)
        }
    }

    /// Rotate the code as part of session completion. Must run before the
    /// table is re-exposed to new scans; the history row links the session
    /// that consumed the outgoing code.
    pub async fn rotate_after_session(
        &self,
        table_id: &str,
        session_id: &str,
    ) -> AppResult<(DiningTable, String)> {
        let table = self.tables().require(table_id).await?;
        let new_otp = Self::generate_otp();
        let now = time::now_millis();

        let updated = self.tables().set_otp(table_id, &new_otp, now).await?;
        let session = session_id
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid session ID: {session_id}")))?;
        self.history()
            .append(
                table.restaurant.clone(),
                updated.id.clone().ok_or_else(|| {
                    AppError::internal("Table record without id after update".to_string())
                })?,
                &new_otp,
                OtpReason::CleaningComplete,
                Some(session),
                None,
                now,
            )
            .await?;

        tracing::info!(table = %table_id, session = %session_id, "Table OTP rotated after session end");
        Ok((updated, new_otp))
    }

    /// Staff-triggered rotation, logged with reason `manual`
    pub async fn regenerate_manual(
        &self,
        table_id: &str,
        issued_by: Option<String>,
    ) -> AppResult<(DiningTable, String)> {
        let table = self.tables().require(table_id).await?;
        let new_otp = Self::generate_otp();
        let now = time::now_millis();

        let updated = self.tables().set_otp(table_id, &new_otp, now).await?;
        self.history()
            .append(
                table.restaurant.clone(),
                updated.id.clone().ok_or_else(|| {
                    AppError::internal("Table record without id after update".to_string())
                })?,
                &new_otp,
                OtpReason::Manual,
                None,
                issued_by,
                now,
            )
            .await?;
        Ok((updated, new_otp))
    }

    /// Full issuance log for a table
    pub async fn history_for_table(&self, table_id: &str) -> AppResult<Vec<OtpHistory>> {
        Ok(self.history().find_by_table(table_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::test_support::fixtures;

    #[test]
    fn generated_otp_is_three_digit_numeric() {
        for _ in 0..500 {
            let otp = OtpService::generate_otp();
            assert_eq!(otp.len(), 3);
            let n: u32 = otp.parse().unwrap();
            assert!((100..=999).contains(&n), "out of range: {n}");
        }
    }

    #[tokio::test]
    async fn verify_distinguishes_failure_modes() {
        let fx = fixtures().await;
        let service = OtpService::new(fx.db.clone());

        // No code set yet
        assert_eq!(
            service.verify(&fx.table_id, "123").await.unwrap(),
            OtpVerification::OtpNotSet
        );

        let (_, otp) = service.regenerate_manual(&fx.table_id, None).await.unwrap();
        assert_eq!(
            service.verify(&fx.table_id, &otp).await.unwrap(),
            OtpVerification::Valid
        );
        assert_eq!(
            service.verify(&fx.table_id, "000").await.unwrap(),
            OtpVerification::Invalid
        );
        assert_eq!(
            service
                .verify("dining_table:missing", "123")
                .await
                .unwrap(),
            OtpVerification::TableNotFound
        );
    }

    #[tokio::test]
    async fn manual_regeneration_appends_history() {
        let fx = fixtures().await;
        let service = OtpService::new(fx.db.clone());

        service
            .regenerate_manual(&fx.table_id, Some("manager-1".into()))
            .await
            .unwrap();
        service.regenerate_manual(&fx.table_id, None).await.unwrap();

        let history = service.history_for_table(&fx.table_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|h| h.reason == OtpReason::Manual));
    }
}
