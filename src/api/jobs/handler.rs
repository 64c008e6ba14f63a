//! Job trigger API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::jobs::{
    AssistanceReport, CleaningAlertReport, LongStayReport, run_assistance_check,
    run_assistance_check_all, run_cleaning_alert_check, run_cleaning_alert_check_all,
    run_long_stay_check, run_long_stay_check_all,
};
use crate::utils::{AppResponse, AppResult, ok};

#[derive(Debug, Deserialize, Default)]
pub struct JobQuery {
    pub restaurant: Option<String>,
}

/// POST /api/jobs/assistance/run
pub async fn run_assistance(
    State(state): State<ServerState>,
    Query(query): Query<JobQuery>,
) -> AppResult<Json<AppResponse<AssistanceReport>>> {
    let deps = state.job_deps();
    let report = match query.restaurant {
        Some(restaurant) => run_assistance_check(&deps, &restaurant).await,
        None => run_assistance_check_all(&deps).await?,
    };
    Ok(ok(report))
}

/// POST /api/jobs/long-stay/run
pub async fn run_long_stay(
    State(state): State<ServerState>,
    Query(query): Query<JobQuery>,
) -> AppResult<Json<AppResponse<LongStayReport>>> {
    let deps = state.job_deps();
    let report = match query.restaurant {
        Some(restaurant) => run_long_stay_check(&deps, &restaurant).await,
        None => run_long_stay_check_all(&deps).await?,
    };
    Ok(ok(report))
}

/// POST /api/jobs/cleaning/run
pub async fn run_cleaning(
    State(state): State<ServerState>,
    Query(query): Query<JobQuery>,
) -> AppResult<Json<AppResponse<CleaningAlertReport>>> {
    let deps = state.job_deps();
    let report = match query.restaurant {
        Some(restaurant) => run_cleaning_alert_check(&deps, &restaurant).await,
        None => run_cleaning_alert_check_all(&deps).await?,
    };
    Ok(ok(report))
}
