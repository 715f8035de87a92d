//! Administrative circulation endpoints: the overdue sweep and the fine
//! batch. Both always succeed and report how many loans they touched.

use axum::{extract::State, Json};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, AppState};

/// Sweep request
#[derive(Deserialize, Default, ToSchema)]
pub struct SweepRequest {
    /// Reference date; defaults to today
    pub as_of_date: Option<NaiveDate>,
}

/// Fine batch request
#[derive(Deserialize, Default, ToSchema)]
pub struct CalculateFinesRequest {
    /// Fine per overdue day; defaults to the configured rate
    #[schema(value_type = Option<f64>)]
    pub fine_per_day: Option<Decimal>,
    /// Reference date; defaults to today
    pub as_of_date: Option<NaiveDate>,
}

/// Batch result
#[derive(Serialize, ToSchema)]
pub struct BatchResponse {
    /// Number of loans touched
    pub count: u64,
}

/// Promote borrowed loans past their due date to overdue
#[utoipa::path(
    post,
    path = "/admin/sweep-overdue",
    tag = "admin",
    request_body = SweepRequest,
    responses(
        (status = 200, description = "Sweep completed", body = BatchResponse)
    )
)]
pub async fn sweep_overdue(
    State(state): State<AppState>,
    Json(request): Json<SweepRequest>,
) -> AppResult<Json<BatchResponse>> {
    let count = state.services.sweeper.sweep_overdue(request.as_of_date).await?;
    Ok(Json(BatchResponse { count }))
}

/// Recompute fines for unreturned overdue loans
#[utoipa::path(
    post,
    path = "/admin/calculate-fines",
    tag = "admin",
    request_body = CalculateFinesRequest,
    responses(
        (status = 200, description = "Fines recomputed", body = BatchResponse)
    )
)]
pub async fn calculate_fines(
    State(state): State<AppState>,
    Json(request): Json<CalculateFinesRequest>,
) -> AppResult<Json<BatchResponse>> {
    let count = state
        .services
        .sweeper
        .calculate_fines(request.fine_per_day, request.as_of_date)
        .await?;
    Ok(Json(BatchResponse { count }))
}
