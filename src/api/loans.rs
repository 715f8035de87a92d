//! Loan circulation endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{CreateLoan, Loan},
    AppState,
};

/// Return loan request
#[derive(Deserialize, ToSchema)]
pub struct ReturnLoanRequest {
    /// Return date; defaults to today
    pub return_date: Option<NaiveDate>,
    /// Fine override; when absent the stored amount stands
    #[schema(value_type = Option<f64>)]
    pub fine_amount: Option<Decimal>,
}

/// Extend loan request
#[derive(Deserialize, ToSchema)]
pub struct ExtendLoanRequest {
    /// New due date, strictly after the current one
    pub due_date: NaiveDate,
}

/// Create a new loan (borrow a book)
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 404, description = "Book or member not found"),
        (status = 409, description = "No available copies"),
        (status = 422, description = "Member not active or has overdue loans")
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state.services.loans.borrow(request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Get a loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan", body = Loan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get_loan(loan_id).await?;
    Ok(Json(loan))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = ReturnLoanRequest,
    responses(
        (status = 200, description = "Book returned", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<i32>,
    Json(request): Json<ReturnLoanRequest>,
) -> AppResult<Json<Loan>> {
    let loan = state
        .services
        .loans
        .return_loan(loan_id, request.return_date, request.fine_amount)
        .await?;
    Ok(Json(loan))
}

/// Extend a loan's due date
#[utoipa::path(
    post,
    path = "/loans/{id}/extend",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = ExtendLoanRequest,
    responses(
        (status = 200, description = "Due date extended", body = Loan),
        (status = 400, description = "New due date not after current one"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned")
    )
)]
pub async fn extend_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<i32>,
    Json(request): Json<ExtendLoanRequest>,
) -> AppResult<Json<Loan>> {
    let loan = state
        .services
        .loans
        .extend_due_date(loan_id, request.due_date)
        .await?;
    Ok(Json(loan))
}

/// Mark a loan as lost
#[utoipa::path(
    post,
    path = "/loans/{id}/lost",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan marked lost", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan not active")
    )
)]
pub async fn mark_lost(
    State(state): State<AppState>,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.mark_lost(loan_id).await?;
    Ok(Json(loan))
}
