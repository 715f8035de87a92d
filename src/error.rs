//! Error types for the Biblios server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    DbFailure = 2,
    BadValue = 3,
    NoSuchBook = 4,
    NoSuchMember = 5,
    NoSuchLoan = 6,
    NoSuchAuthor = 7,
    NoSuchCategory = 8,
    NoAvailableCopies = 9,
    MemberNotActive = 10,
    MemberHasOverdueLoans = 11,
    AlreadyReturned = 12,
    CannotExtendReturned = 13,
    InvalidDueDate = 14,
    LoanNotActive = 15,
    BookHasActiveLoans = 16,
    Busy = 17,
}

/// Main application error type.
///
/// State-conflict and not-found failures each get their own variant so the
/// circulation services can return typed results; nothing here is fatal to
/// the process.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Book with id {0} not found")]
    BookNotFound(i32),

    #[error("Member with id {0} not found")]
    MemberNotFound(i32),

    #[error("Loan with id {0} not found")]
    LoanNotFound(i32),

    #[error("Author with id {0} not found")]
    UnknownAuthor(i32),

    #[error("Category with id {0} not found")]
    UnknownCategory(i32),

    #[error("No available copies of book {0}")]
    NoAvailableCopies(i32),

    #[error("Member {0} is not active")]
    MemberNotActive(i32),

    #[error("Member {0} has overdue loans")]
    MemberHasOverdueLoans(i32),

    #[error("Loan {0} is already returned")]
    AlreadyReturned(i32),

    #[error("Cannot extend returned loan {0}")]
    CannotExtendReturned(i32),

    #[error("New due date {proposed} is not after current due date {current}")]
    InvalidDueDate {
        current: chrono::NaiveDate,
        proposed: chrono::NaiveDate,
    },

    #[error("Loan {0} is not active")]
    LoanNotActive(i32),

    #[error("Book {0} has active loans")]
    BookHasActiveLoans(i32),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

/// Postgres SQLSTATE codes that indicate transient lock/serialization
/// contention. Callers may retry the whole operation.
fn is_retryable_db_error(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = e {
        if let Some(code) = db.code() {
            return matches!(code.as_ref(), "55P03" | "40001" | "40P01");
        }
    }
    false
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BookNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchBook, self.to_string())
            }
            AppError::MemberNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchMember, self.to_string())
            }
            AppError::LoanNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchLoan, self.to_string())
            }
            AppError::UnknownAuthor(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchAuthor, self.to_string())
            }
            AppError::UnknownCategory(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchCategory, self.to_string())
            }
            AppError::NoAvailableCopies(_) => {
                (StatusCode::CONFLICT, ErrorCode::NoAvailableCopies, self.to_string())
            }
            AppError::MemberNotActive(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::MemberNotActive, self.to_string())
            }
            AppError::MemberHasOverdueLoans(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::MemberHasOverdueLoans,
                self.to_string(),
            ),
            AppError::AlreadyReturned(_) => {
                (StatusCode::CONFLICT, ErrorCode::AlreadyReturned, self.to_string())
            }
            AppError::CannotExtendReturned(_) => {
                (StatusCode::CONFLICT, ErrorCode::CannotExtendReturned, self.to_string())
            }
            AppError::InvalidDueDate { .. } => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidDueDate, self.to_string())
            }
            AppError::LoanNotActive(_) => {
                (StatusCode::CONFLICT, ErrorCode::LoanNotActive, self.to_string())
            }
            AppError::BookHasActiveLoans(_) => {
                (StatusCode::CONFLICT, ErrorCode::BookHasActiveLoans, self.to_string())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) if is_retryable_db_error(e) => {
                tracing::warn!("Transient database contention: {:?}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::Busy,
                    "Operation timed out on a lock, retry".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
