//! Loan model, status state machine guards, and the fine rule

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Loan lifecycle states (stored in loans.status).
///
/// `Borrowed` is the initial state; `Returned` and `Lost` are terminal.
/// `Overdue` narrows back to `Borrowed` only through a due-date extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Borrowed = 0,
    Returned = 1,
    Overdue = 2,
    Lost = 3,
}

impl From<i16> for LoanStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => LoanStatus::Returned,
            2 => LoanStatus::Overdue,
            3 => LoanStatus::Lost,
            _ => LoanStatus::Borrowed,
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Borrowed => "borrowed",
            LoanStatus::Returned => "returned",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Lost => "lost",
        };
        write!(f, "{}", label)
    }
}

/// Loan row from database. Append-only history; rows are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub member_id: i32,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    #[schema(value_type = f64)]
    pub fine_amount: Decimal,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// A loan is active while it holds a copy (borrowed or overdue)
    pub fn is_active(&self) -> bool {
        matches!(self.status, LoanStatus::Borrowed | LoanStatus::Overdue)
    }

    /// Guard for the return transition. Returning twice is a rejection,
    /// not a no-op.
    pub fn ensure_returnable(&self) -> AppResult<()> {
        match self.status {
            LoanStatus::Returned => Err(AppError::AlreadyReturned(self.id)),
            LoanStatus::Lost => Err(AppError::LoanNotActive(self.id)),
            LoanStatus::Borrowed | LoanStatus::Overdue => Ok(()),
        }
    }

    /// Guard for a due-date extension. Returns the status the loan should
    /// hold afterwards: an overdue loan is no longer late relative to its
    /// new deadline, so it drops back to borrowed.
    pub fn validate_extension(&self, new_due_date: NaiveDate) -> AppResult<LoanStatus> {
        match self.status {
            LoanStatus::Returned => return Err(AppError::CannotExtendReturned(self.id)),
            LoanStatus::Lost => return Err(AppError::LoanNotActive(self.id)),
            LoanStatus::Borrowed | LoanStatus::Overdue => {}
        }
        if new_due_date <= self.due_date {
            return Err(AppError::InvalidDueDate {
                current: self.due_date,
                proposed: new_due_date,
            });
        }
        Ok(LoanStatus::Borrowed)
    }

    /// Guard for the lost transition, valid only from an active state
    pub fn ensure_can_mark_lost(&self) -> AppResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(AppError::LoanNotActive(self.id))
        }
    }
}

/// Fine owed on an unreturned loan as of a given date:
/// one `per_day` unit for each full day past the due date, never negative.
pub fn overdue_fine(due_date: NaiveDate, as_of: NaiveDate, per_day: Decimal) -> Decimal {
    let days_late = (as_of - due_date).num_days().max(0);
    Decimal::from(days_late) * per_day
}

/// Create loan request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub book_id: i32,
    pub member_id: i32,
    pub borrow_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan(status: LoanStatus) -> Loan {
        Loan {
            id: 7,
            book_id: 1,
            member_id: 1,
            borrow_date: date(2024, 1, 1),
            due_date: date(2024, 1, 10),
            return_date: None,
            fine_amount: Decimal::ZERO,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn returning_a_returned_loan_is_rejected() {
        let err = loan(LoanStatus::Returned).ensure_returnable().unwrap_err();
        assert!(matches!(err, AppError::AlreadyReturned(7)));
    }

    #[test]
    fn overdue_loans_can_still_be_returned() {
        assert!(loan(LoanStatus::Overdue).ensure_returnable().is_ok());
    }

    #[test]
    fn lost_loans_cannot_be_returned() {
        let err = loan(LoanStatus::Lost).ensure_returnable().unwrap_err();
        assert!(matches!(err, AppError::LoanNotActive(7)));
    }

    #[test]
    fn extension_must_move_due_date_forward() {
        let l = loan(LoanStatus::Borrowed);
        assert!(matches!(
            l.validate_extension(date(2024, 1, 10)).unwrap_err(),
            AppError::InvalidDueDate { .. }
        ));
        assert!(matches!(
            l.validate_extension(date(2024, 1, 5)).unwrap_err(),
            AppError::InvalidDueDate { .. }
        ));
        assert_eq!(l.validate_extension(date(2024, 1, 11)).unwrap(), LoanStatus::Borrowed);
    }

    #[test]
    fn extending_an_overdue_loan_resets_it_to_borrowed() {
        let l = loan(LoanStatus::Overdue);
        assert_eq!(l.validate_extension(date(2024, 2, 1)).unwrap(), LoanStatus::Borrowed);
    }

    #[test]
    fn returned_loans_cannot_be_extended() {
        let err = loan(LoanStatus::Returned)
            .validate_extension(date(2024, 2, 1))
            .unwrap_err();
        assert!(matches!(err, AppError::CannotExtendReturned(7)));
    }

    #[test]
    fn only_active_loans_can_be_marked_lost() {
        assert!(loan(LoanStatus::Borrowed).ensure_can_mark_lost().is_ok());
        assert!(loan(LoanStatus::Overdue).ensure_can_mark_lost().is_ok());
        assert!(loan(LoanStatus::Returned).ensure_can_mark_lost().is_err());
        assert!(loan(LoanStatus::Lost).ensure_can_mark_lost().is_err());
    }

    #[test]
    fn fine_is_days_late_times_rate() {
        let per_day = Decimal::ONE;
        assert_eq!(
            overdue_fine(date(2024, 1, 10), date(2024, 1, 15), per_day),
            Decimal::from(5)
        );
    }

    #[test]
    fn fine_is_zero_on_or_before_due_date() {
        let per_day = Decimal::from(2);
        assert_eq!(
            overdue_fine(date(2024, 1, 10), date(2024, 1, 10), per_day),
            Decimal::ZERO
        );
        assert_eq!(
            overdue_fine(date(2024, 1, 10), date(2024, 1, 3), per_day),
            Decimal::ZERO
        );
    }

    #[test]
    fn fine_rule_is_stable_for_a_fixed_date() {
        let per_day = Decimal::new(15, 1); // 1.5
        let a = overdue_fine(date(2024, 1, 10), date(2024, 1, 20), per_day);
        let b = overdue_fine(date(2024, 1, 10), date(2024, 1, 20), per_day);
        assert_eq!(a, b);
        assert_eq!(a, Decimal::from(15));
    }
}
