//! Loan circulation service: eligibility checking and the borrow /
//! return / extend / lost commands.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::{
        book::Book,
        loan::{CreateLoan, Loan},
        member::{Member, MembershipStatus},
    },
    repository::Repository,
};

/// A book must have a copy on the shelf before a borrow is considered
fn ensure_copies_available(book: &Book) -> AppResult<()> {
    if book.available_copies > 0 {
        Ok(())
    } else {
        Err(AppError::NoAvailableCopies(book.id))
    }
}

/// A member must be active and carry no overdue loans
fn ensure_member_can_borrow(member: &Member, overdue_loans: i64) -> AppResult<()> {
    if member.membership_status != MembershipStatus::Active {
        return Err(AppError::MemberNotActive(member.id));
    }
    if overdue_loans > 0 {
        return Err(AppError::MemberHasOverdueLoans(member.id));
    }
    Ok(())
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    circulation: CirculationConfig,
}

impl LoansService {
    pub fn new(repository: Repository, circulation: CirculationConfig) -> Self {
        Self {
            repository,
            circulation,
        }
    }

    /// Advisory borrow eligibility check, short-circuiting on the first
    /// failure: book exists, copy available, member exists, member active,
    /// no overdue loans. The authoritative availability gate is the atomic
    /// decrement inside `borrow`, so a clean result here can still lose a
    /// race to a concurrent borrower.
    pub async fn check_borrow_eligibility(&self, book_id: i32, member_id: i32) -> AppResult<()> {
        let book = self.repository.books.get_by_id(book_id).await?;
        ensure_copies_available(&book)?;

        let member = self.repository.members.get_by_id(member_id).await?;
        let overdue = self.repository.members.count_overdue_loans(member_id).await?;
        ensure_member_can_borrow(&member, overdue)
    }

    /// Borrow a book: eligibility pre-check, then the transactional
    /// decrement-and-insert. Dates default to today and today plus the
    /// configured loan period.
    pub async fn borrow(&self, request: CreateLoan) -> AppResult<Loan> {
        let borrow_date = request.borrow_date.unwrap_or_else(|| Utc::now().date_naive());
        let due_date = request.due_date.unwrap_or_else(|| {
            borrow_date + chrono::Duration::days(self.circulation.loan_period_days)
        });

        if due_date <= borrow_date {
            return Err(AppError::Validation(format!(
                "due_date {} must be after borrow_date {}",
                due_date, borrow_date
            )));
        }

        self.check_borrow_eligibility(request.book_id, request.member_id).await?;

        let loan = self
            .repository
            .loans
            .create(request.book_id, request.member_id, borrow_date, due_date)
            .await?;

        tracing::info!(
            loan_id = loan.id,
            book_id = loan.book_id,
            member_id = loan.member_id,
            due_date = %loan.due_date,
            "Loan created"
        );
        Ok(loan)
    }

    /// Return a loan. The return date defaults to today; a supplied fine
    /// overrides the stored amount, otherwise the batch-computed value
    /// stands.
    pub async fn return_loan(
        &self,
        loan_id: i32,
        return_date: Option<NaiveDate>,
        fine_amount: Option<Decimal>,
    ) -> AppResult<Loan> {
        let return_date = return_date.unwrap_or_else(|| Utc::now().date_naive());
        let loan = self
            .repository
            .loans
            .return_loan(loan_id, return_date, fine_amount)
            .await?;

        tracing::info!(loan_id, book_id = loan.book_id, "Loan returned");
        Ok(loan)
    }

    /// Extend a loan's due date
    pub async fn extend_due_date(&self, loan_id: i32, new_due_date: NaiveDate) -> AppResult<Loan> {
        let loan = self
            .repository
            .loans
            .extend_due_date(loan_id, new_due_date)
            .await?;

        tracing::info!(loan_id, due_date = %loan.due_date, "Loan extended");
        Ok(loan)
    }

    /// Mark a loan lost, retiring the copy from the book's holdings
    pub async fn mark_lost(&self, loan_id: i32) -> AppResult<Loan> {
        let loan = self.repository.loans.mark_lost(loan_id).await?;

        tracing::info!(loan_id, book_id = loan.book_id, "Loan marked lost");
        Ok(loan)
    }

    /// Get loan by ID
    pub async fn get_loan(&self, loan_id: i32) -> AppResult<Loan> {
        self.repository.loans.get_by_id(loan_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn book(available: i32) -> Book {
        Book {
            id: 3,
            title: "The Trial".to_string(),
            isbn: None,
            total_copies: 2,
            available_copies: available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn member(status: MembershipStatus) -> Member {
        Member {
            id: 9,
            name: "K.".to_string(),
            email: None,
            membership_status: status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn exhausted_books_are_not_borrowable() {
        let err = ensure_copies_available(&book(0)).unwrap_err();
        assert!(matches!(err, AppError::NoAvailableCopies(3)));
        assert!(ensure_copies_available(&book(1)).is_ok());
    }

    #[test]
    fn inactive_members_cannot_borrow() {
        for status in [MembershipStatus::Expired, MembershipStatus::Suspended] {
            let err = ensure_member_can_borrow(&member(status), 0).unwrap_err();
            assert!(matches!(err, AppError::MemberNotActive(9)));
        }
    }

    #[test]
    fn members_with_overdue_loans_cannot_borrow() {
        let err = ensure_member_can_borrow(&member(MembershipStatus::Active), 1).unwrap_err();
        assert!(matches!(err, AppError::MemberHasOverdueLoans(9)));
    }

    #[test]
    fn inactive_status_is_reported_before_overdue_loans() {
        let err = ensure_member_can_borrow(&member(MembershipStatus::Suspended), 3).unwrap_err();
        assert!(matches!(err, AppError::MemberNotActive(9)));
    }

    #[test]
    fn active_member_without_overdue_loans_passes() {
        assert!(ensure_member_can_borrow(&member(MembershipStatus::Active), 0).is_ok());
    }
}
