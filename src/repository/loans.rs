//! Loans repository: loan lifecycle transitions, the overdue sweep, and
//! the fine batch. Every multi-statement mutation runs in one transaction
//! with the loan row locked, so partial state is never observable.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanStatus},
};

use super::{inventory, LOCK_TIMEOUT_SQL};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::LoanNotFound(id))
    }

    /// Lock a loan row for the duration of the surrounding transaction
    async fn get_for_update(&self, conn: &mut PgConnection, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or(AppError::LoanNotFound(id))
    }

    /// Create a loan: atomically take a copy off the shelf and insert the
    /// row with status borrowed. The conditional decrement is the
    /// authoritative availability gate; the eligibility pre-check in the
    /// service is advisory only.
    pub async fn create(
        &self,
        book_id: i32,
        member_id: i32,
        borrow_date: NaiveDate,
        due_date: NaiveDate,
    ) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(LOCK_TIMEOUT_SQL).execute(&mut *tx).await?;

        inventory::try_decrement(&mut *tx, book_id).await?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (book_id, member_id, borrow_date, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(member_id)
        .bind(borrow_date)
        .bind(due_date)
        .bind(LoanStatus::Borrowed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(loan)
    }

    /// Return a loan: terminal transition into returned, restocking the
    /// copy in the same transaction. A supplied fine overrides the stored
    /// (batch-computed) amount; otherwise the stored amount stands.
    pub async fn return_loan(
        &self,
        loan_id: i32,
        return_date: NaiveDate,
        fine_amount: Option<Decimal>,
    ) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(LOCK_TIMEOUT_SQL).execute(&mut *tx).await?;

        let loan = self.get_for_update(&mut *tx, loan_id).await?;
        loan.ensure_returnable()?;

        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = $1,
                return_date = $2,
                fine_amount = COALESCE($3, fine_amount),
                updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(LoanStatus::Returned)
        .bind(return_date)
        .bind(fine_amount)
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

        inventory::increment(&mut *tx, loan.book_id).await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Extend the due date. An overdue loan drops back to borrowed; the
    /// accrued fine is left untouched.
    pub async fn extend_due_date(&self, loan_id: i32, new_due_date: NaiveDate) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(LOCK_TIMEOUT_SQL).execute(&mut *tx).await?;

        let loan = self.get_for_update(&mut *tx, loan_id).await?;
        let new_status = loan.validate_extension(new_due_date)?;

        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET due_date = $1, status = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(new_due_date)
        .bind(new_status)
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Mark a loan lost: terminal transition from an active state. The copy
    /// is not restocked; the holdings shrink by one instead.
    pub async fn mark_lost(&self, loan_id: i32) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(LOCK_TIMEOUT_SQL).execute(&mut *tx).await?;

        let loan = self.get_for_update(&mut *tx, loan_id).await?;
        loan.ensure_can_mark_lost()?;

        let updated = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(LoanStatus::Lost)
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

        inventory::retire_copy(&mut *tx, loan.book_id).await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Promote every borrowed loan past its due date to overdue. Set-based
    /// and idempotent: loans already overdue are left untouched, and the
    /// borrow-time decrement already accounted for the copy.
    pub async fn sweep_overdue(&self, as_of: NaiveDate) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET status = $1, updated_at = NOW()
            WHERE status = $2 AND due_date < $3
            "#,
        )
        .bind(LoanStatus::Overdue)
        .bind(LoanStatus::Borrowed)
        .bind(as_of)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Recompute the stored fine for every unreturned overdue loan:
    /// days past due times the rate, never negative. Running this twice
    /// with the same date stores the same amounts.
    pub async fn refresh_overdue_fines(
        &self,
        per_day: Decimal,
        as_of: NaiveDate,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET fine_amount = GREATEST($1::date - due_date, 0) * $2,
                updated_at = NOW()
            WHERE status = $3 AND return_date IS NULL
            "#,
        )
        .bind(as_of)
        .bind(per_day)
        .bind(LoanStatus::Overdue)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
