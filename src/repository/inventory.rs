//! Transaction-scoped copy-counter primitives.
//!
//! These are the only writers of books.available_copies. Each runs as a
//! single conditional UPDATE so two concurrent borrowers can never both
//! take the last copy; callers compose them inside a loan transaction.

use sqlx::PgConnection;

use crate::error::{AppError, AppResult};

/// Take one copy off the shelf. Fails with `NoAvailableCopies` if none is
/// left at the moment of execution; the counter never goes negative.
pub async fn try_decrement(conn: &mut PgConnection, book_id: i32) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE books
        SET available_copies = available_copies - 1, updated_at = NOW()
        WHERE id = $1 AND available_copies > 0
        "#,
    )
    .bind(book_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NoAvailableCopies(book_id));
    }
    Ok(())
}

/// Put one copy back on the shelf, clamped at total_copies to tolerate a
/// double-return anomaly (already ruled out by the AlreadyReturned guard).
pub async fn increment(conn: &mut PgConnection, book_id: i32) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE books
        SET available_copies = LEAST(available_copies + 1, total_copies),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(book_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Permanently remove one copy from the holdings, used when a loan is
/// marked lost. available_copies is untouched: the lost copy was already
/// off the shelf, so shrinking the total keeps the counter identity
/// `available = total - active loans` once the loan leaves the active set.
pub async fn retire_copy(conn: &mut PgConnection, book_id: i32) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE books
        SET total_copies = total_copies - 1, updated_at = NOW()
        WHERE id = $1 AND total_copies > 0
        "#,
    )
    .bind(book_id)
    .execute(conn)
    .await?;
    Ok(())
}
