//! Repository tests against a live database. These exercise row-lock
//! ordering that the HTTP tests cannot stage, so they talk to the pool
//! directly via DATABASE_URL.
//!
//! Run with: cargo test -- --ignored

use std::time::Duration;

use biblios_server::{error::AppError, models::loan::LoanStatus, repository::Repository};
use sqlx::postgres::PgPoolOptions;

async fn connect() -> sqlx::PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to database")
}

#[tokio::test]
#[ignore]
async fn test_delete_waits_for_in_flight_borrow() {
    let pool = connect().await;
    let repository = Repository::new(pool.clone());

    let book_id: i32 = sqlx::query_scalar(
        "INSERT INTO books (title, total_copies, available_copies) VALUES ($1, 1, 1) RETURNING id",
    )
    .bind("Delete vs borrow")
    .fetch_one(&pool)
    .await
    .unwrap();

    // Stage a borrow mid-transaction: the counter decrement holds the
    // book row lock while the loan insert is not yet visible.
    let mut tx = pool.begin().await.unwrap();
    sqlx::query(
        "UPDATE books SET available_copies = available_copies - 1
         WHERE id = $1 AND available_copies > 0",
    )
    .bind(book_id)
    .execute(&mut *tx)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO loans (book_id, member_id, borrow_date, due_date, status)
         VALUES ($1, 1, CURRENT_DATE, CURRENT_DATE + 14, $2)",
    )
    .bind(book_id)
    .bind(LoanStatus::Borrowed)
    .execute(&mut *tx)
    .await
    .unwrap();

    let delete = tokio::spawn({
        let repository = repository.clone();
        async move { repository.books.delete(book_id).await }
    });

    // Let the delete queue up behind the row lock, then land the borrow.
    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.commit().await.unwrap();

    let result = delete.await.unwrap();
    assert!(matches!(result, Err(AppError::BookHasActiveLoans(id)) if id == book_id));

    // The guard saw the committed loan and kept the book
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
        .bind(book_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(exists);
}
