//! Books repository: book CRUD plus the transactional maintenance of the
//! book/author and book/category association sets. Link replacement and
//! field updates commit together or not at all.

use sqlx::{PgConnection, Pool, Postgres};

use super::LOCK_TIMEOUT_SQL;
use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{Book, BookDetails, CreateBook, UpdateBook},
        category::Category,
        loan::LoanStatus,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::BookNotFound(id))
    }

    /// Get book with its author and category sets resolved
    pub async fn get_details(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.get_by_id(id).await?;

        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT a.id, a.name
            FROM book_authors ba
            JOIN authors a ON a.id = ba.author_id
            WHERE ba.book_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name
            FROM book_categories bc
            JOIN categories c ON c.id = bc.category_id
            WHERE bc.book_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(BookDetails {
            book,
            authors,
            categories,
        })
    }

    /// Create a book with its association sets. All copies start on the
    /// shelf. Unknown author or category ids roll the whole insert back.
    pub async fn create(&self, book: &CreateBook) -> AppResult<BookDetails> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (title, isbn, total_copies, available_copies)
            VALUES ($1, $2, $3, $3)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(book.total_copies)
        .fetch_one(&mut *tx)
        .await?;

        replace_authors(&mut *tx, id, &book.author_ids).await?;
        replace_categories(&mut *tx, id, &book.category_ids).await?;

        tx.commit().await?;
        self.get_details(id).await
    }

    /// Update book fields and, when supplied, replace the association
    /// sets. Changing total_copies moves available_copies by the same
    /// delta, clamped at 0, so loan accounting is never bypassed.
    pub async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<BookDetails> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE books SET
                title = COALESCE($1, title),
                isbn = COALESCE($2, isbn),
                available_copies = CASE
                    WHEN $3::integer IS NOT NULL
                    THEN GREATEST(0, LEAST($3, available_copies + ($3 - total_copies)))
                    ELSE available_copies
                END,
                total_copies = COALESCE($3, total_copies),
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(book.title.as_deref())
        .bind(book.isbn.as_deref())
        .bind(book.total_copies)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::BookNotFound(id));
        }

        if let Some(ref author_ids) = book.author_ids {
            replace_authors(&mut *tx, id, author_ids).await?;
        }
        if let Some(ref category_ids) = book.category_ids {
            replace_categories(&mut *tx, id, category_ids).await?;
        }

        tx.commit().await?;
        self.get_details(id).await
    }

    /// Delete a book and its association links. Refused while any loan
    /// still holds a copy; historical loans keep their rows.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(LOCK_TIMEOUT_SQL).execute(&mut *tx).await?;

        // Lock the book row before counting. An in-flight borrow holds
        // this lock while it decrements the counter, so waiting for it
        // here guarantees the count observes that loan once it commits.
        sqlx::query_scalar::<_, i32>("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::BookNotFound(id))?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_id = $1 AND status IN ($2, $3)",
        )
        .bind(id)
        .bind(LoanStatus::Borrowed)
        .bind(LoanStatus::Overdue)
        .fetch_one(&mut *tx)
        .await?;

        if active > 0 {
            return Err(AppError::BookHasActiveLoans(id));
        }

        sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM book_categories WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Replace all author links for a book: delete existing rows, then insert
/// the given set. Full replacement, not a diff; an empty set clears all
/// links. Runs inside the caller's transaction.
pub async fn replace_authors(
    conn: &mut PgConnection,
    book_id: i32,
    author_ids: &[i32],
) -> AppResult<()> {
    ensure_ids_exist(&mut *conn, "authors", author_ids, AppError::UnknownAuthor).await?;

    sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

    for author_id in author_ids {
        sqlx::query(
            r#"
            INSERT INTO book_authors (book_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (book_id, author_id) DO NOTHING
            "#,
        )
        .bind(book_id)
        .bind(author_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Replace all category links for a book, same semantics as authors
pub async fn replace_categories(
    conn: &mut PgConnection,
    book_id: i32,
    category_ids: &[i32],
) -> AppResult<()> {
    ensure_ids_exist(&mut *conn, "categories", category_ids, AppError::UnknownCategory).await?;

    sqlx::query("DELETE FROM book_categories WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

    for category_id in category_ids {
        sqlx::query(
            r#"
            INSERT INTO book_categories (book_id, category_id)
            VALUES ($1, $2)
            ON CONFLICT (book_id, category_id) DO NOTHING
            "#,
        )
        .bind(book_id)
        .bind(category_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Verify every id exists in the named table, erroring with the first
/// missing one so the surrounding transaction rolls back untouched.
async fn ensure_ids_exist(
    conn: &mut PgConnection,
    table: &str,
    ids: &[i32],
    missing: fn(i32) -> AppError,
) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let query = format!("SELECT id FROM {} WHERE id = ANY($1)", table);
    let found: Vec<i32> = sqlx::query_scalar(&query)
        .bind(ids)
        .fetch_all(conn)
        .await?;

    for id in ids {
        if !found.contains(id) {
            return Err(missing(*id));
        }
    }
    Ok(())
}
