//! Repository layer for database operations

pub mod books;
pub mod inventory;
pub mod loans;
pub mod members;

use sqlx::{Pool, Postgres};

/// Lock wait ceiling for circulation transactions; hitting it surfaces
/// as a retryable Busy error rather than an indefinite block.
pub(crate) const LOCK_TIMEOUT_SQL: &str = "SET LOCAL lock_timeout = '5s'";

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub members: members::MembersRepository,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            members: members::MembersRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            pool,
        }
    }
}
