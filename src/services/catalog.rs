//! Catalog service: book create/update/delete with transactional
//! association maintenance.

use crate::{
    error::AppResult,
    models::book::{BookDetails, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get a book with its authors and categories
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        self.repository.books.get_details(id).await
    }

    /// Create a book together with its author/category links
    pub async fn create_book(&self, book: CreateBook) -> AppResult<BookDetails> {
        let details = self.repository.books.create(&book).await?;
        tracing::info!(book_id = details.book.id, title = %details.book.title, "Book created");
        Ok(details)
    }

    /// Update book fields, replacing association sets when supplied
    pub async fn update_book(&self, id: i32, book: UpdateBook) -> AppResult<BookDetails> {
        let details = self.repository.books.update(id, &book).await?;
        tracing::info!(book_id = id, "Book updated");
        Ok(details)
    }

    /// Delete a book. Rejected while active loans hold its copies.
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}
