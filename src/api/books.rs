//! Book catalog endpoints with lifecycle logic: create/update replace the
//! association sets, delete is guarded by active loans.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{BookDetails, CreateBook, UpdateBook},
    AppState,
};

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookDetails),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Unknown author or category id")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<BookDetails>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let book = state.services.catalog.create_book(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Get a book with its authors and categories
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book", body = BookDetails),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalog.get_book(book_id).await?;
    Ok(Json(book))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookDetails),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Book, author, or category not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
    Json(request): Json<UpdateBook>,
) -> AppResult<Json<BookDetails>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let book = state.services.catalog.update_book(book_id, request).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book has active loans")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
