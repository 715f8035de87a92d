//! Book model and catalog mutation payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{author::Author, category::Category};

/// Book row from database.
///
/// `available_copies` is maintained exclusively by the inventory primitives
/// in the repository layer; `available_copies == total_copies - active loans`
/// holds at all times.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book with its association sets resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub authors: Vec<Author>,
    pub categories: Vec<Category>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 512))]
    pub title: String,
    pub isbn: Option<String>,
    #[validate(range(min = 0))]
    pub total_copies: i32,
    #[serde(default)]
    pub author_ids: Vec<i32>,
    #[serde(default)]
    pub category_ids: Vec<i32>,
}

/// Update book request. Omitted fields are left unchanged; supplying
/// author/category lists replaces the association sets wholesale.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 512))]
    pub title: Option<String>,
    pub isbn: Option<String>,
    #[validate(range(min = 0))]
    pub total_copies: Option<i32>,
    pub author_ids: Option<Vec<i32>>,
    pub category_ids: Option<Vec<i32>>,
}
