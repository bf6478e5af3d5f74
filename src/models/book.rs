//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book with its author's name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub book_name: String,
    pub description: String,
    pub author_id: i32,
    /// Author name
    pub author: String,
}

/// Book fields supplied on create and update
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, max = 255, message = "Book name must be 1 to 255 characters"))]
    pub book_name: String,
    #[serde(default)]
    pub description: String,
}

/// Update one book of an author; the book is named in the body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthorBook {
    pub id: Option<i32>,
    #[validate(nested)]
    #[serde(flatten)]
    pub book: BookInput,
}

/// Create a book together with a new author
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookWithAuthor {
    #[validate(length(min = 1, max = 255, message = "Book name must be 1 to 255 characters"))]
    pub book_name: String,
    #[serde(default)]
    pub description: String,
    /// Name of the author to create
    #[validate(length(min = 1, max = 255, message = "Author name must be 1 to 255 characters"))]
    pub author: String,
    #[serde(default)]
    pub publication_year: i32,
}
