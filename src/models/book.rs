//! Book model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub bid: String,
    pub label: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// Minimum reader age
    pub age: i32,
    /// Number of copies held
    pub count: i32,
    /// Soft-delete marker; the row is purged later by the deletion batcher
    #[serde(default, skip_serializing)]
    pub deleted: bool,
}

/// Book creation request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewBook {
    #[validate(length(min = 1, message = "Label is required"))]
    pub label: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, max = 150, message = "Age must be between 0 and 150"))]
    #[serde(default)]
    pub age: i32,
}

impl NewBook {
    /// Two books are the same title when label and author match
    pub fn same_title(&self, book: &Book) -> bool {
        self.label == book.label && self.author == book.author
    }
}
