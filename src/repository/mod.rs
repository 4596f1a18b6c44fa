//! Repository layer: the storage capability and its two backends

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{Book, NewBook, User},
};

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

/// Persistence for users and books.
///
/// Books are removed in two phases: [`Storage::set_delete_status`] marks a
/// single book as deleted, and [`Storage::delete_books`] later purges every
/// marked row at once. Marked books are invisible to reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a new user. Fails with `UserExists` when the email is taken.
    async fn save_user(&self, user: &User) -> AppResult<()>;

    /// Look up a user by email, `UserNotFound` if absent
    async fn find_user_by_email(&self, email: &str) -> AppResult<User>;

    /// Look up a user by id, `UserNotFound` if absent
    async fn get_user(&self, uid: &str) -> AppResult<User>;

    /// Add one copy of a book, creating the record on first copy
    async fn save_book(&self, book: &NewBook) -> AppResult<()>;

    /// Add several books at once, all or nothing
    async fn save_books(&self, books: &[NewBook]) -> AppResult<()>;

    /// All books not marked deleted, `EmptyBooksList` if there are none
    async fn get_books(&self) -> AppResult<Vec<Book>>;

    /// One book not marked deleted, `BookNotFound` otherwise
    async fn get_book(&self, bid: &str) -> AppResult<Book>;

    /// Mark a book deleted. `BookNotFound` if it is missing or already marked.
    async fn set_delete_status(&self, bid: &str) -> AppResult<()>;

    /// Physically remove every book marked deleted, returning how many rows went
    async fn delete_books(&self) -> AppResult<u64>;
}
