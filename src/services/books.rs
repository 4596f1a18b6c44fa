//! Book catalog service

use std::sync::Arc;

use validator::Validate;

use super::deleter::DeletionNotifier;
use crate::{
    error::{AppError, AppResult},
    models::{Book, NewBook},
    repository::Storage,
};

#[derive(Clone)]
pub struct BooksService {
    storage: Arc<dyn Storage>,
    deletions: DeletionNotifier,
}

impl BooksService {
    pub fn new(storage: Arc<dyn Storage>, deletions: DeletionNotifier) -> Self {
        Self { storage, deletions }
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.storage.get_books().await
    }

    pub async fn get(&self, bid: &str) -> AppResult<Book> {
        self.storage.get_book(bid).await
    }

    pub async fn add(&self, book: NewBook) -> AppResult<()> {
        book.validate()?;
        self.storage.save_book(&book).await
    }

    /// Add several books, returning how many were accepted
    pub async fn add_many(&self, books: Vec<NewBook>) -> AppResult<usize> {
        if books.is_empty() {
            return Err(AppError::Validation("No books given".to_string()));
        }
        for book in &books {
            book.validate()?;
        }
        self.storage.save_books(&books).await?;
        Ok(books.len())
    }

    /// Mark a book deleted and queue it for the next purge.
    ///
    /// The signal goes out only once the mark is stored.
    pub async fn remove(&self, bid: &str) -> AppResult<()> {
        self.storage.set_delete_status(bid).await?;

        if let Err(e) = self.deletions.notify().await {
            // the mark is durable, the next batcher run purges it
            tracing::warn!(bid, error = %e, "book marked deleted but not queued");
        }
        Ok(())
    }
}
