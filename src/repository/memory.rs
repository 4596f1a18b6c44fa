//! In-memory storage, used when no database is reachable and in tests

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Storage;
use crate::{
    error::{AppError, AppResult},
    models::{Book, NewBook, User},
};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    users: RwLock<HashMap<String, User>>,
    books: RwLock<HashMap<String, Book>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of book rows still held, including ones marked deleted
    pub async fn book_rows(&self) -> usize {
        self.books.read().await.len()
    }
}

fn add_copy(books: &mut HashMap<String, Book>, book: &NewBook) {
    if let Some(existing) = books
        .values_mut()
        .find(|b| !b.deleted && book.same_title(b))
    {
        existing.count += 1;
        tracing::debug!(bid = %existing.bid, count = existing.count, "book count increased");
        return;
    }

    let bid = Uuid::new_v4().to_string();
    books.insert(
        bid.clone(),
        Book {
            bid,
            label: book.label.clone(),
            author: book.author.clone(),
            description: book.description.clone(),
            age: book.age,
            count: 1,
            deleted: false,
        },
    );
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save_user(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::UserExists);
        }
        users.insert(user.uid.clone(), user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(AppError::UserNotFound)
    }

    async fn get_user(&self, uid: &str) -> AppResult<User> {
        self.users
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or_else(|| {
                tracing::debug!(uid, "user not found");
                AppError::UserNotFound
            })
    }

    async fn save_book(&self, book: &NewBook) -> AppResult<()> {
        add_copy(&mut *self.books.write().await, book);
        Ok(())
    }

    async fn save_books(&self, books: &[NewBook]) -> AppResult<()> {
        let mut stored = self.books.write().await;
        for book in books {
            add_copy(&mut stored, book);
        }
        Ok(())
    }

    async fn get_books(&self) -> AppResult<Vec<Book>> {
        let mut books: Vec<Book> = self
            .books
            .read()
            .await
            .values()
            .filter(|b| !b.deleted)
            .cloned()
            .collect();
        if books.is_empty() {
            return Err(AppError::EmptyBooksList);
        }
        books.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.author.cmp(&b.author)));
        Ok(books)
    }

    async fn get_book(&self, bid: &str) -> AppResult<Book> {
        self.books
            .read()
            .await
            .get(bid)
            .filter(|b| !b.deleted)
            .cloned()
            .ok_or(AppError::BookNotFound)
    }

    async fn set_delete_status(&self, bid: &str) -> AppResult<()> {
        match self.books.write().await.get_mut(bid) {
            Some(book) if !book.deleted => {
                book.deleted = true;
                Ok(())
            }
            _ => Err(AppError::BookNotFound),
        }
    }

    async fn delete_books(&self) -> AppResult<u64> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|_, b| !b.deleted);
        Ok((before - books.len()) as u64)
    }
}
