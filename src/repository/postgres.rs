//! PostgreSQL storage

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use super::Storage;
use crate::{
    error::{AppError, AppResult},
    models::{Book, NewBook, User},
};

#[derive(Clone)]
pub struct PgStorage {
    pool: Pool<Postgres>,
}

impl PgStorage {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Increment the copy count of a matching live book or insert a new one
async fn add_copy(conn: &mut PgConnection, book: &NewBook) -> AppResult<()> {
    let existing: Option<String> = sqlx::query_scalar(
        "SELECT bid FROM books WHERE label = $1 AND author = $2 AND deleted = false",
    )
    .bind(&book.label)
    .bind(&book.author)
    .fetch_optional(&mut *conn)
    .await?;

    match existing {
        Some(bid) => {
            tracing::debug!(bid = %bid, "book already stored, increasing count");
            sqlx::query("UPDATE books SET count = count + 1 WHERE bid = $1")
                .bind(&bid)
                .execute(&mut *conn)
                .await?;
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO books (bid, label, author, description, age, count)
                VALUES ($1, $2, $3, $4, $5, 1)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&book.label)
            .bind(&book.author)
            .bind(&book.description)
            .bind(book.age)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

#[async_trait]
impl Storage for PgStorage {
    async fn save_user(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            "INSERT INTO users (uid, email, pass, age) VALUES ($1, $2, $3, $4)",
        )
        .bind(&user.uid)
        .bind(&user.email)
        .bind(&user.pass)
        .bind(user.age)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::UserExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT uid, email, pass, age FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    async fn get_user(&self, uid: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT uid, email, pass, age FROM users WHERE uid = $1")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    async fn save_book(&self, book: &NewBook) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        add_copy(&mut conn, book).await
    }

    async fn save_books(&self, books: &[NewBook]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        for book in books {
            add_copy(&mut tx, book).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_books(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT bid, label, author, description, age, count, deleted
            FROM books
            WHERE deleted = false
            ORDER BY label, author
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        if books.is_empty() {
            return Err(AppError::EmptyBooksList);
        }
        Ok(books)
    }

    async fn get_book(&self, bid: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            SELECT bid, label, author, description, age, count, deleted
            FROM books
            WHERE bid = $1 AND deleted = false
            "#,
        )
        .bind(bid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::BookNotFound)
    }

    async fn set_delete_status(&self, bid: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE books SET deleted = true WHERE bid = $1 AND deleted = false")
            .bind(bid)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::BookNotFound);
        }
        Ok(())
    }

    async fn delete_books(&self) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM books WHERE deleted = true")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
