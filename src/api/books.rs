//! Book endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{Book, NewBook},
};

use super::{AuthenticatedUser, MessageResponse};

/// List all books
#[utoipa::path(
    get,
    path = "/books/",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of books", body = Vec<Book>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No books stored")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_uid): AuthenticatedUser,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list().await?;
    Ok(Json(books))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_uid): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get(&id).await?;
    Ok(Json(book))
}

/// Remove a book (soft delete, purged with the next batch)
#[utoipa::path(
    get,
    path = "/books/{id}/remove",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book removed", body = MessageResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn remove_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(uid): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.remove(&id).await?;
    tracing::info!(bid = %id, uid = %uid, "book marked deleted");

    Ok(Json(MessageResponse {
        message: format!("book {} was deleted", id),
    }))
}

/// Add one copy of a book
#[utoipa::path(
    post,
    path = "/add-book",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = NewBook,
    responses(
        (status = 201, description = "Book added", body = MessageResponse),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn add_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_uid): AuthenticatedUser,
    Json(book): Json<NewBook>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let message = format!("book {} {} was added", book.author, book.label);
    state.services.books.add(book).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

/// Add several books at once
#[utoipa::path(
    post,
    path = "/add-books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = Vec<NewBook>,
    responses(
        (status = 201, description = "Books added", body = MessageResponse),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn add_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_uid): AuthenticatedUser,
    Json(books): Json<Vec<NewBook>>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let added = state.services.books.add_many(books).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("{} books were added", added),
        }),
    ))
}
