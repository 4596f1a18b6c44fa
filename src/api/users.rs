//! Registration, login and profile endpoints

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{LoginUser, RegisterUser, User},
};

use super::AuthenticatedUser;

/// Issued credential. The token is also sent in the Authorization header.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub message: String,
}

fn token_response(status: StatusCode, token: String, message: &str) -> impl IntoResponse {
    (
        status,
        [(AUTHORIZATION, token.clone())],
        Json(TokenResponse {
            token,
            token_type: "Bearer".to_string(),
            message: message.to_string(),
        }),
    )
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users/register",
    tag = "users",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User registered", body = TokenResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "User already exists")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(user): Json<RegisterUser>,
) -> AppResult<impl IntoResponse> {
    let token = state.services.users.register(user).await?;
    Ok(token_response(StatusCode::CREATED, token, "user registered"))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginUser,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 403, description = "Invalid password"),
        (status = 404, description = "User not found")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(user): Json<LoginUser>,
) -> AppResult<impl IntoResponse> {
    let token = state.services.users.login(user).await?;
    Ok(token_response(StatusCode::OK, token, "user logged in"))
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/users/info",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User profile", body = User),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found")
    )
)]
pub async fn info(
    State(state): State<crate::AppState>,
    AuthenticatedUser(uid): AuthenticatedUser,
) -> AppResult<Json<User>> {
    let user = state.services.users.get_by_id(&uid).await?;
    Ok(Json(user))
}
