//! Registration, login and profile lookup

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use uuid::Uuid;
use validator::Validate;

use super::auth::AuthService;
use crate::{
    error::{AppError, AppResult},
    models::{LoginUser, RegisterUser, User},
    repository::Storage,
};

#[derive(Clone)]
pub struct UsersService {
    storage: Arc<dyn Storage>,
    auth: AuthService,
}

impl UsersService {
    pub fn new(storage: Arc<dyn Storage>, auth: AuthService) -> Self {
        Self { storage, auth }
    }

    /// Create an account and return a token for it
    pub async fn register(&self, request: RegisterUser) -> AppResult<String> {
        request.validate()?;

        let user = User {
            uid: Uuid::new_v4().to_string(),
            email: request.email,
            pass: hash_password(&request.password)?,
            age: request.age,
        };
        self.storage.save_user(&user).await?;
        tracing::info!(uid = %user.uid, "user registered");

        self.auth.issue_token(&user.uid)
    }

    /// Check credentials and return a fresh token
    pub async fn login(&self, request: LoginUser) -> AppResult<String> {
        request.validate()?;

        let user = self.storage.find_user_by_email(&request.email).await?;
        if !verify_password(&user, &request.password)? {
            tracing::debug!(uid = %user.uid, "password mismatch");
            return Err(AppError::InvalidPassword);
        }

        self.auth.issue_token(&user.uid)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, uid: &str) -> AppResult<User> {
        self.storage.get_user(uid).await
    }
}

/// Hash a password using Argon2
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.pass)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
