//! User model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Stored user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub uid: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub pass: String,
    pub age: i32,
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    #[validate(range(min = 0, max = 150, message = "Age must be between 0 and 150"))]
    #[serde(default)]
    pub age: i32,
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// JWT claims carried by every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    pub user_id: String,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new HS256 JWT token
    pub fn create_token(
        &self,
        key: &jsonwebtoken::EncodingKey,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, Algorithm, Header};
        encode(&Header::new(Algorithm::HS256), self, key)
    }

    /// Parse and verify a JWT token. Expiry is checked against the current
    /// time without leeway.
    pub fn from_token(
        token: &str,
        key: &jsonwebtoken::DecodingKey,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, Algorithm, Validation};
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        let token_data = decode::<Self>(token, key, &validation)?;
        Ok(token_data.claims)
    }
}
