//! Token issuance and validation

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::UserClaims,
};

/// Mints and checks HS256 tokens with the process-wide secret.
///
/// Keys are derived once at startup and never change afterwards.
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            lifetime: Duration::hours(config.jwt_expiration_hours as i64),
        }
    }

    /// Create a token for `user_id` expiring after the configured lifetime
    pub fn issue_token(&self, user_id: &str) -> AppResult<String> {
        let now = Utc::now();
        let claims = UserClaims {
            user_id: user_id.to_string(),
            exp: (now + self.lifetime).timestamp(),
            iat: now.timestamp(),
        };

        claims
            .create_token(&self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Return the user id carried by a valid token.
    ///
    /// Every failure (empty input, bad format, wrong signature, expiry) comes
    /// back as the same `InvalidToken`; the cause is only logged.
    pub fn validate_token(&self, token: &str) -> AppResult<String> {
        if token.is_empty() {
            return Err(AppError::InvalidToken);
        }

        match UserClaims::from_token(token, &self.decoding_key) {
            Ok(claims) => Ok(claims.user_id),
            Err(e) => {
                tracing::debug!(error = %e, "validate jwt failed");
                Err(AppError::InvalidToken)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "VerySecurKey2000Cat";

    fn service() -> AuthService {
        AuthService::new(&AuthConfig {
            jwt_secret: SECRET.to_string(),
            jwt_expiration_hours: 3,
        })
    }

    fn token_expiring_in(seconds: i64, secret: &str) -> String {
        let now = Utc::now().timestamp();
        UserClaims {
            user_id: "user-42".to_string(),
            exp: now + seconds,
            iat: now,
        }
        .create_token(&EncodingKey::from_secret(secret.as_bytes()))
        .unwrap()
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(
            service().validate_token(""),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_issued_token_round_trip() {
        let auth = service();
        let token = auth.issue_token("user-42").unwrap();
        assert_eq!(auth.validate_token(&token).unwrap(), "user-42");
    }

    #[test]
    fn test_issued_token_lifetime() {
        let token = service().issue_token("user-42").unwrap();
        let claims = UserClaims::from_token(&token, &DecodingKey::from_secret(SECRET.as_bytes()))
            .unwrap();
        assert_eq!(claims.exp - claims.iat, 3 * 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = token_expiring_in(-1, SECRET);
        assert!(matches!(
            service().validate_token(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expiry_boundary_has_no_leeway() {
        let auth = service();
        assert_eq!(
            auth.validate_token(&token_expiring_in(1, SECRET)).unwrap(),
            "user-42"
        );
        assert!(matches!(
            auth.validate_token(&token_expiring_in(-1, SECRET)),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            auth.validate_token(&token_expiring_in(-2, SECRET)),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_token_valid_for_three_hours() {
        let token = token_expiring_in(3 * 3600, SECRET);
        assert_eq!(service().validate_token(&token).unwrap(), "user-42");
    }

    #[test]
    fn test_wrong_signature_rejected() {
        let token = token_expiring_in(3600, "another-secret");
        assert!(matches!(
            service().validate_token(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let auth = service();
        for token in ["abc", "a.b.c", "Bearer", "eyJhbGciOiJIUzI1NiJ9.e30."] {
            let err = auth.validate_token(token).unwrap_err();
            assert_eq!(err.to_string(), "invalid token");
        }
    }
}
