//! Bearer-token authentication.
//!
//! Login issues a short-lived JWT over the username; every protected
//! handler extracts `CurrentUser`, which verifies the token and loads the
//! account, so deactivated users drop out on the next request.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use tomstudy_core::models::User;
use tomstudy_core::StudyError;

use crate::state::ApiState;

/// Token lifetime, matching the original deployment's 1h expiry.
const TOKEN_TTL_HOURS: i64 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    pub admin: bool,
    pub exp: i64,
}

/// Sign a token for a user.
pub fn issue_token(user: &User, secret: &str) -> Result<String, StudyError> {
    let claims = Claims {
        sub: user.username.clone(),
        admin: user.is_admin,
        exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| StudyError::Internal(format!("failed to sign token: {}", e)))
}

/// Verify a token and return its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, StudyError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| StudyError::Unauthorized("invalid or expired token".to_string()))
}

/// The authenticated user behind the request's bearer token.
pub struct CurrentUser(pub User);

impl FromRequestParts<ApiState> for CurrentUser {
    type Rejection = StudyError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| StudyError::Unauthorized("missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| StudyError::Unauthorized("expected bearer token".to_string()))?;

        let claims = verify_token(token, &state.jwt_secret)?;

        state
            .core
            .user_store
            .get_by_username(&claims.sub)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| StudyError::Unauthorized("unknown user".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tomstudy_core::models::Group;

    #[test]
    fn token_round_trip() {
        let user = User::new(
            "p01".to_string(),
            "pw".to_string(),
            Group::ControlFirst,
            true,
        );
        let token = issue_token(&user, "test-secret").unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "p01");
        assert!(claims.admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let user = User::new(
            "p01".to_string(),
            "pw".to_string(),
            Group::ControlFirst,
            false,
        );
        let token = issue_token(&user, "test-secret").unwrap();
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(StudyError::Unauthorized(_))
        ));
    }
}
