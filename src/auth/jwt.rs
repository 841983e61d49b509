//! Session token signing and validation.
//!
//! Tokens are HS256-signed JWTs. Every token names a server-side [`Session`] row
//! through `sid`, so logging out invalidates it even before `exp`.
//!
//! [`Session`]: crate::models::Session

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UserRole;

/// Claims
///
/// Payload signed into every admin session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    /// Session id; must still exist in the `sessions` table.
    pub sid: Uuid,
    pub role: UserRole,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Signs a token for `user_id` bound to session `session_id`.
pub fn issue_token(
    user_id: Uuid,
    session_id: Uuid,
    role: UserRole,
    expires_at: DateTime<Utc>,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id,
        sid: session_id,
        role,
        iat: Utc::now().timestamp(),
        exp: expires_at.timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Verifies signature and expiry and returns the embedded [`Claims`].
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "unit-test-secret-unit-test-secret";

    #[test]
    fn issued_token_round_trips() {
        let user = Uuid::new_v4();
        let session = Uuid::new_v4();
        let token = issue_token(user, session, UserRole::Admin, Utc::now() + Duration::hours(1), SECRET).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.sid, session);
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(
            Uuid::new_v4(),
            Uuid::new_v4(),
            UserRole::Editor,
            Utc::now() - Duration::minutes(5),
            SECRET,
        )
        .unwrap();
        let err = decode_token(&token, SECRET).unwrap_err();
        assert_eq!(err.kind(), &jsonwebtoken::errors::ErrorKind::ExpiredSignature);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), Uuid::new_v4(), UserRole::Editor, Utc::now() + Duration::hours(1), SECRET)
            .unwrap();
        assert!(decode_token(&token, "another-secret-another-secret-xx").is_err());
    }
}
