//! Bearer credential verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::entities::Owner;
use crate::error::AppError;

/// Claims carried by an access token. Only `sub` and `exp` are used.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Verifies HS256-signed bearer tokens and yields the caller's identity.
///
/// The token subject becomes the owner id. A subject equal to the anonymous
/// sentinel is treated as no identity at all, so it can never own links.
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
    anonymous_owner_id: String,
}

impl AuthService {
    pub fn new(jwt_secret: &str, anonymous_owner_id: impl Into<String>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            anonymous_owner_id: anonymous_owner_id.into(),
        }
    }

    /// Verifies `token` and returns the owner it identifies.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the signature, algorithm or
    /// expiry check fails, or the subject is empty.
    pub fn verify(&self, token: &str) -> Result<Owner, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": format!("Invalid token: {e}") }),
            )
        })?;

        let subject = data.claims.sub;
        if subject.is_empty() {
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Token has no subject" }),
            ));
        }

        if subject == self.anonymous_owner_id {
            return Ok(Owner::Anonymous);
        }

        Ok(Owner::Authenticated(subject))
    }

    /// Like [`Self::verify`] but rejects anonymous identities.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for invalid or anonymous tokens.
    pub fn require_user(&self, token: &str) -> Result<String, AppError> {
        match self.verify(token)? {
            Owner::Authenticated(user_id) => Ok(user_id),
            Owner::Anonymous => Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Authentication required" }),
            )),
        }
    }
}
