//! Access token claims decoding
//!
//! The client never holds the signing key, so the token is decoded without
//! signature verification; the API re-validates it on every request. What the
//! client does check is the shape of the claims it relies on.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Who the current access token says is logged in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The token's `sub` claim
    pub subject_id: String,
    /// The token's `role` claim, e.g. "admin" or "user"
    pub role: String,
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// True when `roles` is empty or contains this identity's role
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.is_empty() || roles.iter().any(|r| self.has_role(r.as_ref()))
    }
}

/// Why a token could not be turned into an [`Identity`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token is missing the `{0}` claim")]
    MissingClaim(&'static str),

    #[error("token claim `{claim}` must be a non-empty string")]
    InvalidClaim { claim: &'static str },
}

fn unverified_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();
    validation
}

fn string_claim(claims: &Map<String, Value>, claim: &'static str) -> Result<String, TokenError> {
    match claims.get(claim) {
        None | Some(Value::Null) => Err(TokenError::MissingClaim(claim)),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(_) => Err(TokenError::InvalidClaim { claim }),
    }
}

/// Decode the `sub` and `role` claims of an access token
///
/// # Errors
///
/// Returns [`TokenError`] if the token is not a JWT or lacks a usable
/// `sub`/`role` claim
pub fn decode_identity(token: &str) -> Result<Identity, TokenError> {
    let data = decode::<Map<String, Value>>(
        token,
        &DecodingKey::from_secret(&[]),
        &unverified_validation(),
    )
    .map_err(|e| TokenError::Malformed(e.to_string()))?;

    Ok(Identity {
        subject_id: string_claim(&data.claims, "sub")?,
        role: string_claim(&data.claims, "role")?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    /// Mint a signed token the way the API would
    pub(crate) fn token_with(claims: &Value) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .unwrap()
    }

    pub(crate) fn token_for(sub: &str, role: &str) -> String {
        token_with(&json!({ "sub": sub, "role": role, "exp": 4_102_444_800_i64 }))
    }

    #[test]
    fn test_decodes_subject_and_role() {
        let identity = decode_identity(&token_for("user-42", "admin")).unwrap();
        assert_eq!(identity.subject_id, "user-42");
        assert_eq!(identity.role, "admin");
    }

    #[test]
    fn test_expired_token_still_decodes() {
        let token = token_with(&json!({ "sub": "u1", "role": "user", "exp": 1 }));
        assert!(decode_identity(&token).is_ok());
    }

    #[test]
    fn test_garbage_is_malformed() {
        for token in ["", "not-a-jwt", "a.b", "a.b.c"] {
            assert!(
                matches!(decode_identity(token), Err(TokenError::Malformed(_))),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_missing_role() {
        let token = token_with(&json!({ "sub": "u1" }));
        assert_eq!(
            decode_identity(&token),
            Err(TokenError::MissingClaim("role"))
        );
    }

    #[test]
    fn test_non_string_subject() {
        let token = token_with(&json!({ "sub": 17, "role": "user" }));
        assert_eq!(
            decode_identity(&token),
            Err(TokenError::InvalidClaim { claim: "sub" })
        );
    }

    #[test]
    fn test_role_membership() {
        let identity = Identity {
            subject_id: "u1".into(),
            role: "user".into(),
        };
        assert!(identity.has_any_role::<&str>(&[]));
        assert!(identity.has_any_role(&["admin", "user"]));
        assert!(!identity.has_any_role(&["admin"]));
    }
}
