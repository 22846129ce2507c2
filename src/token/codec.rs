use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// The payload carried by a refresh token.
pub type Claims = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("No refresh token provided")]
    Missing,
    #[error("Invalid refresh token provided")]
    Invalid,
    #[error("No access token provided")]
    MissingAccessToken,
    #[error("Failed to issue refresh token: {0}")]
    Encode(String),
}

/// Sign `claims` with `secret`.
pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &key).map_err(|e| TokenError::Encode(e.to_string()))
}

/// Verify `token` against `secret` and return its claims.
///
/// Any failure, whether a malformed token or a signature mismatch, is reported
/// as `TokenError::Invalid`.
pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    match decode::<Claims>(token, &key, &refresh_validation()) {
        Ok(data) => Ok(data.claims),
        Err(e) => {
            debug!("Refresh token rejected: {}", e);
            Err(TokenError::Invalid)
        }
    }
}

fn refresh_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation
}
