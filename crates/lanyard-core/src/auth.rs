use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by the identity provider's bearer token. `sub` is the
/// provider's numeric subject id; `role` is advisory only — the stored
/// account role is what guards actually check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,
    #[error("token encoding failed")]
    Encoding,
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AuthError::InvalidToken)?;
    Ok(data.claims)
}

/// Mint a token for the given subject. Used by the test suites and by
/// local deployments that run without an external identity provider.
pub fn issue_token(
    sub: i64,
    email: &str,
    name: Option<&str>,
    secret: &str,
    expiry_seconds: i64,
) -> Result<String, AuthError> {
    let claims = Claims {
        sub,
        email: email.to_string(),
        name: name.map(str::to_string),
        role: None,
        exp: chrono::Utc::now().timestamp() + expiry_seconds,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::Encoding)
}
