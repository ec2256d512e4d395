//! Caller identity extraction.
//!
//! The fronting authentication collaborator places the opaque identity in
//! the `x-caller-identity` header; handlers never look at network
//! metadata. A missing or malformed header is a 401 before any handler
//! runs.

use crate::error::ApiError;
use agora_core::CallerIdentity;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const IDENTITY_HEADER: &str = "x-caller-identity";

/// Extractor wrapping the verified caller identity.
#[derive(Debug, Clone)]
pub struct Identity(pub CallerIdentity);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(IDENTITY_HEADER)
            .ok_or(ApiError::MissingIdentity)?;
        let raw = value
            .to_str()
            .map_err(|_| ApiError::InvalidIdentity("not valid UTF-8".to_string()))?;
        let identity =
            CallerIdentity::new(raw).map_err(|e| ApiError::InvalidIdentity(e.to_string()))?;
        Ok(Identity(identity))
    }
}
