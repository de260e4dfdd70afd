//! Bearer token authentication.

pub mod jwt;
pub mod models;

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use std::convert::Infallible;

pub use jwt::{issue_token, JwtAuthenticator};
pub use models::JwtClaims;

/// Raw bearer token from the `Authorization` header, if one was sent.
///
/// Extraction never fails; a missing or malformed header yields `None` and the upload
/// pipeline reports it as unauthorized.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string());

        Ok(BearerToken(token))
    }
}
