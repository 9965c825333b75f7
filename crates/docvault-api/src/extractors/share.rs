//! Share link password extractor.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header carrying a share link password.
pub const SHARE_PASSWORD_HEADER: &str = "x-share-password";

/// The optional password supplied with a share link request.
#[derive(Debug, Clone, Default)]
pub struct SharePassword(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for SharePassword {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SharePassword(
            parts
                .headers
                .get(SHARE_PASSWORD_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        ))
    }
}
