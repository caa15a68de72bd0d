use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use crate::error::{AppError, AppResult};

pub const VIEWER_COOKIE: &str = "viewer";
pub const VIEWER_HEADER: &str = "x-viewer-id";

// Viewer identity is resolved upstream; this extractor only reads what the
// auth layer left behind. Absence means anonymous, never an error.
#[derive(Clone, Debug)]
pub struct Viewer(pub Option<String>);

impl Viewer {
    pub fn require(self) -> AppResult<String> {
        self.0.ok_or(AppError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(VIEWER_COOKIE) {
            let value = cookie.value().trim();
            if !value.is_empty() {
                return Ok(Viewer(Some(value.to_string())));
            }
        }

        let header = parts
            .headers
            .get(VIEWER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Viewer(header))
    }
}
