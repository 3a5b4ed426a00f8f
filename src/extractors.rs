use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::auth::{gate, AuthContext};
use crate::state::AppState;

/// Derives the request's `AuthContext` from the `Authorization` header.
///
/// Never rejects: invalid or absent credentials yield an anonymous context,
/// and operations that need a caller enforce it themselves.
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        Ok(gate::derive(&state.credentials, authorization))
    }
}
