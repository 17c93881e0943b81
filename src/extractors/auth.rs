//! Resolve the requesting user from an `Authorization: Token <key>` header.

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// Authentication scheme keyword, matched case-insensitively.
pub const TOKEN_KEYWORD: &str = "token";

/// The authenticated caller. Extracting it is the `IsAuthenticated` check: handlers that take a
/// `CurrentUser` reject anonymous requests before doing anything else.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Pull the key out of an Authorization header value.
/// `Ok(None)` means the header uses some other scheme and the request is anonymous.
pub fn parse_token_header(value: &str) -> Result<Option<&str>, AppError> {
    let mut parts = value.split_whitespace();
    match parts.next() {
        Some(keyword) if keyword.eq_ignore_ascii_case(TOKEN_KEYWORD) => {}
        _ => return Ok(None),
    }
    match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(Some(key)),
        _ => Err(AppError::InvalidToken),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Err(AppError::NotAuthenticated);
        };
        let value = header.to_str().map_err(|_| AppError::InvalidToken)?;
        let key = parse_token_header(value)?.ok_or(AppError::NotAuthenticated)?;
        let user = state.store.user_by_token(key).await?.ok_or_else(|| {
            tracing::debug!("unknown token presented");
            AppError::InvalidToken
        })?;
        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_scheme_is_case_insensitive() {
        assert_eq!(parse_token_header("Token abc").unwrap(), Some("abc"));
        assert_eq!(parse_token_header("token abc").unwrap(), Some("abc"));
    }

    #[test]
    fn other_schemes_are_anonymous() {
        assert_eq!(parse_token_header("Bearer abc").unwrap(), None);
        assert_eq!(parse_token_header("").unwrap(), None);
    }

    #[test]
    fn malformed_token_headers_are_invalid() {
        assert!(matches!(parse_token_header("Token"), Err(AppError::InvalidToken)));
        assert!(matches!(parse_token_header("Token a b"), Err(AppError::InvalidToken)));
    }
}
