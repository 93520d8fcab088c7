use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::jwt::JwtKeys;
use super::repo::User;
use crate::error::AppError;
use crate::state::AppState;

/// Resolves a request's bearer token into the live user record, or rejects
/// the request. Account state is read fresh from the store on every request,
/// so deactivation takes effect immediately for unexpired tokens.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let keys = JwtKeys::from_ref(state);
        let user_id = keys.validate(token)?;

        // Token for a since-removed user is just "not authenticated".
        let user = User::find_by_id(&state.db, user_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        if !user.is_active {
            warn!(user_id = %user.id, "inactive user rejected");
            return Err(AppError::Forbidden);
        }

        Ok(CurrentUser(user))
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthenticated)?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or(AppError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers).unwrap_err(),
            AppError::Unauthenticated
        ));
    }

    #[test]
    fn non_bearer_scheme_is_unauthenticated() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert!(matches!(
            bearer_token(&headers).unwrap_err(),
            AppError::Unauthenticated
        ));
    }
}
