//! Bearer-token authentication for handlers.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use quill_authz::{Claims, TokenService};

use crate::error::AppError;

/// Authenticated caller, extracted from `Authorization: Bearer <token>`.
///
/// The router state must expose an `Arc<TokenService>` through [`FromRef`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.sub
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::unauthorized("token missing or invalid"))?;

        let tokens = Arc::<TokenService>::from_ref(state);
        let claims = tokens.verify(token)?;

        tracing::debug!(user_id = %claims.sub, "request authenticated");
        Ok(AuthUser(claims))
    }
}

/// Token from the `Authorization` header; the scheme is matched case-insensitively.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    #[derive(Clone)]
    struct State {
        tokens: Arc<TokenService>,
    }

    impl FromRef<State> for Arc<TokenService> {
        fn from_ref(state: &State) -> Self {
            state.tokens.clone()
        }
    }

    fn state() -> State {
        State {
            tokens: Arc::new(TokenService::new("secret", 60)),
        }
    }

    async fn extract(header: Option<&str>, state: &State) -> Result<AuthUser, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn accepts_lowercase_bearer_scheme() {
        let state = state();
        let token = state.tokens.issue("user-1", "ada").unwrap();

        let user = extract(Some(&format!("bearer {}", token)), &state).await.unwrap();
        assert_eq!(user.id(), "user-1");
        assert_eq!(user.username(), "ada");
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let err = extract(None, &state()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_token_is_unauthorized() {
        let err = extract(Some("Bearer dkkasfkasjkadsjad"), &state()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn other_scheme_is_unauthorized() {
        let state = state();
        let token = state.tokens.issue("user-1", "ada").unwrap();

        let err = extract(Some(&format!("Basic {}", token)), &state).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
