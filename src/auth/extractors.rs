use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use super::{claims::Claims, jwt::JwtKeys};
use crate::error::AppError;

/// Identity of the caller, decoded from a verified bearer token.
///
/// Extracting it is what makes a handler protected: the rejection fires before
/// the handler body runs. Handlers then pass it on explicitly to whatever
/// needs to know who is asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
}

impl From<Claims> for AuthUser {
    fn from(c: Claims) -> Self {
        Self {
            user_id: c.user_id,
            email: c.email,
            username: c.username,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthenticated("missing Authorization header".into()))?;

        let token = bearer_token(header)
            .ok_or_else(|| AppError::Unauthenticated("invalid Authorization header".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token)?;
        Ok(AuthUser::from(claims))
    }
}

/// `Bearer <token>` with a single non-empty, whitespace-free token.
fn bearer_token(header: &str) -> Option<&str> {
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::http::Request;

    async fn extract(state: &AppState, header: Option<&str>) -> Result<AuthUser, AppError> {
        let mut req = Request::builder().uri("/resources");
        if let Some(h) = header {
            req = req.header(AUTHORIZATION, h);
        }
        let (mut parts, _) = req.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, state).await
    }

    #[test]
    fn bearer_token_shapes() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer a b"), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
    }

    #[tokio::test]
    async fn valid_token_yields_identity() {
        let state = AppState::fake();
        let user_id = Uuid::new_v4();
        let token = state.jwt.issue(user_id, "a@x.com", "alice").unwrap();
        let user = extract(&state, Some(&format!("Bearer {token}"))).await.unwrap();
        assert_eq!(
            user,
            AuthUser {
                user_id,
                email: "a@x.com".into(),
                username: "alice".into(),
            }
        );
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let state = AppState::fake();
        let err = extract(&state, None).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn wrong_scheme_is_unauthenticated() {
        let state = AppState::fake();
        let token = state.jwt.issue(Uuid::new_v4(), "a@x.com", "alice").unwrap();
        let err = extract(&state, Some(&format!("Token {token}"))).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn foreign_token_is_unauthenticated() {
        let state = AppState::fake();
        let other = JwtKeys::new(b"someone-else").unwrap();
        let token = other.issue(Uuid::new_v4(), "a@x.com", "alice").unwrap();
        let err = extract(&state, Some(&format!("Bearer {token}"))).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }
}
