//! Request extractors: caller identity, cart session and validated JSON bodies.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::{ApiError, AppState};
use crate::domain::value_objects::{SessionId, UserId};
use crate::StorefrontError;

pub const CART_SESSION_HEADER: &str = "x-cart-session";
pub const CART_SESSION_COOKIE: &str = "cartSession";
const ACCESS_TOKEN_COOKIE: &str = "accessToken";

fn cookie<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Bearer header first, then the access-token cookie.
fn access_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .filter(|token| !token.is_empty())
        .or_else(|| cookie(parts, ACCESS_TOKEN_COOKIE))
}

/// The signed-in user, if any. Unknown or expired tokens count as anonymous.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<UserId>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = access_token(parts) else { return Ok(Self(None)) };
        Ok(Self(state.auth.authenticate(token).await?))
    }
}

/// A signed-in user; anything else is rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct RequireUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.map(Self).ok_or(ApiError(StorefrontError::Unauthorized))
    }
}

/// Anonymous cart token from the `x-cart-session` header, else the `cartSession` cookie.
#[derive(Debug, Clone)]
pub struct CartSession(pub Option<SessionId>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CartSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(CART_SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(SessionId::parse);
        Ok(Self(header.or_else(|| cookie(parts, CART_SESSION_COOKIE).and_then(SessionId::parse))))
    }
}

/// JSON body that passed its `validator` rules. Malformed bodies and rule violations
/// are both rejected with 400.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| StorefrontError::Validation(rejection.body_text()))?;
        value.validate().map_err(|errors| StorefrontError::Validation(errors.to_string()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = HttpRequest::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn header_session_wins_over_cookie() {
        let mut p = parts(&[("x-cart-session", "from-header"), ("cookie", "cartSession=from-cookie")]);
        let CartSession(session) = CartSession::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(session.unwrap().as_str(), "from-header");
    }

    #[tokio::test]
    async fn cookie_session_is_used_when_header_missing() {
        let mut p = parts(&[("cookie", "theme=dark; cartSession=abc123")]);
        let CartSession(session) = CartSession::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(session.unwrap().as_str(), "abc123");

        let mut p = parts(&[("x-cart-session", "   ")]);
        let CartSession(session) = CartSession::from_request_parts(&mut p, &()).await.unwrap();
        assert!(session.is_none());
    }

    #[test]
    fn access_token_prefers_bearer_header() {
        let p = parts(&[("authorization", "Bearer abc"), ("cookie", "accessToken=xyz")]);
        assert_eq!(access_token(&p), Some("abc"));
        let p = parts(&[("cookie", "accessToken=xyz")]);
        assert_eq!(access_token(&p), Some("xyz"));
        assert_eq!(access_token(&parts(&[])), None);
    }
}
