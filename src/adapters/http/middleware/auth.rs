//! Identity middleware and extractors for axum.
//!
//! Sessions are terminated by the identity gateway in front of this service,
//! which forwards the verified caller as headers:
//!
//! ```text
//! X-User-Id: <opaque user id>      (required for authenticated routes)
//! X-User-Email: <address>          (optional)
//! X-User-Role: admin | customer    (optional, defaults to customer)
//! ```
//!
//! ```text
//! Request → identity_middleware → injects AuthenticatedUser into extensions
//!                                        ↓
//!                                Handler → RequireAuth reads from extensions
//! ```

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use super::super::error::ErrorResponse;
use crate::domain::foundation::{AuthError, AuthenticatedUser, Role, UserId};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Reads the forwarded identity headers.
///
/// `Ok(None)` when no identity was forwarded at all.
pub fn identity_from_headers(headers: &HeaderMap) -> Result<Option<AuthenticatedUser>, AuthError> {
    let header = |name: &str| {
        headers
            .get(name)
            .map(|v| {
                v.to_str()
                    .map(|s| s.trim().to_string())
                    .map_err(|_| AuthError::InvalidIdentity(format!("{} is not valid text", name)))
            })
            .transpose()
    };

    let Some(raw_id) = header(USER_ID_HEADER)? else {
        return Ok(None);
    };
    let id = UserId::new(raw_id).map_err(|e| AuthError::InvalidIdentity(e.to_string()))?;
    let email = header(USER_EMAIL_HEADER)?.filter(|e| !e.is_empty());
    let role = header(USER_ROLE_HEADER)?
        .map(|r| Role::from_claim(&r))
        .unwrap_or(Role::Customer);

    Ok(Some(AuthenticatedUser::new(id, email, role)))
}

/// Identity middleware.
///
/// 1. Parses the forwarded identity headers
/// 2. On success, injects `AuthenticatedUser` into request extensions
/// 3. Without identity headers, continues unauthenticated
/// 4. On malformed identity headers, returns 401
pub async fn identity_middleware(mut request: Request, next: Next) -> Response {
    match identity_from_headers(request.headers()) {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed identity headers");
            AuthRejection::Invalid.into_response()
        }
    }
}

/// Extractor that requires an authenticated caller.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

impl<S> axum::extract::FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .cloned()
                .map(RequireAuth)
                .ok_or(AuthRejection::Unauthenticated)
        })
    }
}

/// Extractor for routes that work with or without a caller.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl<S> axum::extract::FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user = parts.extensions.get::<AuthenticatedUser>().cloned();
            Ok(OptionalAuth(user))
        })
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// No identity was forwarded.
    Unauthenticated,
    /// Identity headers were present but unusable.
    Invalid,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = match self {
            AuthRejection::Unauthenticated => {
                ErrorResponse::new("UNAUTHENTICATED", "Authentication required")
            }
            AuthRejection::Invalid => ErrorResponse::new("INVALID_IDENTITY", "Invalid identity"),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequestParts;
    use axum::http::{HeaderValue, Request};

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn no_headers_means_anonymous() {
        assert_eq!(identity_from_headers(&HeaderMap::new()).unwrap().map(|u| u.id), None);
    }

    #[test]
    fn full_identity_is_parsed() {
        let user = identity_from_headers(&headers(&[
            (USER_ID_HEADER, "staff-1"),
            (USER_EMAIL_HEADER, "staff@example.com"),
            (USER_ROLE_HEADER, "admin"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(user.id.as_str(), "staff-1");
        assert_eq!(user.email.as_deref(), Some("staff@example.com"));
        assert!(user.is_admin());
    }

    #[test]
    fn role_defaults_to_customer() {
        let user = identity_from_headers(&headers(&[(USER_ID_HEADER, "alice")]))
            .unwrap()
            .unwrap();
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.email, None);
    }

    #[test]
    fn blank_user_id_is_invalid() {
        let result = identity_from_headers(&headers(&[(USER_ID_HEADER, "  ")]));
        assert!(matches!(result, Err(AuthError::InvalidIdentity(_))));
    }

    #[tokio::test]
    async fn require_auth_extracts_user_from_extensions() {
        let mut request: Request<()> = Request::builder().uri("/test").body(()).unwrap();
        request
            .extensions_mut()
            .insert(AuthenticatedUser::customer(UserId::new("alice").unwrap()));
        let (mut parts, _body) = request.into_parts();

        let RequireAuth(user) = RequireAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.id.as_str(), "alice");
    }

    #[tokio::test]
    async fn require_auth_rejects_without_user() {
        let request: Request<()> = Request::builder().uri("/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let result = RequireAuth::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.unwrap_err(), AuthRejection::Unauthenticated);
    }

    #[tokio::test]
    async fn optional_auth_never_rejects() {
        let request: Request<()> = Request::builder().uri("/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let OptionalAuth(user) = OptionalAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(user.is_none());
    }
}
