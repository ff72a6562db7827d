use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::app::AppState;
use crate::auth::{AuthError, Claims, TokenRejection};
use crate::database::Role;
use crate::error::ApiError;

/// Authenticated identity bound to the current request.
///
/// Inserted into the request extensions by [`jwt_auth_middleware`]; it lives
/// and dies with the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub identity_id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = TokenRejection;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = Role::parse(&claims.role).ok_or(TokenRejection::Malformed)?;
        Ok(Self {
            identity_id: claims.identity_id,
            role,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AuthError::Unauthorized(TokenRejection::Missing).into())
    }
}

/// JWT authentication middleware that validates tokens and binds the identity
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let raw = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(TokenRejection::Missing)
        .and_then(|value| value.to_str().map_err(|_| TokenRejection::Malformed))
        .map_err(|reason| {
            debug!("Rejected request to {}: {}", request.uri().path(), reason);
            AuthError::Unauthorized(reason)
        })?;

    let claims = state.validator.validate(raw)?;
    let auth_user = AuthUser::try_from(claims).map_err(AuthError::Unauthorized)?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Admit only admin identities. Must run after [`jwt_auth_middleware`].
pub async fn require_admin(user: AuthUser, request: Request, next: Next) -> Result<Response, ApiError> {
    if !user.is_admin() {
        debug!("Identity {} lacks admin role for {}", user.identity_id, request.uri().path());
        return Err(ApiError::forbidden("Admin role required"));
    }
    Ok(next.run(request).await)
}
