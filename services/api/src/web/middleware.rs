//! services/api/src/web/middleware.rs
//!
//! Bearer-token authentication and role gating for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use brightlearn_core::domain::{AccountStatus, Role};
use brightlearn_core::ports::PortError;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::state::AppState;

/// The caller, as proven by their token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Records keyed by a user id are visible to that user and to staff.
    pub fn ensure_can_read(&self, user_id: Uuid) -> Result<(), HttpError> {
        if self.id == user_id || self.role.is_staff() {
            Ok(())
        } else {
            Err(HttpError::forbidden())
        }
    }

    pub fn ensure_is(&self, user_id: Uuid) -> Result<(), HttpError> {
        if self.id == user_id {
            Ok(())
        } else {
            Err(HttpError::forbidden())
        }
    }

    pub fn ensure_staff(&self) -> Result<(), HttpError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(HttpError::forbidden())
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| HttpError::unauthorized("No token provided"))
    }
}

/// Middleware that validates the `Authorization: Bearer` token.
///
/// If valid and the account is still active, inserts the `AuthUser` into request extensions for handlers to use.
/// If missing or invalid, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| HttpError::unauthorized("No token provided"))?;

    // 2. Verify it and read the claims
    let claims = state.tokens.verify(token).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        HttpError::unauthorized("Invalid token")
    })?;
    let role = claims
        .role()
        .ok_or_else(|| HttpError::unauthorized("Invalid token"))?;

    // 3. The account must still exist and be active
    match state.db.get_user(claims.id).await {
        Ok(user) if user.status == AccountStatus::Active => {}
        Ok(_) => return Err(HttpError::unauthorized("Account deactivated")),
        Err(PortError::NotFound(_)) => return Err(HttpError::unauthorized("Invalid token")),
        Err(e) => return Err(e.into()),
    }

    // 4. Hand the caller to the handler
    req.extensions_mut().insert(AuthUser { id: claims.id, role });
    Ok(next.run(req).await)
}

/// Middleware that admits only callers holding `required`. Must run after
/// `require_auth`.
pub async fn require_role(
    State(required): State<Role>,
    req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| HttpError::unauthorized("No token provided"))?;
    if user.role != required {
        return Err(HttpError::forbidden());
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn students_only_read_their_own_records() {
        let student = caller(Role::Student);
        assert!(student.ensure_can_read(student.id).is_ok());
        assert!(student.ensure_can_read(Uuid::new_v4()).is_err());
    }

    #[test]
    fn staff_read_anyone() {
        assert!(caller(Role::Teacher).ensure_can_read(Uuid::new_v4()).is_ok());
        assert!(caller(Role::Admin).ensure_can_read(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn self_check_ignores_role() {
        let admin = caller(Role::Admin);
        assert!(admin.ensure_is(Uuid::new_v4()).is_err());
        assert!(admin.ensure_is(admin.id).is_ok());
    }
}
