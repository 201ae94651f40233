//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration and login, plus the password
//! helpers shared with the profile and admin endpoints.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use brightlearn_core::domain::{AccountStatus, NewUser, Role};
use brightlearn_core::ports::{DatabaseService, PortError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::BootstrapAdmin;
use crate::error::{ApiError, ErrorBody, HttpError};
use crate::web::dto::UserDto;
use crate::web::extract::{required, Json, UserId};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// `student` (default) or `teacher`.
    pub role: Option<String>,
    pub school_email: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
    pub user_id: Uuid,
    pub message: String,
}

//=========================================================================================
// Password Helpers
//=========================================================================================

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Hashes a password inside a handler, turning failures into a logged 500.
pub fn hash_for_request(password: &str) -> Result<String, HttpError> {
    hash_password(password).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        HttpError::internal()
    })
}

fn verify_password(password: &str, hash: &str) -> Result<bool, HttpError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        HttpError::internal()
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/register - Create a new student or teacher account
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = RegisterResponse),
        (status = 400, description = "Missing fields or invalid role", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let name = required(req.name)?;
    let email = normalize_email(&required(req.email)?);
    let password = required(req.password)?;

    let role = match req.role.as_deref().map(Role::from_str) {
        None => Role::Student,
        Some(Ok(role)) if role != Role::Admin => role,
        Some(_) => return Err(HttpError::bad_request("Invalid role")),
    };

    let user = state
        .db
        .create_user(NewUser {
            name: name.trim().to_string(),
            email,
            hashed_password: hash_for_request(&password)?,
            role,
            school_email: req.school_email,
        })
        .await?;
    info!(user_id = %user.id, role = %user.role, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// POST /api/login - Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 401, description = "Wrong password", body = ErrorBody),
        (status = 404, description = "Unknown or inactive account", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let email = normalize_email(&required(req.email)?);
    let password = required(req.password)?;

    // 1. Find an active account
    let creds = state.db.get_credentials_by_email(&email).await?;
    if creds.user.status != AccountStatus::Active {
        return Err(HttpError::not_found("User not found"));
    }

    // 2. Verify password
    if !verify_password(&password, &creds.hashed_password)? {
        return Err(HttpError::unauthorized("Invalid password"));
    }

    // 3. Issue the token
    let token = state.tokens.issue(creds.user.id, creds.user.role).map_err(|e| {
        error!("Failed to encode access token: {:?}", e);
        HttpError::internal()
    })?;

    Ok(Json(LoginResponse {
        token,
        role: creds.user.role.as_str().to_string(),
        user_id: creds.user.id,
        message: "Login successful".to_string(),
    }))
}

/// GET /api/users/{id} - A user's profile
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    UserId(user_id): UserId,
) -> Result<Json<UserDto>, HttpError> {
    Ok(Json(state.db.get_user(user_id).await?.into()))
}

//=========================================================================================
// Startup
//=========================================================================================

/// Creates the configured admin account unless its email is already taken.
pub async fn ensure_admin(db: &dyn DatabaseService, admin: &BootstrapAdmin) -> Result<(), ApiError> {
    let email = normalize_email(&admin.email);
    match db.get_credentials_by_email(&email).await {
        Ok(_) => return Ok(()),
        Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let hashed_password =
        hash_password(&admin.password).map_err(|e| ApiError::Internal(format!("hashing admin password: {}", e)))?;
    let user = db
        .create_user(NewUser {
            name: admin.name.clone(),
            email,
            hashed_password,
            role: Role::Admin,
            school_email: None,
        })
        .await?;
    info!(user_id = %user.id, "Created bootstrap admin account");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn emails_are_compared_case_insensitively() {
        assert_eq!(normalize_email("  Alice@Student.COM "), "alice@student.com");
    }
}
