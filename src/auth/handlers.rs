use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{CreateUserRequest, TokenRequest, TokenResponse, UpdateMeRequest, UserResponse},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::User,
    },
    error::ApiError,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 5;

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Lowercased, trimmed form used as the identity key.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.email = normalize_email(&payload.email);

    if payload.email.is_empty() || !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("a valid email address is required"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::validation("email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    // A concurrent insert still trips the unique constraint, which maps to 400
    let user = User::create(&state.db, &payload.email, &payload.name, &hash).await?;

    info!(user_id = %user.id, email = %user.email, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(mut payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = normalize_email(&payload.email);

    // Field-shape problems are validation failures, checked before any
    // credential is looked at.
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("email and password are required"));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "token request for unknown email");
            return Err(ApiError::Credentials);
        }
    };

    if !user.is_active {
        warn!(user_id = %user.id, "token request for inactive user");
        return Err(ApiError::Credentials);
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "token request with wrong password");
        return Err(ApiError::Credentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, "token issued");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let password_hash = match payload.password.as_deref() {
        Some(pw) if pw.len() < MIN_PASSWORD_LEN => {
            return Err(ApiError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )))
        }
        Some(pw) => Some(hash_password(pw)?),
        None => None,
    };

    let user = User::update_profile(
        &state.db,
        user_id,
        payload.name.as_deref(),
        password_hash.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(user.into()))
}

/// Fallback for unsupported verbs on the profile endpoint.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plausible_addresses() {
        assert!(is_valid_email("test.test@django.com"));
        assert!(is_valid_email("a@b.co"));
    }

    #[test]
    fn email_validation_rejects_junk() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("one"));
        assert!(!is_valid_email("missing-at.example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_email("  Test@Example.COM "), "test@example.com");
    }
}
