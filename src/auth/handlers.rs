use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, UserResponse};
use super::repo_types::User;
use super::services::{check_new_password, hash_password, normalize_email, verify_password};
use super::tokens::{AuthUser, TokenKeys, TokenUse};
use crate::state::AppState;

type ApiError = (StatusCode, String);

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn internal(what: &str, e: anyhow::Error) -> ApiError {
    error!(error = %e, "{} failed", what);
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{} failed", what))
}

fn token_response(keys: &TokenKeys, user: User) -> Result<TokenResponse, ApiError> {
    let access_token = keys
        .issue(user.id, TokenUse::Access)
        .map_err(|e| internal("token signing", e))?;
    let refresh_token = keys
        .issue(user.id, TokenUse::Refresh)
        .map_err(|e| internal("token signing", e))?;
    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "bearer",
        user: user.into(),
    })
}

/// Tokens outlive account changes, so every token-based lookup rechecks the row.
async fn active_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| internal("user lookup", e))?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    if !user.is_active {
        warn!(%user_id, "token presented for inactive account");
        return Err((StatusCode::UNAUTHORIZED, "User is inactive".into()));
    }
    Ok(user)
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let bad_request = |msg: &str| (StatusCode::BAD_REQUEST, msg.to_string());
    let email = normalize_email(&body.email).map_err(bad_request)?;
    check_new_password(&body.password).map_err(bad_request)?;

    let hash = hash_password(&body.password).map_err(|e| internal("password hashing", e))?;
    let user = User::insert_new(&state.db, &email, &hash)
        .await
        .map_err(|e| internal("registration", e))?
        .ok_or_else(|| {
            warn!(%email, "email already registered");
            (StatusCode::CONFLICT, "Email already registered".to_string())
        })?;

    info!(user_id = %user.id, "user registered");
    Ok(Json(token_response(&TokenKeys::from_ref(&state), user)?))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let invalid = || (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string());
    let email =
        normalize_email(&body.email).map_err(|msg| (StatusCode::BAD_REQUEST, msg.to_string()))?;

    let Some(user) = User::find_by_email(&state.db, &email)
        .await
        .map_err(|e| internal("login", e))?
    else {
        return Err(invalid());
    };
    if !verify_password(&body.password, &user.password_hash).map_err(|e| internal("login", e))? {
        warn!(user_id = %user.id, "wrong password");
        return Err(invalid());
    }
    if !user.is_active {
        return Err((StatusCode::FORBIDDEN, "User is inactive".into()));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(token_response(&TokenKeys::from_ref(&state), user)?))
}

#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let keys = TokenKeys::from_ref(&state);
    let claims = keys
        .verify(&body.refresh_token, TokenUse::Refresh)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            (StatusCode::UNAUTHORIZED, "Invalid refresh token".to_string())
        })?;
    let user = active_user(&state, claims.sub).await?;
    Ok(Json(token_response(&keys, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(active_user(&state, user_id).await?.into()))
}
