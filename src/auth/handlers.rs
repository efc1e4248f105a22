use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, LoginResponse,
            MessageResponse, RegisterRequest, ResetPasswordRequest,
        },
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        reset::generate_reset_token,
    },
    error::ApiError,
    sessions,
    state::AppState,
    store::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Names must be 2 to 50 characters.
pub(crate) fn validate_name(field: &str, value: &str) -> Result<(), ApiError> {
    let len = value.chars().count();
    if !(2..=50).contains(&len) {
        return Err(ApiError::Validation(format!(
            "{field} must be between 2 and 50 characters"
        )));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    validate_name("firstName", &payload.first_name)?;
    validate_name("lastName", &payload.last_name)?;
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.chars().count() < 5 {
        return Err(ApiError::Validation("Password too short".into()));
    }

    if state.store.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::new(
        payload.first_name,
        payload.last_name,
        payload.email,
        hash,
        payload.picture_path,
        payload.location,
        payload.occupation,
    );
    state.store.insert(&user).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let mut user = state
        .store
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Validation("User does not exist.".into())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Validation("Invalid credentials.".into()));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    // One session record per login, duration starts at zero.
    sessions::record_login(&mut user, OffsetDateTime::now_utc());
    state.store.update(&user).await?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse { token, user }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, ApiError> {
    let mut user = state
        .store
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let now = OffsetDateTime::now_utc();
    if user.reset_state().is_usable(now) {
        debug!(user_id = %user.id, "replacing a still-pending reset token");
    }

    let token = generate_reset_token();
    user.begin_reset(token.clone(), now);
    state.store.update(&user).await?;

    let reset_link = format!(
        "{}/createNewPassword?token={}&email={}",
        state.config.mail.reset_url_base, token, user.email
    );
    let html = format!(
        "<p>You have requested to reset your password. \
         Click the link below to reset it:</p>\
         <a href=\"{reset_link}\">Reset Password</a>"
    );
    // Delivery failure aborts the request; the caller must never see
    // success for a mail that did not go out.
    state
        .mailer
        .send(&user.email, "Password Reset Request", &html)
        .await?;

    info!(user_id = %user.id, "reset token issued");
    Ok(Json(ForgotPasswordResponse {
        email: user.email,
        reset_token: token,
        message: "Password reset link sent to your email.".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    // The gate is email plus a live expiration; the token value itself is
    // not compared here.
    let mut user = state
        .store
        .find_by_email_with_active_reset(&payload.email, OffsetDateTime::now_utc())
        .await?
        .ok_or_else(|| ApiError::Validation("Invalid or expired reset token".into()))?;

    user.password_hash = hash_password(&payload.password)?;
    user.clear_reset();
    state.store.update(&user).await?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(MessageResponse {
        message: "Password reset successful".into(),
    }))
}
