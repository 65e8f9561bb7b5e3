use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;
use validator::Validate;

use crate::api::cookies::SessionCookie;
use crate::api::errors::ApiError;
use crate::api::guards::{is_admin, is_learner, Session};
use crate::api::users;
use crate::core::redis::AttemptBudget;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::user::{LoginRequest, RegisterRequest, SessionResponse, UserResponse};
use crate::schemas::MessageResponse;

const REGISTER_BUDGET: AttemptBudget =
    AttemptBudget { action: "register", limit: 10, window_seconds: 60 };
const LOGIN_BUDGET: AttemptBudget =
    AttemptBudget { action: "login", limit: 10, window_seconds: 60 };
const ADMIN_LOGIN_BUDGET: AttemptBudget =
    AttemptBudget { action: "admin-login", limit: 5, window_seconds: 60 };

type WithCookie<T> = (CookieJar, Json<T>);

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/admin/login", post(admin_login))
        .route("/logout", post(logout))
        .route("/admin/logout", post(logout))
        .nest("/admin/users", users::router())
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let email = payload.email.trim().to_lowercase();
    let username = payload.username.trim();

    enforce_rate_limit(
        &state,
        REGISTER_BUDGET,
        &email,
        "Too many registration attempts, try again later",
    )
    .await?;

    let existing = repositories::users::exists_by_username_or_email(state.db(), username, &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "User with this email or username already exists".to_string(),
        ));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            username,
            email: &email,
            hashed_password,
            role: UserRole::User,
            created_by_admin: false,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| match crate::db::unique_violation(&e) {
        Some(_) => {
            ApiError::Conflict("User with this email or username already exists".to_string())
        }
        None => ApiError::internal(e, "Failed to create user"),
    })?;

    tracing::info!(user_id = %user.id, action = "register", "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<WithCookie<SessionResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    enforce_rate_limit(
        &state,
        LOGIN_BUDGET,
        &payload.identifier,
        "Too many login attempts, try again later",
    )
    .await?;

    let user = authenticate(&state, &payload, "Invalid credentials").await?;
    if !is_learner(user.role) {
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    start_session(&state, user, "Logged in successfully")
}

async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<WithCookie<SessionResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    enforce_rate_limit(
        &state,
        ADMIN_LOGIN_BUDGET,
        &payload.identifier,
        "Too many login attempts, try again later",
    )
    .await?;

    let user = authenticate(&state, &payload, "Invalid admin credentials").await?;
    if !is_admin(user.role) {
        return Err(ApiError::Unauthorized("Invalid admin credentials"));
    }

    start_session(&state, user, "Admin logged in successfully")
}

async fn logout(
    State(state): State<AppState>,
    Session(session): Session,
) -> Result<WithCookie<MessageResponse>, ApiError> {
    let jar = SessionCookie::from_settings(state.settings()).clear();

    tracing::info!(user_id = %session.user_id, action = "logout", "User logged out");

    Ok((jar, Json(MessageResponse::new("Logged out successfully"))))
}

async fn me(
    State(state): State<AppState>,
    Session(session): Session,
) -> Result<Json<UserResponse>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &session.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Not authenticated"))?;

    Ok(Json(UserResponse::from_db(user)))
}

async fn enforce_rate_limit(
    state: &AppState,
    budget: AttemptBudget,
    identifier: &str,
    message: &'static str,
) -> Result<(), ApiError> {
    let allowed = match state.redis().try_attempt(budget, identifier).await {
        Ok(allowed) => allowed,
        Err(err) => {
            tracing::warn!(error = %err, action = budget.action, "Rate limit check failed");
            true
        }
    };

    if allowed {
        Ok(())
    } else {
        tracing::info!(action = budget.action, "Rate limit exceeded");
        Err(ApiError::TooManyRequests(message))
    }
}

async fn authenticate(
    state: &AppState,
    payload: &LoginRequest,
    failure: &'static str,
) -> Result<User, ApiError> {
    let user = repositories::users::find_by_login(state.db(), payload.identifier.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized(failure))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized(failure))?;
    if !verified {
        return Err(ApiError::Unauthorized(failure));
    }

    Ok(user)
}

fn start_session(
    state: &AppState,
    user: User,
    message: &str,
) -> Result<WithCookie<SessionResponse>, ApiError> {
    let token = security::create_session_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create session token"))?;
    let jar = SessionCookie::from_settings(state.settings()).issue(token);

    tracing::info!(
        user_id = %user.id,
        role = user.role.as_str(),
        action = "login",
        "Session started"
    );

    let response = SessionResponse {
        message: message.to_string(),
        role: user.role,
        user: UserResponse::from_db(user),
    };
    Ok((jar, Json(response)))
}
