use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;

use crate::api::cookies::{session_token, SessionCookie};
use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::types::UserRole;
use crate::repositories;

/// Identity of the caller for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionContext {
    pub(crate) user_id: String,
    pub(crate) role: UserRole,
}

/// Any signed-in caller.
pub(crate) struct Session(pub(crate) SessionContext);
/// Signed-in caller if there is one; never rejects.
pub(crate) struct OptionalSession(pub(crate) Option<SessionContext>);
pub(crate) struct RequireAdmin(pub(crate) SessionContext);
/// A `user` or a `student`.
pub(crate) struct RequireLearner(pub(crate) SessionContext);
pub(crate) struct RequireStudent(pub(crate) SessionContext);

pub(crate) fn is_admin(role: UserRole) -> bool {
    match role {
        UserRole::Admin => true,
        UserRole::User | UserRole::Student => false,
    }
}

pub(crate) fn is_learner(role: UserRole) -> bool {
    match role {
        UserRole::User | UserRole::Student => true,
        UserRole::Admin => false,
    }
}

pub(crate) fn is_student(role: UserRole) -> bool {
    match role {
        UserRole::Student => true,
        UserRole::User | UserRole::Admin => false,
    }
}

/// Resolve the session token and reload the user so role changes apply at once.
/// A missing, invalid or orphaned token yields `None`.
async fn resolve_session(
    parts: &mut Parts,
    state: &AppState,
) -> Result<Option<SessionContext>, ApiError> {
    let State(app_state) = State::<AppState>::from_request_parts(parts, state)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

    let cookie = SessionCookie::from_settings(app_state.settings());
    let Some(token) = session_token(&parts.headers, &cookie) else {
        return Ok(None);
    };

    let claims = match security::verify_session_token(&token, app_state.settings()) {
        Ok(claims) => claims,
        Err(security::SecurityError::SessionExpired) => {
            tracing::debug!("Session token expired");
            return Ok(None);
        }
        Err(err) => {
            tracing::debug!(error = %err, "Rejected session token");
            return Ok(None);
        }
    };

    let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

    Ok(user.map(|user| SessionContext { user_id: user.id, role: user.role }))
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalSession(resolve_session(parts, state).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_session(parts, state)
            .await?
            .map(Session)
            .ok_or(ApiError::Unauthorized("Not authenticated"))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Session(session) = Session::from_request_parts(parts, state).await?;
        if is_admin(session.role) {
            Ok(RequireAdmin(session))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireLearner {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Session(session) = Session::from_request_parts(parts, state).await?;
        if is_learner(session.role) {
            Ok(RequireLearner(session))
        } else {
            Err(ApiError::Forbidden("User or student access required"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Session(session) = Session::from_request_parts(parts, state).await?;
        if is_student(session.role) {
            Ok(RequireStudent(session))
        } else {
            Err(ApiError::Forbidden("Student access required"))
        }
    }
}
