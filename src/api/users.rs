use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::RequireAdmin;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::user::{AdminUserCreate, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_users).post(create_user))
}

async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = repositories::users::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminUserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let username = payload.resolved_username();
    if username.is_empty() {
        return Err(ApiError::BadRequest("username must not be empty".to_string()));
    }
    let email = payload.email.trim().to_lowercase();

    let existing = repositories::users::exists_by_username_or_email(state.db(), &username, &email)
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
            username: &username,
            email: &email,
            hashed_password,
            role: payload.role,
            created_by_admin: true,
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

    tracing::info!(
        admin_id = %admin.user_id,
        user_id = %user.id,
        role = user.role.as_str(),
        action = "user_create",
        "Admin created user"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::db::types::UserRole;
    use crate::test_support;

    #[tokio::test]
    async fn admin_creates_student_with_default_username() {
        let ctx = test_support::setup_test_context().await;

        let admin =
            test_support::insert_user(ctx.state.db(), "root", UserRole::Admin, "admin-pass").await;
        let token = test_support::session_token(&admin.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/users",
                Some(&token),
                Some(json!({
                    "name": "Layla Hassan",
                    "email": "Layla.Hassan@Academy.com",
                    "password": "123456"
                })),
            ))
            .await
            .expect("create user");

        let status = response.status();
        let created = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "response: {created}");
        assert_eq!(created["username"], "Layla.Hassan");
        assert_eq!(created["email"], "layla.hassan@academy.com");
        assert_eq!(created["role"], "student");
        assert_eq!(created["created_by_admin"], true);
        assert!(created.get("hashed_password").is_none());

        let response = ctx
            .app
            .oneshot(test_support::json_request(Method::GET, "/api/v1/users", Some(&token), None))
            .await
            .expect("list users");
        let status = response.status();
        let listed = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {listed}");
        assert_eq!(listed.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn learners_cannot_manage_users() {
        let ctx = test_support::setup_test_context().await;

        let student =
            test_support::insert_user(ctx.state.db(), "sara", UserRole::Student, "student-pass")
                .await;
        let token = test_support::session_token(&student.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/users", Some(&token), None))
            .await
            .expect("list users");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = ctx
            .app
            .oneshot(test_support::json_request(Method::GET, "/api/v1/users", None, None))
            .await
            .expect("list users anonymously");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
