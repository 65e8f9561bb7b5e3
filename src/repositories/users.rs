use sqlx::{PgConnection, PgPool};

use crate::db::models::User;
use crate::db::types::UserRole;

const COLUMNS: &str = "\
    id, name, username, email, hashed_password, role, created_by_admin, \
    created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Look a user up by email (case-insensitive) or by username.
pub(crate) async fn find_by_login(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users
         WHERE email = LOWER($1) OR username = $1
         ORDER BY (email = LOWER($1)) DESC
         LIMIT 1"
    ))
    .bind(identifier)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn exists_by_username_or_email(
    pool: &PgPool,
    username: &str,
    email: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT id FROM users WHERE username = $1 OR email = LOWER($2) LIMIT 1",
    )
    .bind(username)
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users ORDER BY created_at DESC"))
        .fetch_all(pool)
        .await
}

pub(crate) struct CreateUser<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub hashed_password: String,
    pub role: UserRole,
    pub created_by_admin: bool,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, name, username, email, hashed_password, role, created_by_admin,
            created_at, updated_at
        ) VALUES ($1,$2,$3,LOWER($4),$5,$6,$7,$8,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.username)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.role)
    .bind(params.created_by_admin)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

/// Promote a plain `user` to `student`. Returns whether the role changed.
pub(crate) async fn elevate_after_enrollment(
    conn: &mut PgConnection,
    id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET role = $1, updated_at = $2
         WHERE id = $3 AND role = $4",
    )
    .bind(UserRole::User.after_enrollment())
    .bind(updated_at)
    .bind(id)
    .bind(UserRole::User)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
