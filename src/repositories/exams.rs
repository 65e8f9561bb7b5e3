use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Exam, Question};

pub(crate) const COLUMNS: &str = "\
    id, title, description, course_id, is_published, questions, duration_minutes, \
    passing_score, is_private, access_token, allow_anonymous, created_at, updated_at";

/// Exam summary with the linked course name, for listings.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamListRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) course_id: Option<String>,
    pub(crate) course_name: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) question_count: i32,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) passing_score: i32,
    pub(crate) is_private: bool,
    pub(crate) allow_anonymous: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

const LIST_SELECT: &str = "\
    SELECT e.id, e.title, e.description, e.course_id, c.name AS course_name,
           e.is_published, jsonb_array_length(e.questions)::int AS question_count,
           e.duration_minutes, e.passing_score, e.is_private, e.allow_anonymous,
           e.created_at
    FROM exams e
    LEFT JOIN courses c ON c.id = e.course_id";

pub(crate) struct CreateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) course_id: Option<&'a str>,
    pub(crate) is_published: bool,
    pub(crate) questions: Vec<Question>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) passing_score: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Default)]
pub(crate) struct UpdateExam {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) course_id: Option<String>,
    pub(crate) is_published: Option<bool>,
    pub(crate) questions: Option<Vec<Question>>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) passing_score: Option<i32>,
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            id, title, description, course_id, is_published, questions, duration_minutes,
            passing_score, is_private, access_token, allow_anonymous, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,FALSE,NULL,FALSE,$9,$9)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.course_id)
    .bind(params.is_published)
    .bind(Json(params.questions))
    .bind(params.duration_minutes)
    .bind(params.passing_score)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_published(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE id = $1 AND is_published = TRUE"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_private_by_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE access_token = $1 AND is_private = TRUE"
    ))
    .bind(token)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<ExamListRow>, sqlx::Error> {
    sqlx::query_as::<_, ExamListRow>(&format!("{LIST_SELECT} ORDER BY e.created_at DESC"))
        .fetch_all(pool)
        .await
}

pub(crate) async fn list_published(pool: &PgPool) -> Result<Vec<ExamListRow>, sqlx::Error> {
    sqlx::query_as::<_, ExamListRow>(&format!(
        "{LIST_SELECT} WHERE e.is_published = TRUE ORDER BY e.created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateExam,
    updated_at: PrimitiveDateTime,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            course_id = COALESCE($3, course_id),
            is_published = COALESCE($4, is_published),
            questions = COALESCE($5, questions),
            duration_minutes = COALESCE($6, duration_minutes),
            passing_score = COALESCE($7, passing_score),
            updated_at = $8
         WHERE id = $9
         RETURNING {COLUMNS}"
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.course_id)
    .bind(params.is_published)
    .bind(params.questions.map(Json))
    .bind(params.duration_minutes)
    .bind(params.passing_score)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn set_published(
    pool: &PgPool,
    id: &str,
    is_published: bool,
    updated_at: PrimitiveDateTime,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET is_published = $1, updated_at = $2 WHERE id = $3 RETURNING {COLUMNS}"
    ))
    .bind(is_published)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Mark the exam private under `token`. Fails with a unique violation on
/// `exams_access_token_key` if the token is already taken.
pub(crate) async fn set_private_access(
    pool: &PgPool,
    id: &str,
    token: &str,
    allow_anonymous: bool,
    updated_at: PrimitiveDateTime,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams
         SET is_private = TRUE, access_token = $1, allow_anonymous = $2, updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(token)
    .bind(allow_anonymous)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
