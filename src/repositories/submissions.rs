use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Submission, SubmissionIdentity};
use crate::services::grading::GradeOutcome;

const COLUMNS: &str = "\
    id, exam_id, user_id, answers, score, total, percentage, passed, \
    anonymous_name, anonymous_email, created_at";

/// Submission joined with exam title and submitter details, for listings.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SubmissionListRow {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: Option<String>,
    pub(crate) user_id: Option<String>,
    pub(crate) user_name: Option<String>,
    pub(crate) user_email: Option<String>,
    pub(crate) username: Option<String>,
    pub(crate) anonymous_name: Option<String>,
    pub(crate) anonymous_email: Option<String>,
    pub(crate) score: i32,
    pub(crate) total: i32,
    pub(crate) percentage: i32,
    pub(crate) passed: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

const LIST_SELECT: &str = "\
    SELECT s.id, s.exam_id, e.title AS exam_title, s.user_id, u.name AS user_name,
           u.email AS user_email, u.username, s.anonymous_name, s.anonymous_email,
           s.score, s.total, s.percentage, s.passed, s.created_at
    FROM submissions s
    LEFT JOIN exams e ON e.id = s.exam_id
    LEFT JOIN users u ON u.id = s.user_id";

pub(crate) struct CreateSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) identity: &'a SubmissionIdentity,
    pub(crate) answers: &'a [Option<i64>],
    pub(crate) outcome: GradeOutcome,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSubmission<'_>,
) -> Result<Submission, sqlx::Error> {
    let (user_id, anonymous_name, anonymous_email) = match params.identity {
        SubmissionIdentity::Authenticated { user_id } => (Some(user_id.as_str()), None, None),
        SubmissionIdentity::Anonymous { name, email } => {
            (None, Some(name.as_str()), Some(email.as_str()))
        }
    };

    sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO submissions (
            id, exam_id, user_id, answers, score, total, percentage, passed,
            anonymous_name, anonymous_email, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(user_id)
    .bind(Json(params.answers))
    .bind(params.outcome.score)
    .bind(params.outcome.total)
    .bind(params.outcome.percentage)
    .bind(params.outcome.passed)
    .bind(anonymous_name)
    .bind(anonymous_email)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    exam_id: Option<&str>,
) -> Result<Vec<SubmissionListRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionListRow>(&format!(
        "{LIST_SELECT} WHERE ($1::varchar IS NULL OR s.exam_id = $1) ORDER BY s.created_at DESC"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<SubmissionListRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionListRow>(&format!(
        "{LIST_SELECT} WHERE s.user_id = $1 ORDER BY s.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!("SELECT {COLUMNS} FROM submissions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}
