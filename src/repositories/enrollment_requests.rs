use sqlx::{PgConnection, PgPool};

use crate::db::models::EnrollmentRequest;
use crate::db::types::EnrollmentRequestStatus;

const COLUMNS: &str = "\
    id, user_id, course_id, payment_proof_url, status, message, admin_note, \
    created_at, updated_at";

/// Request joined with the requester and course, for the admin queues.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EnrollmentRequestView {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) user_name: String,
    pub(crate) user_email: String,
    pub(crate) course_id: String,
    pub(crate) course_name: String,
    pub(crate) payment_proof_url: String,
    pub(crate) status: EnrollmentRequestStatus,
    pub(crate) message: String,
    pub(crate) admin_note: String,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

const VIEW_SELECT: &str = "\
    SELECT r.id, r.user_id, u.name AS user_name, u.email AS user_email,
           r.course_id, c.name AS course_name, r.payment_proof_url, r.status,
           r.message, r.admin_note, r.created_at, r.updated_at
    FROM enrollment_requests r
    JOIN users u ON u.id = r.user_id
    JOIN courses c ON c.id = r.course_id";

pub(crate) struct CreateEnrollmentRequest<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) payment_proof_url: &'a str,
    pub(crate) message: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    conn: &mut PgConnection,
    params: CreateEnrollmentRequest<'_>,
) -> Result<EnrollmentRequest, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentRequest>(&format!(
        "INSERT INTO enrollment_requests (
            id, user_id, course_id, payment_proof_url, status, message, admin_note,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,'',$7,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.course_id)
    .bind(params.payment_proof_url)
    .bind(EnrollmentRequestStatus::Pending)
    .bind(params.message)
    .bind(params.created_at)
    .fetch_one(&mut *conn)
    .await
}

pub(crate) async fn find_latest_for_user_course(
    conn: &mut PgConnection,
    user_id: &str,
    course_id: &str,
) -> Result<Option<EnrollmentRequest>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentRequest>(&format!(
        "SELECT {COLUMNS} FROM enrollment_requests
         WHERE user_id = $1 AND course_id = $2
         ORDER BY created_at DESC
         LIMIT 1"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(&mut *conn)
    .await
}

pub(crate) async fn find_by_id_for_update(
    conn: &mut PgConnection,
    id: &str,
) -> Result<Option<EnrollmentRequest>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentRequest>(&format!(
        "SELECT {COLUMNS} FROM enrollment_requests WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

pub(crate) async fn set_decision(
    conn: &mut PgConnection,
    id: &str,
    status: EnrollmentRequestStatus,
    admin_note: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<EnrollmentRequest, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentRequest>(&format!(
        "UPDATE enrollment_requests
         SET status = $1, admin_note = $2, updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(status)
    .bind(admin_note)
    .bind(updated_at)
    .bind(id)
    .fetch_one(&mut *conn)
    .await
}

pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<EnrollmentRequestView>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentRequestView>(&format!(
        "{VIEW_SELECT} WHERE r.course_id = $1 ORDER BY r.created_at DESC"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_status(
    pool: &PgPool,
    status: Option<EnrollmentRequestStatus>,
) -> Result<Vec<EnrollmentRequestView>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentRequestView>(&format!(
        "{VIEW_SELECT} WHERE ($1::enrollmentrequeststatus IS NULL OR r.status = $1)
         ORDER BY r.created_at DESC"
    ))
    .bind(status)
    .fetch_all(pool)
    .await
}
