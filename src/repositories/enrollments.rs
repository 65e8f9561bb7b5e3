use sqlx::{PgConnection, PgPool};

use crate::db::models::{Course, Enrollment};
use crate::db::types::EnrollmentStatus;

const COLUMNS: &str = "id, user_id, course_id, status, created_at, updated_at";

pub(crate) async fn find_for_user_course(
    conn: &mut PgConnection,
    user_id: &str,
    course_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE user_id = $1 AND course_id = $2"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(&mut *conn)
    .await
}

/// Create the pair's enrollment, or reactivate it if one already exists.
/// The (user, course) unique key keeps this at one row per pair.
pub(crate) async fn activate(
    conn: &mut PgConnection,
    id: &str,
    user_id: &str,
    course_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<Enrollment, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "INSERT INTO enrollments (id, user_id, course_id, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $5)
         ON CONFLICT (user_id, course_id)
         DO UPDATE SET status = EXCLUDED.status, updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(course_id)
    .bind(EnrollmentStatus::Active)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
}

/// Cancel the pair's active enrollment; `None` when there is none.
pub(crate) async fn cancel(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "UPDATE enrollments SET status = $1, updated_at = $2
         WHERE user_id = $3 AND course_id = $4 AND status = $5
         RETURNING {COLUMNS}"
    ))
    .bind(EnrollmentStatus::Cancelled)
    .bind(now)
    .bind(user_id)
    .bind(course_id)
    .bind(EnrollmentStatus::Active)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_active_courses(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT c.id, c.name, c.description, c.duration, c.instructor, c.image_path, c.level,
                c.prerequisites, c.syllabus, c.created_at, c.updated_at
         FROM enrollments e
         JOIN courses c ON c.id = e.course_id
         WHERE e.user_id = $1 AND e.status = $2
         ORDER BY e.created_at DESC",
    )
    .bind(user_id)
    .bind(EnrollmentStatus::Active)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
pub(crate) async fn count_active_for_user_course(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM enrollments WHERE user_id = $1 AND course_id = $2 AND status = $3",
    )
    .bind(user_id)
    .bind(course_id)
    .bind(EnrollmentStatus::Active)
    .fetch_one(pool)
    .await
}
