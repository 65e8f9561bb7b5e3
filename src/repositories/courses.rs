use sqlx::PgPool;

use crate::db::models::Course;
use crate::db::types::CourseLevel;

pub(crate) const COURSE_COLUMNS: &str = "\
    id, name, description, duration, instructor, image_path, level, prerequisites, \
    syllabus, created_at, updated_at";

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) description: &'a str,
    pub(crate) duration: &'a str,
    pub(crate) instructor: &'a str,
    pub(crate) image_path: Option<&'a str>,
    pub(crate) level: CourseLevel,
    pub(crate) prerequisites: Option<&'a str>,
    pub(crate) syllabus: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

#[derive(Default)]
pub(crate) struct UpdateCourse {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) duration: Option<String>,
    pub(crate) instructor: Option<String>,
    pub(crate) image_path: Option<String>,
    pub(crate) level: Option<CourseLevel>,
    pub(crate) prerequisites: Option<String>,
    pub(crate) syllabus: Option<String>,
}

pub(crate) async fn create(pool: &PgPool, params: CreateCourse<'_>) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            id, name, description, duration, instructor, image_path, level,
            prerequisites, syllabus, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
         RETURNING {COURSE_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.description)
    .bind(params.duration)
    .bind(params.instructor)
    .bind(params.image_path)
    .bind(params.level)
    .bind(params.prerequisites)
    .bind(params.syllabus)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    course_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(course_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Apply a partial update; returns `None` when the course does not exist.
pub(crate) async fn update(
    pool: &PgPool,
    course_id: &str,
    params: UpdateCourse,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            duration = COALESCE($3, duration),
            instructor = COALESCE($4, instructor),
            image_path = COALESCE($5, image_path),
            level = COALESCE($6, level),
            prerequisites = COALESCE($7, prerequisites),
            syllabus = COALESCE($8, syllabus),
            updated_at = $9
         WHERE id = $10
         RETURNING {COURSE_COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.description)
    .bind(params.duration)
    .bind(params.instructor)
    .bind(params.image_path)
    .bind(params.level)
    .bind(params.prerequisites)
    .bind(params.syllabus)
    .bind(updated_at)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, course_id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM courses WHERE id = $1").bind(course_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
