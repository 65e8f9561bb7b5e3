use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::OptionalJson;
use crate::api::guards::{RequireAdmin, RequireLearner};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::course::{
    CourseCreate, CourseResponse, CourseUpdate, DecisionRequest, DecisionResponse,
    EnrollmentRequestCreate, EnrollmentRequestDetail, EnrollmentRequestResponse,
    EnrollmentResponse, EnrollmentStatusResponse, RequestQueueQuery,
};
use crate::services::enrollment_workflow::{self, Decision};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/enrollments/my-courses", get(my_courses))
        .route("/admin/enrollment-requests", get(list_request_queue))
        .route("/admin/enrollment-requests/:request_id/approve", post(approve_request))
        .route("/admin/enrollment-requests/:request_id/reject", post(reject_request))
        .route("/:course_id", get(get_course).put(update_course).delete(delete_course))
        .route("/:course_id/request-enrollment", post(request_enrollment))
        .route("/:course_id/enrollment-status", get(enrollment_status))
        .route("/:course_id/unenroll", post(unenroll))
        .route("/:course_id/enrollment-requests", get(list_course_requests))
}

async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

async fn get_course(
    Path(course_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    Ok(Json(CourseResponse::from_db(course)))
}

async fn create_course(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            description: payload.description.trim(),
            duration: payload.duration.trim(),
            instructor: payload.instructor.trim(),
            image_path: payload.image_path.as_deref(),
            level: payload.level,
            prerequisites: payload.prerequisites.as_deref(),
            syllabus: payload.syllabus.as_deref(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create course"))?;

    tracing::info!(
        admin_id = %admin.user_id,
        course_id = %course.id,
        action = "course_create",
        "Admin created course"
    );

    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course))))
}

async fn update_course(
    Path(course_id): Path<String>,
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CourseUpdate>,
) -> Result<Json<CourseResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let updated = repositories::courses::update(
        state.db(),
        &course_id,
        repositories::courses::UpdateCourse {
            name: payload.name,
            description: payload.description,
            duration: payload.duration,
            instructor: payload.instructor,
            image_path: payload.image_path,
            level: payload.level,
            prerequisites: payload.prerequisites,
            syllabus: payload.syllabus,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update course"))?
    .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.user_id,
        course_id = %course_id,
        action = "course_update",
        "Admin updated course"
    );

    Ok(Json(CourseResponse::from_db(updated)))
}

async fn delete_course(
    Path(course_id): Path<String>,
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::courses::delete(state.db(), &course_id).await.map_err(|e| {
        if crate::db::is_foreign_key_violation(&e) {
            ApiError::Conflict("Cannot delete a course that has enrollments".to_string())
        } else {
            ApiError::internal(e, "Failed to delete course")
        }
    })?;

    if !deleted {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    tracing::info!(
        admin_id = %admin.user_id,
        course_id = %course_id,
        action = "course_delete",
        "Admin deleted course"
    );

    Ok(StatusCode::NO_CONTENT)
}

async fn my_courses(
    RequireLearner(session): RequireLearner,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::enrollments::list_active_courses(state.db(), &session.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrolled courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

async fn request_enrollment(
    Path(course_id): Path<String>,
    RequireLearner(session): RequireLearner,
    State(state): State<AppState>,
    Json(payload): Json<EnrollmentRequestCreate>,
) -> Result<(StatusCode, Json<EnrollmentRequestResponse>), ApiError> {
    let request = enrollment_workflow::request_enrollment(
        state.db(),
        &session.user_id,
        &course_id,
        &payload.payment_proof_url,
        payload.message.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(EnrollmentRequestResponse::from_db(request))))
}

async fn enrollment_status(
    Path(course_id): Path<String>,
    RequireLearner(session): RequireLearner,
    State(state): State<AppState>,
) -> Result<Json<EnrollmentStatusResponse>, ApiError> {
    let (status, latest) =
        enrollment_workflow::current_state(state.db(), &session.user_id, &course_id).await?;

    Ok(Json(EnrollmentStatusResponse {
        course_id,
        status,
        request: latest.map(EnrollmentRequestResponse::from_db),
    }))
}

async fn unenroll(
    Path(course_id): Path<String>,
    RequireLearner(session): RequireLearner,
    State(state): State<AppState>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    let enrollment = repositories::enrollments::cancel(
        state.db(),
        &session.user_id,
        &course_id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to cancel enrollment"))?
    .ok_or_else(|| ApiError::NotFound("Not enrolled in this course".to_string()))?;

    tracing::info!(
        user_id = %session.user_id,
        course_id = %course_id,
        action = "unenroll",
        "Enrollment cancelled"
    );

    Ok(Json(EnrollmentResponse::from_db(enrollment)))
}

async fn list_course_requests(
    Path(course_id): Path<String>,
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrollmentRequestDetail>>, ApiError> {
    if repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .is_none()
    {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    let requests = repositories::enrollment_requests::list_for_course(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollment requests"))?;

    Ok(Json(requests.into_iter().map(EnrollmentRequestDetail::from_view).collect()))
}

async fn list_request_queue(
    Query(query): Query<RequestQueueQuery>,
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrollmentRequestDetail>>, ApiError> {
    let requests = repositories::enrollment_requests::list_by_status(state.db(), query.status)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollment requests"))?;

    Ok(Json(requests.into_iter().map(EnrollmentRequestDetail::from_view).collect()))
}

async fn approve_request(
    Path(request_id): Path<String>,
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    OptionalJson(payload): OptionalJson<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    decide(&state, &admin.user_id, &request_id, Decision::Approve, payload).await
}

async fn reject_request(
    Path(request_id): Path<String>,
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    OptionalJson(payload): OptionalJson<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    decide(&state, &admin.user_id, &request_id, Decision::Reject, payload).await
}

async fn decide(
    state: &AppState,
    admin_id: &str,
    request_id: &str,
    decision: Decision,
    payload: DecisionRequest,
) -> Result<Json<DecisionResponse>, ApiError> {
    let outcome = enrollment_workflow::decide(
        state.db(),
        request_id,
        decision,
        payload.admin_note.as_deref(),
    )
    .await?;

    tracing::info!(
        admin_id = %admin_id,
        request_id = %request_id,
        action = "enrollment_decision",
        "Admin decided enrollment request"
    );

    let message = match decision {
        Decision::Approve => "Enrollment request approved",
        Decision::Reject => "Enrollment request rejected",
    };

    Ok(Json(DecisionResponse {
        message: message.to_string(),
        request: EnrollmentRequestResponse::from_db(outcome.request),
        enrollment: outcome.enrollment.map(EnrollmentResponse::from_db),
        role_elevated: outcome.role_elevated,
    }))
}
