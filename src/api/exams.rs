use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::OptionalJson;
use crate::api::guards::{OptionalSession, RequireAdmin, RequireStudent};
use crate::core::metrics::{self, SubmissionMode};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Exam, SubmissionIdentity};
use crate::repositories;
use crate::schemas::exam::{
    validate_questions, ExamCreate, ExamResponse, ExamSummaryResponse, ExamUpdate,
    GenerateLinkRequest, GenerateLinkResponse, PrivateSubmitRequest, PublicExamResponse,
    PublishRequest, SubmissionResultResponse, SubmissionsQuery, SubmitAnswersRequest,
};
use crate::schemas::submission::{MySubmissionResponse, SubmissionResponse};
use crate::services::exam_links::{self, ExamAccessError, LinkSubmitter};
use crate::services::grading;

const ACCESS_TOKEN_CONSTRAINT: &str = "exams_access_token_key";
const TOKEN_ATTEMPTS: usize = 3;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_exam))
        .route("/admin/all", get(list_all_exams))
        .route("/admin/submissions", get(list_all_submissions))
        .route("/admin/:exam_id", get(get_exam))
        .route("/published", get(list_published_exams))
        .route("/published/:exam_id", get(get_published_exam))
        .route("/submissions/me", get(my_submissions))
        .route("/public/:token", get(get_private_exam))
        .route("/public/:token/submit", post(submit_private_exam))
        .route("/:exam_id", put(update_exam).delete(delete_exam))
        .route("/:exam_id/publish", patch(publish_exam))
        .route("/:exam_id/submit", post(submit_exam))
        .route("/:exam_id/generate-link", post(generate_link))
}

async fn ensure_course_exists(state: &AppState, course_id: Option<&str>) -> Result<(), ApiError> {
    let Some(course_id) = course_id else {
        return Ok(());
    };
    let course = repositories::courses::find_by_id(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?;
    match course {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("Course not found".to_string())),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

async fn create_exam(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let course_id = non_empty(payload.course_id);
    ensure_course_exists(&state, course_id.as_deref()).await?;
    let description = non_empty(payload.description);

    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            description: description.as_deref(),
            course_id: course_id.as_deref(),
            is_published: payload.is_published,
            questions: payload.questions.into_iter().map(|q| q.into_model()).collect(),
            duration_minutes: payload.duration_minutes,
            passing_score: payload.passing_score,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    tracing::info!(
        admin_id = %admin.user_id,
        exam_id = %exam.id,
        questions = exam.questions.0.len(),
        action = "exam_create",
        "Admin created exam"
    );

    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam))))
}

async fn list_all_exams(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamSummaryResponse>>, ApiError> {
    let exams = repositories::exams::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(exams.into_iter().map(ExamSummaryResponse::from_row).collect()))
}

async fn get_exam(
    Path(exam_id): Path<String>,
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    Ok(Json(ExamResponse::from_db(exam)))
}

async fn update_exam(
    Path(exam_id): Path<String>,
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    if let Some(questions) = payload.questions.as_deref() {
        validate_questions(questions).map_err(ApiError::validation)?;
    }

    let course_id = non_empty(payload.course_id);
    ensure_course_exists(&state, course_id.as_deref()).await?;

    let updated = repositories::exams::update(
        state.db(),
        &exam_id,
        repositories::exams::UpdateExam {
            title: payload.title.map(|title| title.trim().to_string()),
            description: payload.description,
            course_id,
            is_published: payload.is_published,
            questions: payload
                .questions
                .map(|questions| questions.into_iter().map(|q| q.into_model()).collect()),
            duration_minutes: payload.duration_minutes,
            passing_score: payload.passing_score,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?
    .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.user_id,
        exam_id = %exam_id,
        action = "exam_update",
        "Admin updated exam"
    );

    Ok(Json(ExamResponse::from_db(updated)))
}

async fn publish_exam(
    Path(exam_id): Path<String>,
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    OptionalJson(payload): OptionalJson<PublishRequest>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = repositories::exams::set_published(
        state.db(),
        &exam_id,
        payload.is_published,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?
    .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.user_id,
        exam_id = %exam_id,
        is_published = exam.is_published,
        action = "exam_publish",
        "Admin changed exam visibility"
    );

    Ok(Json(ExamResponse::from_db(exam)))
}

async fn delete_exam(
    Path(exam_id): Path<String>,
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::exams::delete_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;
    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    tracing::info!(
        admin_id = %admin.user_id,
        exam_id = %exam_id,
        action = "exam_delete",
        "Admin deleted exam"
    );

    Ok(StatusCode::NO_CONTENT)
}

async fn list_all_submissions(
    Query(query): Query<SubmissionsQuery>,
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    let exam_id = non_empty(query.exam_id);
    let rows = repositories::submissions::list(state.db(), exam_id.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    Ok(Json(rows.into_iter().map(SubmissionResponse::from_row).collect()))
}

async fn generate_link(
    Path(exam_id): Path<String>,
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    OptionalJson(payload): OptionalJson<GenerateLinkRequest>,
) -> Result<Json<GenerateLinkResponse>, ApiError> {
    let mut exam = None;
    for attempt in 1..=TOKEN_ATTEMPTS {
        let token = exam_links::generate_access_token();
        match repositories::exams::set_private_access(
            state.db(),
            &exam_id,
            &token,
            payload.allow_anonymous,
            primitive_now_utc(),
        )
        .await
        {
            Ok(Some(updated)) => {
                exam = Some(updated);
                break;
            }
            Ok(None) => return Err(ApiError::NotFound("Exam not found".to_string())),
            Err(err)
                if crate::db::unique_violation(&err).as_deref()
                    == Some(ACCESS_TOKEN_CONSTRAINT) =>
            {
                tracing::warn!(exam_id = %exam_id, attempt, "Access token collision, retrying");
            }
            Err(err) => return Err(ApiError::internal(err, "Failed to generate exam link")),
        }
    }

    let exam = exam.ok_or_else(|| {
        ApiError::internal("access token collisions exhausted", "Failed to generate exam link")
    })?;
    let token = exam
        .access_token
        .ok_or_else(|| ApiError::internal("access token missing", "Failed to generate exam link"))?;

    tracing::info!(
        admin_id = %admin.user_id,
        exam_id = %exam.id,
        allow_anonymous = exam.allow_anonymous,
        action = "exam_generate_link",
        "Admin generated private exam link"
    );

    Ok(Json(GenerateLinkResponse {
        message: "Private link generated".to_string(),
        private_link: exam_links::private_link(&state.settings().api().public_base_url, &token),
        access_token: token,
        allow_anonymous: exam.allow_anonymous,
    }))
}

async fn list_published_exams(
    RequireStudent(_student): RequireStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamSummaryResponse>>, ApiError> {
    let exams = repositories::exams::list_published(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(exams.into_iter().map(ExamSummaryResponse::from_row).collect()))
}

async fn get_published_exam(
    Path(exam_id): Path<String>,
    RequireStudent(_student): RequireStudent,
    State(state): State<AppState>,
) -> Result<Json<PublicExamResponse>, ApiError> {
    let exam = load_published(&state, &exam_id).await?;
    Ok(Json(PublicExamResponse::from_db(exam)))
}

async fn load_published(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_published(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found or not published".to_string()))
}

async fn submit_exam(
    Path(exam_id): Path<String>,
    RequireStudent(student): RequireStudent,
    State(state): State<AppState>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<(StatusCode, Json<SubmissionResultResponse>), ApiError> {
    let exam = load_published(&state, &exam_id).await?;
    let identity = SubmissionIdentity::Authenticated { user_id: student.user_id };

    record(&state, &exam, &identity, &payload.answers, SubmissionMode::Published).await
}

async fn my_submissions(
    RequireStudent(student): RequireStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<MySubmissionResponse>>, ApiError> {
    let rows = repositories::submissions::list_for_user(state.db(), &student.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    Ok(Json(rows.into_iter().map(MySubmissionResponse::from_row).collect()))
}

async fn load_private(state: &AppState, token: &str) -> Result<Exam, ApiError> {
    if !exam_links::looks_like_token(token) {
        return Err(ExamAccessError::InvalidLink.into());
    }
    repositories::exams::find_private_by_token(state.db(), token)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ExamAccessError::InvalidLink.into())
}

async fn get_private_exam(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PublicExamResponse>, ApiError> {
    let exam = load_private(&state, &token).await?;
    Ok(Json(PublicExamResponse::from_db(exam)))
}

async fn submit_private_exam(
    Path(token): Path<String>,
    OptionalSession(session): OptionalSession,
    State(state): State<AppState>,
    Json(payload): Json<PrivateSubmitRequest>,
) -> Result<(StatusCode, Json<SubmissionResultResponse>), ApiError> {
    let exam = load_private(&state, &token).await?;

    let submitter = exam_links::resolve_submitter(
        &exam,
        session.as_ref().map(|session| session.user_id.as_str()),
        payload.user_name.as_deref(),
        payload.user_email.as_deref(),
    )?;
    let (identity, mode) = match submitter {
        LinkSubmitter::Authenticated { user_id } => (
            SubmissionIdentity::Authenticated { user_id },
            SubmissionMode::PrivateAuthenticated,
        ),
        LinkSubmitter::Anonymous { name, email } => {
            (SubmissionIdentity::Anonymous { name, email }, SubmissionMode::PrivateAnonymous)
        }
    };

    record(&state, &exam, &identity, &payload.answers, mode).await
}

async fn record(
    state: &AppState,
    exam: &Exam,
    identity: &SubmissionIdentity,
    answers: &[Option<i64>],
    mode: SubmissionMode,
) -> Result<(StatusCode, Json<SubmissionResultResponse>), ApiError> {
    let outcome = grading::grade(&exam.questions.0, answers, exam.passing_score)?;

    let submission = repositories::submissions::create(
        state.db(),
        repositories::submissions::CreateSubmission {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam.id,
            identity,
            answers,
            outcome,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save submission"))?;

    metrics::record_submission(mode, outcome.passed);
    tracing::info!(
        exam_id = %exam.id,
        submission_id = %submission.id,
        score = outcome.score,
        total = outcome.total,
        passed = outcome.passed,
        "Exam submission graded"
    );

    Ok((StatusCode::CREATED, Json(SubmissionResultResponse::new(submission.id, outcome))))
}

#[cfg(test)]
mod tests;
