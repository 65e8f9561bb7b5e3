use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::enrollment_workflow::EnrollmentError;
use crate::services::exam_links::ExamAccessError;
use crate::services::grading::GradingError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn validation(errors: validator::ValidationErrors) -> Self {
        Self::BadRequest(errors.to_string())
    }
}

impl From<EnrollmentError> for ApiError {
    fn from(err: EnrollmentError) -> Self {
        match err {
            EnrollmentError::CourseNotFound | EnrollmentError::RequestNotFound => {
                ApiError::NotFound(err.to_string())
            }
            EnrollmentError::AlreadyEnrolled
            | EnrollmentError::DuplicatePendingRequest
            | EnrollmentError::AlreadyProcessed(_) => ApiError::Conflict(err.to_string()),
            EnrollmentError::MissingPaymentProof => ApiError::BadRequest(err.to_string()),
            EnrollmentError::Database(err) => {
                ApiError::internal(err, "Enrollment workflow database error")
            }
        }
    }
}

impl From<GradingError> for ApiError {
    fn from(err: GradingError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ExamAccessError> for ApiError {
    fn from(err: ExamAccessError) -> Self {
        match err {
            ExamAccessError::InvalidLink => ApiError::NotFound(err.to_string()),
            ExamAccessError::AuthenticationRequired => {
                ApiError::Unauthorized("Authentication required for this exam")
            }
            ExamAccessError::MissingAnonymousIdentity => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let status = StatusCode::UNAUTHORIZED;
                let mut response = (
                    status,
                    Json(ErrorResponse { status: status.as_u16(), detail: message.to_string() }),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                let status = StatusCode::FORBIDDEN;
                (
                    status,
                    Json(ErrorResponse { status: status.as_u16(), detail: message.to_string() }),
                )
                    .into_response()
            }
            ApiError::BadRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::NotFound(message) => {
                let status = StatusCode::NOT_FOUND;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::Conflict(message) => {
                let status = StatusCode::CONFLICT;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::TooManyRequests(message) => {
                let status = StatusCode::TOO_MANY_REQUESTS;
                (
                    status,
                    Json(ErrorResponse { status: status.as_u16(), detail: message.to_string() }),
                )
                    .into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::EnrollmentRequestStatus;

    #[test]
    fn workflow_errors_map_to_http_statuses() {
        let cases = [
            (EnrollmentError::CourseNotFound, StatusCode::NOT_FOUND),
            (EnrollmentError::AlreadyEnrolled, StatusCode::CONFLICT),
            (EnrollmentError::DuplicatePendingRequest, StatusCode::CONFLICT),
            (EnrollmentError::MissingPaymentProof, StatusCode::BAD_REQUEST),
            (
                EnrollmentError::AlreadyProcessed(EnrollmentRequestStatus::Approved),
                StatusCode::CONFLICT,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn anonymous_access_errors_map_to_http_statuses() {
        let response = ApiError::from(ExamAccessError::AuthenticationRequired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

        let response = ApiError::from(ExamAccessError::InvalidLink).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
