use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::core::metrics;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Enrollment, EnrollmentRequest};
use crate::db::types::{EnrollmentRequestStatus, EnrollmentStatus};
use crate::repositories;

const ONE_PENDING_CONSTRAINT: &str = "enrollment_requests_one_pending";

/// Where a (user, course) pair stands in the enrollment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum EnrollmentState {
    NotRequested,
    Pending,
    Enrolled,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Error)]
pub(crate) enum EnrollmentError {
    #[error("Course not found")]
    CourseNotFound,
    #[error("Already enrolled in this course")]
    AlreadyEnrolled,
    #[error("You already have a pending request for this course")]
    DuplicatePendingRequest,
    #[error("Payment proof is required")]
    MissingPaymentProof,
    #[error("Enrollment request not found")]
    RequestNotFound,
    #[error("Request already {}", .0.as_str())]
    AlreadyProcessed(EnrollmentRequestStatus),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug)]
pub(crate) struct DecisionOutcome {
    pub(crate) request: EnrollmentRequest,
    pub(crate) enrollment: Option<Enrollment>,
    pub(crate) role_elevated: bool,
}

/// Derive the workflow state from the pair's enrollment and latest request.
///
/// A cancelled enrollment no longer blocks the pair; an approved request
/// whose enrollment was cancelled therefore reads as `NotRequested`.
pub(crate) fn derive_state(
    enrollment: Option<EnrollmentStatus>,
    latest_request: Option<EnrollmentRequestStatus>,
) -> EnrollmentState {
    if matches!(enrollment, Some(EnrollmentStatus::Active | EnrollmentStatus::Completed)) {
        return EnrollmentState::Enrolled;
    }
    match latest_request {
        Some(EnrollmentRequestStatus::Pending) => EnrollmentState::Pending,
        Some(EnrollmentRequestStatus::Rejected) => EnrollmentState::Rejected,
        Some(EnrollmentRequestStatus::Approved) | None => EnrollmentState::NotRequested,
    }
}

pub(crate) fn ensure_can_request(
    state: EnrollmentState,
    payment_proof_url: &str,
) -> Result<(), EnrollmentError> {
    match state {
        EnrollmentState::Enrolled => return Err(EnrollmentError::AlreadyEnrolled),
        EnrollmentState::Pending => return Err(EnrollmentError::DuplicatePendingRequest),
        EnrollmentState::NotRequested | EnrollmentState::Rejected => {}
    }
    if payment_proof_url.trim().is_empty() {
        return Err(EnrollmentError::MissingPaymentProof);
    }
    Ok(())
}

/// Approved and rejected are terminal; only pending requests can be decided.
pub(crate) fn transition(
    current: EnrollmentRequestStatus,
    decision: Decision,
) -> Result<EnrollmentRequestStatus, EnrollmentError> {
    match (current, decision) {
        (EnrollmentRequestStatus::Pending, Decision::Approve) => {
            Ok(EnrollmentRequestStatus::Approved)
        }
        (EnrollmentRequestStatus::Pending, Decision::Reject) => {
            Ok(EnrollmentRequestStatus::Rejected)
        }
        (status, _) => Err(EnrollmentError::AlreadyProcessed(status)),
    }
}

pub(crate) async fn current_state(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<(EnrollmentState, Option<EnrollmentRequest>), EnrollmentError> {
    let mut conn = pool.acquire().await?;
    let enrollment =
        repositories::enrollments::find_for_user_course(&mut conn, user_id, course_id).await?;
    let latest = repositories::enrollment_requests::find_latest_for_user_course(
        &mut conn, user_id, course_id,
    )
    .await?;

    let state = derive_state(
        enrollment.map(|enrollment| enrollment.status),
        latest.as_ref().map(|request| request.status),
    );
    Ok((state, latest))
}

pub(crate) async fn request_enrollment(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
    payment_proof_url: &str,
    message: Option<&str>,
) -> Result<EnrollmentRequest, EnrollmentError> {
    if repositories::courses::find_by_id(pool, course_id).await?.is_none() {
        return Err(EnrollmentError::CourseNotFound);
    }

    let (state, _) = current_state(pool, user_id, course_id).await?;
    ensure_can_request(state, payment_proof_url)?;

    let mut conn = pool.acquire().await?;
    let request = insert_pending(&mut conn, user_id, course_id, payment_proof_url, message).await?;

    tracing::info!(
        request_id = %request.id,
        user_id = %user_id,
        course_id = %course_id,
        "Enrollment requested"
    );
    Ok(request)
}

/// Insert a pending request. A concurrent writer that lost the race on the
/// one-pending index gets `DuplicatePendingRequest`.
async fn insert_pending(
    conn: &mut PgConnection,
    user_id: &str,
    course_id: &str,
    payment_proof_url: &str,
    message: Option<&str>,
) -> Result<EnrollmentRequest, EnrollmentError> {
    let created = repositories::enrollment_requests::create(
        conn,
        repositories::enrollment_requests::CreateEnrollmentRequest {
            id: &Uuid::new_v4().to_string(),
            user_id,
            course_id,
            payment_proof_url: payment_proof_url.trim(),
            message: message.map(str::trim).unwrap_or_default(),
            created_at: primitive_now_utc(),
        },
    )
    .await;

    match created {
        Ok(request) => Ok(request),
        Err(err)
            if crate::db::unique_violation(&err).as_deref() == Some(ONE_PENDING_CONSTRAINT) =>
        {
            Err(EnrollmentError::DuplicatePendingRequest)
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) async fn decide(
    pool: &PgPool,
    request_id: &str,
    decision: Decision,
    admin_note: Option<&str>,
) -> Result<DecisionOutcome, EnrollmentError> {
    let now = primitive_now_utc();
    let mut tx = pool.begin().await?;

    let request = repositories::enrollment_requests::find_by_id_for_update(&mut tx, request_id)
        .await?
        .ok_or(EnrollmentError::RequestNotFound)?;

    let next = transition(request.status, decision)?;

    let (enrollment, role_elevated) = match next {
        EnrollmentRequestStatus::Approved => {
            let enrollment = repositories::enrollments::activate(
                &mut tx,
                &Uuid::new_v4().to_string(),
                &request.user_id,
                &request.course_id,
                now,
            )
            .await?;
            let elevated =
                repositories::users::elevate_after_enrollment(&mut tx, &request.user_id, now)
                    .await?;
            (Some(enrollment), elevated)
        }
        _ => (None, false),
    };

    let request = repositories::enrollment_requests::set_decision(
        &mut tx,
        request_id,
        next,
        admin_note.map(str::trim).unwrap_or_default(),
        now,
    )
    .await?;

    tx.commit().await?;

    metrics::record_enrollment_decision(next.as_str());
    tracing::info!(
        request_id = %request.id,
        user_id = %request.user_id,
        course_id = %request.course_id,
        decision = next.as_str(),
        role_elevated,
        "Enrollment request decided"
    );

    Ok(DecisionOutcome { request, enrollment, role_elevated })
}
