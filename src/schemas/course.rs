use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Course, Enrollment, EnrollmentRequest};
use crate::db::types::{CourseLevel, EnrollmentRequestStatus, EnrollmentStatus};
use crate::repositories::enrollment_requests::EnrollmentRequestView;
use crate::services::enrollment_workflow::EnrollmentState;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub(crate) description: String,
    #[validate(length(min = 1, message = "duration must not be empty"))]
    pub(crate) duration: String,
    #[validate(length(min = 1, message = "instructor must not be empty"))]
    pub(crate) instructor: String,
    #[serde(default)]
    pub(crate) level: CourseLevel,
    #[serde(default)]
    #[serde(alias = "imagePath", alias = "image")]
    pub(crate) image_path: Option<String>,
    #[serde(default)]
    pub(crate) prerequisites: Option<String>,
    #[serde(default)]
    pub(crate) syllabus: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "duration must not be empty"))]
    pub(crate) duration: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "instructor must not be empty"))]
    pub(crate) instructor: Option<String>,
    #[serde(default)]
    pub(crate) level: Option<CourseLevel>,
    #[serde(default)]
    #[serde(alias = "imagePath", alias = "image")]
    pub(crate) image_path: Option<String>,
    #[serde(default)]
    pub(crate) prerequisites: Option<String>,
    #[serde(default)]
    pub(crate) syllabus: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) duration: String,
    pub(crate) instructor: String,
    pub(crate) image_path: Option<String>,
    pub(crate) level: CourseLevel,
    pub(crate) prerequisites: Option<String>,
    pub(crate) syllabus: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course) -> Self {
        Self {
            id: course.id,
            name: course.name,
            description: course.description,
            duration: course.duration,
            instructor: course.instructor,
            image_path: course.image_path,
            level: course.level,
            prerequisites: course.prerequisites,
            syllabus: course.syllabus,
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollmentRequestCreate {
    #[serde(default)]
    #[serde(alias = "paymentProofUrl", alias = "paymentProof")]
    pub(crate) payment_proof_url: String,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DecisionRequest {
    #[serde(default)]
    #[serde(alias = "adminNote")]
    pub(crate) admin_note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestQueueQuery {
    #[serde(default)]
    pub(crate) status: Option<EnrollmentRequestStatus>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentRequestResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) payment_proof_url: String,
    pub(crate) status: EnrollmentRequestStatus,
    pub(crate) message: String,
    pub(crate) admin_note: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl EnrollmentRequestResponse {
    pub(crate) fn from_db(request: EnrollmentRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            course_id: request.course_id,
            payment_proof_url: request.payment_proof_url,
            status: request.status,
            message: request.message,
            admin_note: request.admin_note,
            created_at: format_primitive(request.created_at),
            updated_at: format_primitive(request.updated_at),
        }
    }
}

/// Admin view of a request with the requester and course resolved.
#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentRequestDetail {
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
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl EnrollmentRequestDetail {
    pub(crate) fn from_view(view: EnrollmentRequestView) -> Self {
        Self {
            id: view.id,
            user_id: view.user_id,
            user_name: view.user_name,
            user_email: view.user_email,
            course_id: view.course_id,
            course_name: view.course_name,
            payment_proof_url: view.payment_proof_url,
            status: view.status,
            message: view.message,
            admin_note: view.admin_note,
            created_at: format_primitive(view.created_at),
            updated_at: format_primitive(view.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentStatusResponse {
    pub(crate) course_id: String,
    pub(crate) status: EnrollmentState,
    pub(crate) request: Option<EnrollmentRequestResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) status: EnrollmentStatus,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            user_id: enrollment.user_id,
            course_id: enrollment.course_id,
            status: enrollment.status,
            created_at: format_primitive(enrollment.created_at),
            updated_at: format_primitive(enrollment.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DecisionResponse {
    pub(crate) message: String,
    pub(crate) request: EnrollmentRequestResponse,
    pub(crate) enrollment: Option<EnrollmentResponse>,
    pub(crate) role_elevated: bool,
}
