use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{CourseLevel, EnrollmentRequestStatus, EnrollmentStatus, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) created_by_admin: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) duration: String,
    pub(crate) instructor: String,
    pub(crate) image_path: Option<String>,
    pub(crate) level: CourseLevel,
    pub(crate) prerequisites: Option<String>,
    pub(crate) syllabus: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) status: EnrollmentStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct EnrollmentRequest {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) payment_proof_url: String,
    pub(crate) status: EnrollmentRequestStatus,
    pub(crate) message: String,
    pub(crate) admin_note: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// A multiple-choice question as stored inside an exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Question {
    pub(crate) prompt: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) course_id: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) questions: Json<Vec<Question>>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) passing_score: i32,
    pub(crate) is_private: bool,
    pub(crate) access_token: Option<String>,
    pub(crate) allow_anonymous: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Submission {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) user_id: Option<String>,
    pub(crate) answers: Json<Vec<Option<i64>>>,
    pub(crate) score: i32,
    pub(crate) total: i32,
    pub(crate) percentage: i32,
    pub(crate) passed: bool,
    pub(crate) anonymous_name: Option<String>,
    pub(crate) anonymous_email: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Who a submission belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub(crate) enum SubmissionIdentity {
    Authenticated { user_id: String },
    Anonymous { name: String, email: String },
}

#[cfg(test)]
impl Submission {
    pub(crate) fn identity(&self) -> SubmissionIdentity {
        match &self.user_id {
            Some(user_id) => SubmissionIdentity::Authenticated { user_id: user_id.clone() },
            None => SubmissionIdentity::Anonymous {
                name: self.anonymous_name.clone().unwrap_or_default(),
                email: self.anonymous_email.clone().unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct OfflineSite {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) name_ar: String,
    pub(crate) address: String,
    pub(crate) city: String,
    pub(crate) phone: String,
    pub(crate) email: Option<String>,
    pub(crate) map_link: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
