use serde::Serialize;

use crate::core::time::format_primitive;
use crate::repositories::submissions::SubmissionListRow;

/// Who took the exam, as shown to admins.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub(crate) enum SubmitterResponse {
    Authenticated {
        user_id: String,
        name: Option<String>,
        username: Option<String>,
        email: Option<String>,
    },
    Anonymous {
        name: Option<String>,
        email: Option<String>,
    },
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) submitter: SubmitterResponse,
    pub(crate) score: i32,
    pub(crate) total: i32,
    pub(crate) percentage: i32,
    pub(crate) passed: bool,
    pub(crate) submitted_at: String,
}

impl SubmissionResponse {
    pub(crate) fn from_row(row: SubmissionListRow) -> Self {
        let submitter = match row.user_id {
            Some(user_id) => SubmitterResponse::Authenticated {
                user_id,
                name: row.user_name,
                username: row.username,
                email: row.user_email,
            },
            None => SubmitterResponse::Anonymous {
                name: row.anonymous_name,
                email: row.anonymous_email,
            },
        };

        Self {
            id: row.id,
            exam_id: row.exam_id,
            exam_title: row.exam_title.unwrap_or_else(|| "Exam".to_string()),
            submitter,
            score: row.score,
            total: row.total,
            percentage: row.percentage,
            passed: row.passed,
            submitted_at: format_primitive(row.created_at),
        }
    }
}

/// A learner's own result, without submitter details.
#[derive(Debug, Serialize)]
pub(crate) struct MySubmissionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) score: i32,
    pub(crate) total: i32,
    pub(crate) percentage: i32,
    pub(crate) passed: bool,
    pub(crate) submitted_at: String,
}

impl MySubmissionResponse {
    pub(crate) fn from_row(row: SubmissionListRow) -> Self {
        Self {
            id: row.id,
            exam_id: row.exam_id,
            exam_title: row.exam_title.unwrap_or_else(|| "Exam".to_string()),
            score: row.score,
            total: row.total,
            percentage: row.percentage,
            passed: row.passed,
            submitted_at: format_primitive(row.created_at),
        }
    }
}
