use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::core::time::format_primitive;
use crate::db::models::{Exam, Question};
use crate::repositories::exams::ExamListRow;
use crate::services::grading::{GradeOutcome, DEFAULT_PASSING_SCORE};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_question"))]
pub(crate) struct QuestionInput {
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub(crate) prompt: String,
    #[validate(length(min = 2, max = 4, message = "a question needs between 2 and 4 options"))]
    pub(crate) options: Vec<String>,
    #[serde(alias = "correctIndex")]
    pub(crate) correct_index: i64,
}

fn validate_question(question: &QuestionInput) -> Result<(), ValidationError> {
    if question.options.iter().any(|option| option.trim().is_empty()) {
        return Err(ValidationError::new("empty_option")
            .with_message("options must not be empty".into()));
    }
    let in_range =
        usize::try_from(question.correct_index).is_ok_and(|index| index < question.options.len());
    if !in_range {
        return Err(ValidationError::new("correct_index")
            .with_message("correct_index must point at one of the options".into()));
    }
    Ok(())
}

impl QuestionInput {
    pub(crate) fn into_model(self) -> Question {
        Question {
            prompt: self.prompt.trim().to_string(),
            options: self.options.into_iter().map(|option| option.trim().to_string()).collect(),
            correct_index: self.correct_index,
        }
    }
}

pub(crate) fn validate_questions(questions: &[QuestionInput]) -> Result<(), ValidationErrors> {
    questions.iter().try_for_each(Validate::validate)
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "courseId", alias = "course")]
    pub(crate) course_id: Option<String>,
    #[validate(length(min = 1, message = "at least one question is required"))]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionInput>,
    #[serde(default)]
    #[serde(alias = "durationMinutes", alias = "duration")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default = "default_passing_score")]
    #[serde(alias = "passingScore")]
    #[validate(range(min = 0, max = 100, message = "passing_score must be between 0 and 100"))]
    pub(crate) passing_score: i32,
    #[serde(default)]
    #[serde(alias = "isPublished")]
    pub(crate) is_published: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "courseId", alias = "course")]
    pub(crate) course_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one question is required"))]
    pub(crate) questions: Option<Vec<QuestionInput>>,
    #[serde(default)]
    #[serde(alias = "durationMinutes", alias = "duration")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    #[serde(alias = "passingScore")]
    #[validate(range(min = 0, max = 100, message = "passing_score must be between 0 and 100"))]
    pub(crate) passing_score: Option<i32>,
    #[serde(default)]
    #[serde(alias = "isPublished")]
    pub(crate) is_published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublishRequest {
    #[serde(default = "default_true")]
    #[serde(alias = "isPublished")]
    pub(crate) is_published: bool,
}

impl Default for PublishRequest {
    fn default() -> Self {
        Self { is_published: true }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateLinkRequest {
    #[serde(default = "default_true")]
    #[serde(alias = "allowAnonymous")]
    pub(crate) allow_anonymous: bool,
}

impl Default for GenerateLinkRequest {
    fn default() -> Self {
        Self { allow_anonymous: true }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateLinkResponse {
    pub(crate) message: String,
    pub(crate) private_link: String,
    pub(crate) access_token: String,
    pub(crate) allow_anonymous: bool,
}

/// Full exam, correct answers included. Admin only.
#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) course_id: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) questions: Vec<Question>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) passing_score: i32,
    pub(crate) is_private: bool,
    pub(crate) access_token: Option<String>,
    pub(crate) allow_anonymous: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            course_id: exam.course_id,
            is_published: exam.is_published,
            questions: exam.questions.0,
            duration_minutes: exam.duration_minutes,
            passing_score: exam.passing_score,
            is_private: exam.is_private,
            access_token: exam.access_token,
            allow_anonymous: exam.allow_anonymous,
            created_at: format_primitive(exam.created_at),
            updated_at: format_primitive(exam.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamSummaryResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) course_id: Option<String>,
    pub(crate) course_name: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) question_count: i32,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) passing_score: i32,
    pub(crate) is_private: bool,
    pub(crate) allow_anonymous: bool,
    pub(crate) created_at: String,
}

impl ExamSummaryResponse {
    pub(crate) fn from_row(row: ExamListRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            course_id: row.course_id,
            course_name: row.course_name,
            is_published: row.is_published,
            question_count: row.question_count,
            duration_minutes: row.duration_minutes,
            passing_score: row.passing_score,
            is_private: row.is_private,
            allow_anonymous: row.allow_anonymous,
            created_at: format_primitive(row.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PublicQuestion {
    pub(crate) prompt: String,
    pub(crate) options: Vec<String>,
}

/// Exam as shown to a taker: no correct indices.
#[derive(Debug, Serialize)]
pub(crate) struct PublicExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) course_id: Option<String>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) passing_score: i32,
    pub(crate) allow_anonymous: bool,
    pub(crate) questions: Vec<PublicQuestion>,
}

impl PublicExamResponse {
    pub(crate) fn from_db(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            course_id: exam.course_id,
            duration_minutes: exam.duration_minutes,
            passing_score: exam.passing_score,
            allow_anonymous: exam.allow_anonymous,
            questions: exam
                .questions
                .0
                .into_iter()
                .map(|question| PublicQuestion {
                    prompt: question.prompt,
                    options: question.options,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitAnswersRequest {
    #[serde(default)]
    pub(crate) answers: Vec<Option<i64>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PrivateSubmitRequest {
    #[serde(default)]
    pub(crate) answers: Vec<Option<i64>>,
    #[serde(default)]
    #[serde(alias = "userName", alias = "name")]
    pub(crate) user_name: Option<String>,
    #[serde(default)]
    #[serde(alias = "userEmail", alias = "email")]
    pub(crate) user_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResultResponse {
    pub(crate) message: String,
    pub(crate) submission_id: String,
    pub(crate) score: i32,
    pub(crate) total: i32,
    pub(crate) percentage: i32,
    pub(crate) passed: bool,
}

impl SubmissionResultResponse {
    pub(crate) fn new(submission_id: String, outcome: GradeOutcome) -> Self {
        Self {
            message: "Exam submitted successfully".to_string(),
            submission_id,
            score: outcome.score,
            total: outcome.total,
            percentage: outcome.percentage,
            passed: outcome.passed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionsQuery {
    #[serde(default)]
    #[serde(alias = "examId")]
    pub(crate) exam_id: Option<String>,
}

fn default_passing_score() -> i32 {
    DEFAULT_PASSING_SCORE
}

fn default_true() -> bool {
    true
}
