use thiserror::Error;

use crate::db::models::Question;

pub(crate) const DEFAULT_PASSING_SCORE: i32 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum GradingError {
    #[error("answers must be provided for every question (expected {expected}, got {actual})")]
    AnswerCountMismatch { expected: usize, actual: usize },
    #[error("exam has no questions")]
    EmptyExam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GradeOutcome {
    pub(crate) score: i32,
    pub(crate) total: i32,
    pub(crate) percentage: i32,
    pub(crate) passed: bool,
}

/// Grade a submission.
///
/// `answers[i]` is the option picked for `questions[i]`; `None` means the
/// question was skipped. Out-of-range picks simply never match.
pub(crate) fn grade(
    questions: &[Question],
    answers: &[Option<i64>],
    passing_score: i32,
) -> Result<GradeOutcome, GradingError> {
    if answers.len() != questions.len() {
        return Err(GradingError::AnswerCountMismatch {
            expected: questions.len(),
            actual: answers.len(),
        });
    }
    if questions.is_empty() {
        return Err(GradingError::EmptyExam);
    }

    let score = questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| **answer == Some(question.correct_index))
        .count();
    let total = questions.len();
    let percentage = rounded_percentage(score, total);

    Ok(GradeOutcome {
        score: score as i32,
        total: total as i32,
        percentage,
        passed: percentage >= passing_score,
    })
}

/// `round(score / total * 100)` with halves rounded up, in integer arithmetic.
fn rounded_percentage(score: usize, total: usize) -> i32 {
    ((score * 200 + total) / (total * 2)) as i32
}
