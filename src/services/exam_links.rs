use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use crate::db::models::Exam;

const TOKEN_BYTES: usize = 32;
pub(crate) const TOKEN_LEN: usize = TOKEN_BYTES * 2;

#[derive(Debug, Error)]
pub(crate) enum ExamAccessError {
    #[error("Invalid or expired exam link")]
    InvalidLink,
    #[error("Authentication required for this exam")]
    AuthenticationRequired,
    #[error("Name and a valid email are required for anonymous submissions")]
    MissingAnonymousIdentity,
}

/// Caller of a private-link submission, as resolved from the session and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinkSubmitter {
    Authenticated { user_id: String },
    Anonymous { name: String, email: String },
}

/// Opaque, reusable access token for a private exam link (64 hex chars).
pub(crate) fn generate_access_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub(crate) fn looks_like_token(candidate: &str) -> bool {
    candidate.len() == TOKEN_LEN && candidate.chars().all(|ch| ch.is_ascii_hexdigit())
}

pub(crate) fn private_link(public_base_url: &str, token: &str) -> String {
    format!("{}/take-exam.html?token={token}", public_base_url.trim_end_matches('/'))
}

/// Decide who a private-link submission is attributed to.
///
/// A session always wins. Without one, the exam must allow anonymous takers
/// and the caller must supply a name and a plausible email.
pub(crate) fn resolve_submitter(
    exam: &Exam,
    session_user_id: Option<&str>,
    anonymous_name: Option<&str>,
    anonymous_email: Option<&str>,
) -> Result<LinkSubmitter, ExamAccessError> {
    if let Some(user_id) = session_user_id {
        return Ok(LinkSubmitter::Authenticated { user_id: user_id.to_string() });
    }
    if !exam.allow_anonymous {
        return Err(ExamAccessError::AuthenticationRequired);
    }

    let name = anonymous_name.map(str::trim).filter(|name| !name.is_empty());
    let email = anonymous_email
        .map(|email| email.trim().to_lowercase())
        .filter(|email| validator::ValidateEmail::validate_email(email));

    match (name, email) {
        (Some(name), Some(email)) => Ok(LinkSubmitter::Anonymous { name: name.to_string(), email }),
        _ => Err(ExamAccessError::MissingAnonymousIdentity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use sqlx::types::Json;

    fn private_exam(allow_anonymous: bool) -> Exam {
        let now = primitive_now_utc();
        Exam {
            id: "exam-1".to_string(),
            title: "Private quiz".to_string(),
            description: None,
            course_id: None,
            is_published: false,
            questions: Json(Vec::new()),
            duration_minutes: None,
            passing_score: 60,
            is_private: true,
            access_token: Some(generate_access_token()),
            allow_anonymous,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn tokens_are_hex_and_distinct() {
        let first = generate_access_token();
        let second = generate_access_token();
        assert!(looks_like_token(&first));
        assert!(looks_like_token(&second));
        assert_ne!(first, second);
        assert!(!looks_like_token("not-a-token"));
    }

    #[test]
    fn private_link_embeds_token() {
        assert_eq!(
            private_link("https://academy.example/", "abc"),
            "https://academy.example/take-exam.html?token=abc"
        );
    }

    #[test]
    fn session_takes_precedence_over_anonymous_fields() {
        let exam = private_exam(true);
        let submitter =
            resolve_submitter(&exam, Some("user-1"), Some("Guest"), Some("guest@example.com"))
                .unwrap();
        assert_eq!(submitter, LinkSubmitter::Authenticated { user_id: "user-1".to_string() });
    }

    #[test]
    fn anonymous_requires_exam_permission() {
        let exam = private_exam(false);
        assert!(matches!(
            resolve_submitter(&exam, None, Some("Guest"), Some("guest@example.com")),
            Err(ExamAccessError::AuthenticationRequired)
        ));
    }

    #[test]
    fn anonymous_identity_is_normalised_and_checked() {
        let exam = private_exam(true);
        let submitter =
            resolve_submitter(&exam, None, Some("  Guest "), Some(" Guest@Example.com ")).unwrap();
        assert_eq!(
            submitter,
            LinkSubmitter::Anonymous {
                name: "Guest".to_string(),
                email: "guest@example.com".to_string()
            }
        );

        assert!(matches!(
            resolve_submitter(&exam, None, None, Some("guest@example.com")),
            Err(ExamAccessError::MissingAnonymousIdentity)
        ));
        assert!(matches!(
            resolve_submitter(&exam, None, Some("Guest"), Some("not-an-email")),
            Err(ExamAccessError::MissingAnonymousIdentity)
        ));
    }
}
