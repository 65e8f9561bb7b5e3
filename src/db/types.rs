use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    User,
    Student,
}

impl UserRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
            UserRole::Student => "student",
        }
    }

    /// Role after a successful enrollment. Only `user` moves forward.
    pub(crate) fn after_enrollment(self) -> UserRole {
        match self {
            UserRole::User => UserRole::Student,
            UserRole::Student => UserRole::Student,
            UserRole::Admin => UserRole::Admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "enrollmentstatus", rename_all = "lowercase")]
pub(crate) enum EnrollmentStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "enrollmentrequeststatus", rename_all = "lowercase")]
pub(crate) enum EnrollmentRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl EnrollmentRequestStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            EnrollmentRequestStatus::Pending => "pending",
            EnrollmentRequestStatus::Approved => "approved",
            EnrollmentRequestStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type)]
#[sqlx(type_name = "courselevel")]
pub(crate) enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}
