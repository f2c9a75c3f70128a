//! Error types for the course engine and its storage boundary.
//!
//! `StoreError` is defined here rather than in the store crate so the engine
//! can classify storage failures by variant (conflict, duplicate key) for
//! its retry and race handling without string matching.

use thiserror::Error;

use crate::model::Submission;

/// Errors surfaced by a storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record the operation depends on does not exist.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// A conditional progress write lost the race; the stored version moved
    /// past the one the caller read.
    #[error("version conflict: expected {expected}, found {found:?}")]
    VersionConflict { expected: u64, found: Option<u64> },

    /// The submission unique key collided with an existing row.
    #[error("submission already exists for this learner, exam, and category")]
    DuplicateSubmission,

    /// The backend rejected the credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The backend returned an error response.
    #[error("storage API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// A payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether the failed write may be retried after re-reading the record.
    pub fn is_retryable_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// Outcomes of course operations that are not plain successes.
///
/// Eligibility denials and duplicate submissions are expected control flow,
/// not faults; callers branch on the variant. Only `Storage` represents an
/// infrastructure failure.
#[derive(Debug, Error)]
pub enum CourseError {
    /// No lesson with this id exists in the curriculum.
    #[error("lesson not found: {0}")]
    LessonNotFound(String),

    /// No exam with this id (and requested category) is scheduled.
    #[error("exam not found: {0}")]
    ExamNotFound(String),

    /// The learner has no directory entry.
    #[error("learner not found: {0}")]
    LearnerNotFound(String),

    /// An access rule said no; `reason` is user-facing.
    #[error("access denied: {reason}")]
    EligibilityDenied { reason: String },

    /// The `(learner, exam, category)` triple was already submitted.
    /// Carries the prior row so callers can render the earlier result.
    #[error("exam already submitted")]
    DuplicateSubmission { prior: Box<Submission> },

    /// The exam exists but its question set is empty in storage.
    #[error("exam questions not found")]
    ExamQuestionsNotFound,

    /// Admin principals have no progress record and no learner operations.
    #[error("admins do not take part in the course")]
    AdminHasNoProgress,

    /// A storage collaborator failed; fatal for this request only.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl CourseError {
    pub fn denied(reason: impl Into<String>) -> Self {
        CourseError::EligibilityDenied {
            reason: reason.into(),
        }
    }

    /// True for eligibility denials (expected outcome, not a fault).
    pub fn is_denied(&self) -> bool {
        matches!(self, CourseError::EligibilityDenied { .. })
    }

    /// True when a prior submission blocked the operation.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, CourseError::DuplicateSubmission { .. })
    }
}
