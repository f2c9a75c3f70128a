//! The storage collaborator boundary and the engine's request/outcome types.
//!
//! `CourseStore` is the only seam between the course engine and the outside
//! world; the `curricle-store` crate implements it for in-memory and REST
//! backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::model::{
    CurriculumItem, Exam, ExamCategory, ExamSheet, Learner, LearnerProgress, ProgressRecord, Role,
    Submission,
};
use crate::scoring::QuestionReview;

// ---------------------------------------------------------------------------
// Course store trait
// ---------------------------------------------------------------------------

/// Keyed storage for progress records, the submission ledger, exam
/// definitions, and the learner directory.
///
/// Progress writes are conditional on the version the caller read; the
/// submission insert enforces the `(learner, exam, category)` unique key.
/// Those two guarantees are the store's part of the concurrency story; the
/// engine has no locks of its own.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Human-readable store name (e.g. "memory").
    fn name(&self) -> &str;

    /// Loads a learner's progress record, or `None` when the learner has
    /// never touched the course.
    async fn load_progress(&self, learner_id: &str)
        -> Result<Option<ProgressRecord>, StoreError>;

    /// Creates the initial empty progress record for a learner.
    async fn init_progress(&self, learner_id: &str) -> Result<ProgressRecord, StoreError>;

    /// Conditional write: fails with [`StoreError::VersionConflict`] when the
    /// stored version is no longer `expected_version`. Returns the version
    /// after the write.
    async fn save_progress(
        &self,
        learner_id: &str,
        progress: &LearnerProgress,
        expected_version: u64,
    ) -> Result<u64, StoreError>;

    /// Looks up the submission for one identity triple.
    async fn find_submission(
        &self,
        learner_id: &str,
        exam_id: &str,
        category: ExamCategory,
    ) -> Result<Option<Submission>, StoreError>;

    /// Append-only insert: fails with [`StoreError::DuplicateSubmission`]
    /// when the unique key already holds a row.
    async fn insert_submission(&self, submission: &Submission) -> Result<(), StoreError>;

    /// All submissions by one learner, oldest first.
    async fn list_submissions(&self, learner_id: &str) -> Result<Vec<Submission>, StoreError>;

    /// Full exam definition, answer key included.
    async fn fetch_exam(&self, exam_id: &str) -> Result<Option<Exam>, StoreError>;

    /// The learner directory (admin surface; used to assemble rosters).
    async fn list_learners(&self) -> Result<Vec<Learner>, StoreError>;
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// The authenticated caller of an operation. Authentication itself happens
/// elsewhere; the engine only ever sees the id and role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub learner_id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(learner_id: impl Into<String>, role: Role) -> Self {
        Self {
            learner_id: learner_id.into(),
            role,
        }
    }
}

/// Request to submit answers for an exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub exam_id: String,
    pub category: ExamCategory,
    /// Chosen answers, question id to option id. Unknown question ids are
    /// tolerated and ignored by grading.
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Outcome of viewing a lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonView {
    pub item: CurriculumItem,
    /// Progress after the view.
    pub progress: LearnerProgress,
    /// Whether this view advanced the learner.
    pub progress_updated: bool,
}

/// Outcome of opening an exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExamView {
    /// The exam is open for taking. The sheet carries no answer key.
    Open { sheet: ExamSheet },
    /// A submission already exists for this triple; the prior result is
    /// replayed instead of a fresh sheet.
    AlreadySubmitted { submission: Submission },
}

/// Outcome of a graded, recorded submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub submission: Submission,
    /// Per-question review; `None` for pre-exams, whose review is withheld
    /// by policy.
    pub review: Option<Vec<QuestionReview>>,
    /// Progress after any advancement.
    pub progress: LearnerProgress,
    pub progress_updated: bool,
}

/// A learner's own view of where they stand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerStatus {
    pub learner_id: String,
    pub role: Role,
    pub progress: LearnerProgress,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    /// Every submission the learner has made, oldest first.
    pub submissions: Vec<Submission>,
}
