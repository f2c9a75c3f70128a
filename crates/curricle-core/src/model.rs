//! Core data model types for curricle.
//!
//! These are the fundamental types the whole system operates on: curriculum
//! items, exam definitions and their sanitized learner-facing sheets, learner
//! progress records, and immutable exam submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// What kind of learning item occupies a curriculum position.
///
/// Item ids are only unique within a kind; a lesson and an exam may share an
/// id, so every lookup must carry the kind alongside the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Lesson,
    Exam,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Lesson => write!(f, "lesson"),
            ItemKind::Exam => write!(f, "exam"),
        }
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lesson" => Ok(ItemKind::Lesson),
            "exam" => Ok(ItemKind::Exam),
            other => Err(format!("unknown item kind: {other}")),
        }
    }
}

/// The category of an exam, which determines its eligibility and scoring
/// rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamCategory {
    /// Entry gate: passing it unlocks the curriculum at a role-dependent
    /// position.
    PreExam,
    /// Mid-path checkpoint; advances the learner on pass.
    Quiz,
    /// Completion gate; only available once the whole sequence is done.
    FinalExam,
    /// Ungraded-progress variant of a quiz: any submission passes, answers
    /// are still reviewed.
    Activity,
}

impl ExamCategory {
    /// Gate exams (entry and completion) live outside the positional path;
    /// quizzes and activities are scheduled on it.
    pub fn is_gate(self) -> bool {
        matches!(self, ExamCategory::PreExam | ExamCategory::FinalExam)
    }
}

impl fmt::Display for ExamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamCategory::PreExam => write!(f, "pre_exam"),
            ExamCategory::Quiz => write!(f, "quiz"),
            ExamCategory::FinalExam => write!(f, "final_exam"),
            ExamCategory::Activity => write!(f, "activity"),
        }
    }
}

impl FromStr for ExamCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pre_exam" | "pre-exam" => Ok(ExamCategory::PreExam),
            "quiz" => Ok(ExamCategory::Quiz),
            "final_exam" | "final-exam" | "final" => Ok(ExamCategory::FinalExam),
            "activity" => Ok(ExamCategory::Activity),
            other => Err(format!("unknown exam category: {other}")),
        }
    }
}

/// Role attached to an authenticated principal.
///
/// Regular and Pro learners progress through the shared curriculum from
/// different entry points; Admins never progress and are denied learner
/// operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Regular,
    Pro,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Regular => write!(f, "regular"),
            Role::Pro => write!(f, "pro"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regular" => Ok(Role::Regular),
            "pro" => Ok(Role::Pro),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// One entry in the ordered curriculum path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumItem {
    /// Identifier, unique within `kind` only.
    pub id: String,
    /// Lesson or exam.
    pub kind: ItemKind,
    /// 0-based index in the single global ordered sequence. Authoritative
    /// ordering; assigned from insertion order of the curriculum definition.
    pub position: usize,
    /// Display name carried from the curriculum file.
    #[serde(default)]
    pub title: String,
    /// Present iff `kind` is `Exam`.
    #[serde(default)]
    pub exam_category: Option<ExamCategory>,
    /// Exam-only branch/skip target: completing this exam jumps the learner
    /// here instead of `position + 1`.
    #[serde(default)]
    pub override_next_position: Option<usize>,
}

impl CurriculumItem {
    /// Shorthand for a lesson entry.
    pub fn lesson(id: impl Into<String>, position: usize, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Lesson,
            position,
            title: title.into(),
            exam_category: None,
            override_next_position: None,
        }
    }

    /// Shorthand for an exam entry.
    pub fn exam(
        id: impl Into<String>,
        position: usize,
        title: impl Into<String>,
        category: ExamCategory,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Exam,
            position,
            title: title.into(),
            exam_category: Some(category),
            override_next_position: None,
        }
    }

    /// Same as [`CurriculumItem::exam`] with an explicit advance target.
    pub fn exam_with_override(
        id: impl Into<String>,
        position: usize,
        title: impl Into<String>,
        category: ExamCategory,
        next: usize,
    ) -> Self {
        Self {
            override_next_position: Some(next),
            ..Self::exam(id, position, title, category)
        }
    }
}

/// A full exam definition, answer key included.
///
/// Never serve this to a learner who has not submitted yet; use
/// [`ExamSheet`] for the view path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Category the definition is meant for. Requests under a different
    /// category are rejected; `None` skips that cross-check.
    #[serde(default)]
    pub category: Option<ExamCategory>,
    /// Per-exam pass threshold in percent; falls back to the engine default
    /// when absent.
    #[serde(default)]
    pub passing_threshold: Option<f64>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// A single question with its answer options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

/// One selectable option of a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
    /// Answer key. Exactly one option per question is expected to carry it;
    /// scoring takes the first if several do.
    #[serde(default)]
    pub is_correct: bool,
}

/// Learner-facing rendering of an [`Exam`] with the answer key stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSheet {
    pub id: String,
    pub title: String,
    pub total_questions: usize,
    pub questions: Vec<QuestionSheet>,
}

/// [`Question`] minus the answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSheet {
    pub id: String,
    pub text: String,
    pub options: Vec<OptionSheet>,
}

/// [`AnswerOption`] minus `is_correct`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSheet {
    pub id: String,
    pub text: String,
}

impl From<&Exam> for ExamSheet {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id.clone(),
            title: exam.title.clone(),
            total_questions: exam.questions.len(),
            questions: exam
                .questions
                .iter()
                .map(|q| QuestionSheet {
                    id: q.id.clone(),
                    text: q.text.clone(),
                    options: q
                        .options
                        .iter()
                        .map(|o| OptionSheet {
                            id: o.id.clone(),
                            text: o.text.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Directory row for an authenticated principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Learner {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
}

/// A learner's mutable position in the curriculum.
///
/// Unknown fields are rejected on deserialization: earlier encodings of this
/// record were free-form key bags, and silently carrying stale keys forward
/// is how they drifted apart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LearnerProgress {
    /// Highest curriculum position the learner may access; `None` until the
    /// pre-exam is passed.
    #[serde(default)]
    pub current_position: Option<usize>,
    /// Set when the learner runs off the end of the linear sequence.
    #[serde(default)]
    pub final_exam_unlocked: bool,
    /// Set when the final exam is passed.
    #[serde(default)]
    pub course_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl LearnerProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the pre-exam has been passed and the curriculum unlocked.
    pub fn has_started(&self) -> bool {
        self.current_position.is_some()
    }
}

/// A progress record as stored, with its optimistic-concurrency version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub learner_id: String,
    /// Incremented by the store on every successful write; conditional
    /// writes carry the version they read.
    pub version: u64,
    pub progress: LearnerProgress,
}

/// An immutable, append-only record of one graded exam attempt.
///
/// At most one exists per `(learner_id, exam_id, category)`; the store
/// enforces the unique key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub learner_id: String,
    pub exam_id: String,
    pub category: ExamCategory,
    /// Chosen answers, question id to option id.
    pub answers: BTreeMap<String, String>,
    /// Percentage in `[0, 100]`, rounded to two decimals.
    pub score: f64,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub passing_threshold: f64,
    pub passed: bool,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// Composite identity of this submission.
    pub fn key(&self) -> (&str, &str, ExamCategory) {
        (&self.learner_id, &self.exam_id, self.category)
    }
}
