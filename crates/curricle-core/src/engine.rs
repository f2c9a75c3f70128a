//! Central course engine orchestrator.
//!
//! One method per inbound operation: view a lesson, open an exam, submit an
//! exam, report a learner's status, assemble the roster. The engine holds no
//! locks; the store's conditional progress writes and submission unique key
//! are the entire concurrency story, and the engine's only job on a race is
//! to replay or map the typed failure.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::curriculum::CurriculumIndex;
use crate::eligibility::{can_take_exam, can_view_lesson};
use crate::error::CourseError;
use crate::model::{
    Exam, ExamCategory, ExamSheet, ItemKind, LearnerProgress, ProgressRecord, Role, Submission,
};
use crate::progress::{advance_after_exam_submission, advance_after_lesson_view, RolePolicies};
use crate::report::RosterReport;
use crate::roster::{completed_lessons, RosterEntry};
use crate::scoring::score_exam;
use crate::traits::{
    CourseStore, ExamView, LearnerStatus, LessonView, Principal, SubmissionOutcome, SubmitRequest,
};

/// Configuration for the course engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Pass threshold used when an exam does not set its own.
    pub default_passing_threshold: f64,
    /// Per-role curriculum entry positions.
    pub role_policies: RolePolicies,
    /// Concurrent per-learner reads during roster assembly.
    pub roster_parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_passing_threshold: 50.0,
            role_policies: RolePolicies::default(),
            roster_parallelism: 8,
        }
    }
}

/// The central course engine.
pub struct CourseEngine {
    curriculum: Arc<CurriculumIndex>,
    store: Arc<dyn CourseStore>,
    config: EngineConfig,
}

impl CourseEngine {
    pub fn new(
        curriculum: Arc<CurriculumIndex>,
        store: Arc<dyn CourseStore>,
        config: EngineConfig,
    ) -> Self {
        debug!(store = store.name(), "course engine ready");
        Self {
            curriculum,
            store,
            config,
        }
    }

    pub fn curriculum(&self) -> &CurriculumIndex {
        &self.curriculum
    }

    /// Opens a lesson for a learner, advancing progress when the lesson is
    /// the one the learner currently sits at.
    #[instrument(skip(self, principal), fields(learner = %principal.learner_id))]
    pub async fn view_lesson(
        &self,
        principal: &Principal,
        lesson_id: &str,
    ) -> Result<LessonView, CourseError> {
        ensure_learner(principal)?;

        let item = self
            .curriculum
            .item(lesson_id, ItemKind::Lesson)
            .ok_or_else(|| CourseError::LessonNotFound(lesson_id.into()))?
            .clone();

        let record = self.load_or_init(&principal.learner_id).await?;
        can_view_lesson(&self.curriculum, &record.progress, lesson_id).into_result()?;

        let (progress, progress_updated) = self
            .apply_advancement(&principal.learner_id, record, |curriculum, progress| {
                advance_after_lesson_view(curriculum, progress, lesson_id)
            })
            .await?;

        if progress_updated {
            info!(
                lesson_id,
                position = ?progress.current_position,
                final_exam_unlocked = progress.final_exam_unlocked,
                "lesson view advanced progress"
            );
        }

        Ok(LessonView {
            item,
            progress,
            progress_updated,
        })
    }

    /// Opens an exam for a learner. Returns the sanitized sheet, or the
    /// prior result when this triple was already submitted.
    #[instrument(skip(self, principal), fields(learner = %principal.learner_id))]
    pub async fn view_exam(
        &self,
        principal: &Principal,
        exam_id: &str,
        category: ExamCategory,
    ) -> Result<ExamView, CourseError> {
        ensure_learner(principal)?;
        self.scheduled_exam(exam_id, category)?;

        if let Some(prior) = self
            .store
            .find_submission(&principal.learner_id, exam_id, category)
            .await?
        {
            return Ok(ExamView::AlreadySubmitted { submission: prior });
        }

        let record = self.load_or_init(&principal.learner_id).await?;
        can_take_exam(&self.curriculum, &record.progress, exam_id, category).into_result()?;

        let exam = self.fetch_defined_exam(exam_id, category).await?;

        Ok(ExamView::Open {
            sheet: ExamSheet::from(&exam),
        })
    }

    /// Grades and records a submission, then advances progress on a pass.
    ///
    /// The duplicate check runs before any grading work; losing the insert
    /// race to a concurrent submit maps to the same duplicate error as the
    /// fast path, prior row attached.
    #[instrument(skip(self, principal, request), fields(learner = %principal.learner_id, exam = %request.exam_id))]
    pub async fn submit_exam(
        &self,
        principal: &Principal,
        request: &SubmitRequest,
    ) -> Result<SubmissionOutcome, CourseError> {
        ensure_learner(principal)?;
        let exam_id = request.exam_id.as_str();
        let category = request.category;
        self.scheduled_exam(exam_id, category)?;

        if let Some(prior) = self
            .store
            .find_submission(&principal.learner_id, exam_id, category)
            .await?
        {
            debug!("submission blocked: already submitted");
            return Err(CourseError::DuplicateSubmission {
                prior: Box::new(prior),
            });
        }

        let record = self.load_or_init(&principal.learner_id).await?;
        can_take_exam(&self.curriculum, &record.progress, exam_id, category).into_result()?;

        let exam = self.fetch_defined_exam(exam_id, category).await?;
        if exam.questions.is_empty() {
            return Err(CourseError::ExamQuestionsNotFound);
        }

        let threshold =
            effective_threshold(self.config.default_passing_threshold, &exam, category);
        let report = score_exam(&exam, &request.answers, threshold);

        let submission = Submission {
            id: Uuid::new_v4(),
            learner_id: principal.learner_id.clone(),
            exam_id: exam_id.to_string(),
            category,
            answers: request.answers.clone(),
            score: report.score,
            total_questions: report.total_questions,
            correct_answers: report.correct_answers,
            passing_threshold: report.passing_threshold,
            passed: report.passed,
            submitted_at: Utc::now(),
        };

        if let Err(e) = self.store.insert_submission(&submission).await {
            if matches!(e, crate::error::StoreError::DuplicateSubmission) {
                // Lost the insert race to a concurrent submit; surface the
                // winner's row like the fast path does.
                let prior = self
                    .store
                    .find_submission(&principal.learner_id, exam_id, category)
                    .await?
                    .ok_or(e)?;
                return Err(CourseError::DuplicateSubmission {
                    prior: Box::new(prior),
                });
            }
            return Err(e.into());
        }

        info!(
            score = submission.score,
            passed = submission.passed,
            category = %category,
            "submission recorded"
        );

        let (progress, progress_updated) = if report.passed {
            let role = principal.role;
            let policies = self.config.role_policies.clone();
            self.apply_advancement(&principal.learner_id, record, move |curriculum, progress| {
                advance_after_exam_submission(
                    curriculum, &policies, progress, exam_id, category, role,
                    submission.submitted_at,
                )
            })
            .await?
        } else {
            (record.progress, false)
        };

        // Pre-exam reviews are withheld by policy; the data exists but the
        // learner only sees the score.
        let review = (category != ExamCategory::PreExam).then_some(report.review);

        Ok(SubmissionOutcome {
            submission,
            review,
            progress,
            progress_updated,
        })
    }

    /// A learner's own view of where they stand.
    #[instrument(skip(self, principal), fields(learner = %principal.learner_id))]
    pub async fn learner_status(&self, principal: &Principal) -> Result<LearnerStatus, CourseError> {
        ensure_learner(principal)?;
        let record = self.load_or_init(&principal.learner_id).await?;
        let submissions = self.store.list_submissions(&principal.learner_id).await?;
        Ok(LearnerStatus {
            learner_id: principal.learner_id.clone(),
            role: principal.role,
            completed_lessons: completed_lessons(&self.curriculum, &record.progress),
            total_lessons: self.curriculum.lesson_count(),
            progress: record.progress,
            submissions,
        })
    }

    /// Assembles the cohort roster, one row per non-admin learner.
    #[instrument(skip(self))]
    pub async fn build_roster(&self) -> Result<RosterReport, CourseError> {
        let learners = self.store.list_learners().await?;
        let mut entries: Vec<RosterEntry> = stream::iter(
            learners
                .into_iter()
                .filter(|l| l.role != Role::Admin)
                .map(|learner| {
                    let store = Arc::clone(&self.store);
                    let curriculum = Arc::clone(&self.curriculum);
                    async move {
                        let progress = match store.load_progress(&learner.id).await? {
                            Some(record) => record.progress,
                            None => LearnerProgress::new(),
                        };
                        let submissions = store.list_submissions(&learner.id).await?;
                        Ok(RosterEntry::build(
                            &curriculum,
                            learner,
                            progress,
                            submissions,
                        ))
                    }
                }),
        )
        .buffer_unordered(self.config.roster_parallelism.max(1))
        .try_collect()
        .await
        .map_err(CourseError::Storage)?;

        entries.sort_by(|a, b| a.learner.id.cmp(&b.learner.id));
        info!(learners = entries.len(), "roster assembled");
        Ok(RosterReport::new(entries))
    }

    /// Checks the exam id against the curriculum schedule. Quizzes and
    /// activities must be scheduled under the requested category; gate exams
    /// live off the path and only fail here when the id is scheduled under a
    /// conflicting category. A wrong-category probe reads the same as a
    /// wrong-id probe.
    fn scheduled_exam(&self, exam_id: &str, category: ExamCategory) -> Result<(), CourseError> {
        match self.curriculum.item(exam_id, ItemKind::Exam) {
            Some(item) if item.exam_category == Some(category) => Ok(()),
            Some(_) => Err(CourseError::ExamNotFound(exam_id.into())),
            None if category.is_gate() => Ok(()),
            None => Err(CourseError::ExamNotFound(exam_id.into())),
        }
    }

    /// Fetches the exam definition, rejecting it when the bank records it
    /// under a different category than the request.
    async fn fetch_defined_exam(
        &self,
        exam_id: &str,
        category: ExamCategory,
    ) -> Result<Exam, CourseError> {
        let exam = self
            .store
            .fetch_exam(exam_id)
            .await?
            .ok_or_else(|| CourseError::ExamNotFound(exam_id.into()))?;
        if exam.category.is_some_and(|defined| defined != category) {
            return Err(CourseError::ExamNotFound(exam_id.into()));
        }
        Ok(exam)
    }

    async fn load_or_init(&self, learner_id: &str) -> Result<ProgressRecord, CourseError> {
        match self.store.load_progress(learner_id).await? {
            Some(record) => Ok(record),
            None => Ok(self.store.init_progress(learner_id).await?),
        }
    }

    /// Applies an advancement to the learner's progress and conditionally
    /// persists it. On a version conflict the record is re-read and the
    /// advancement replayed once; the advancement functions are pure, so
    /// replay against the newer snapshot is safe.
    async fn apply_advancement<F>(
        &self,
        learner_id: &str,
        mut record: ProgressRecord,
        advance: F,
    ) -> Result<(LearnerProgress, bool), CourseError>
    where
        F: Fn(&CurriculumIndex, &mut LearnerProgress) -> bool,
    {
        if !advance(&self.curriculum, &mut record.progress) {
            return Ok((record.progress, false));
        }
        match self
            .store
            .save_progress(learner_id, &record.progress, record.version)
            .await
        {
            Ok(_) => Ok((record.progress, true)),
            Err(e) if e.is_retryable_conflict() => {
                warn!(learner_id, "progress version conflict, replaying advancement");
                let mut record = self.load_or_init(learner_id).await?;
                if !advance(&self.curriculum, &mut record.progress) {
                    // A concurrent writer already advanced past the target.
                    return Ok((record.progress, false));
                }
                self.store
                    .save_progress(learner_id, &record.progress, record.version)
                    .await?;
                Ok((record.progress, true))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn ensure_learner(principal: &Principal) -> Result<(), CourseError> {
    if principal.role == Role::Admin {
        return Err(CourseError::AdminHasNoProgress);
    }
    Ok(())
}

/// The threshold a submission must meet: activities always pass, other
/// categories use the exam's own threshold or the engine default.
fn effective_threshold(default_threshold: f64, exam: &Exam, category: ExamCategory) -> f64 {
    if category == ExamCategory::Activity {
        0.0
    } else {
        exam.passing_threshold.unwrap_or(default_threshold)
    }
}
