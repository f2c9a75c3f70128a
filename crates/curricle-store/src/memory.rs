//! In-memory store for tests and local simulation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use curricle_core::error::StoreError;
use curricle_core::model::{
    Exam, ExamCategory, Learner, LearnerProgress, ProgressRecord, Submission,
};
use curricle_core::traits::CourseStore;

type SubmissionKey = (String, String, ExamCategory);

/// A `CourseStore` backed by in-process maps.
///
/// Mirrors the backing database's two write-side guarantees: conditional
/// progress writes keyed on a version counter, and a unique key over
/// (learner, exam, category) submissions. Tests can trip a one-shot version
/// conflict to exercise the engine's replay path.
#[derive(Default)]
pub struct MemoryStore {
    progress: Mutex<HashMap<String, ProgressRecord>>,
    submissions: Mutex<HashMap<SubmissionKey, Submission>>,
    exams: Mutex<HashMap<String, Exam>>,
    learners: Mutex<Vec<Learner>>,
    /// Number of conditional progress writes attempted.
    save_calls: AtomicU32,
    /// Saves left to fail with an injected version conflict.
    pending_conflicts: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a learner row.
    pub fn with_learner(self, learner: Learner) -> Self {
        self.learners.lock().unwrap().push(learner);
        self
    }

    /// Seeds an exam definition.
    pub fn with_exam(self, exam: Exam) -> Self {
        self.exams.lock().unwrap().insert(exam.id.clone(), exam);
        self
    }

    /// Seeds a progress row at version 1.
    pub fn with_progress(self, learner_id: &str, progress: LearnerProgress) -> Self {
        self.progress.lock().unwrap().insert(
            learner_id.to_string(),
            ProgressRecord {
                learner_id: learner_id.to_string(),
                version: 1,
                progress,
            },
        );
        self
    }

    /// Number of conditional progress writes attempted so far.
    pub fn save_calls(&self) -> u32 {
        self.save_calls.load(Ordering::Relaxed)
    }

    /// Arms one injected version conflict; each call makes one more
    /// `save_progress` fail before writes succeed again.
    pub fn conflict_on_next_save(&self) {
        self.pending_conflicts.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl CourseStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_progress(&self, learner_id: &str) -> Result<Option<ProgressRecord>, StoreError> {
        Ok(self.progress.lock().unwrap().get(learner_id).cloned())
    }

    async fn init_progress(&self, learner_id: &str) -> Result<ProgressRecord, StoreError> {
        let mut progress = self.progress.lock().unwrap();
        let record = progress
            .entry(learner_id.to_string())
            .or_insert_with(|| ProgressRecord {
                learner_id: learner_id.to_string(),
                version: 1,
                progress: LearnerProgress::new(),
            });
        Ok(record.clone())
    }

    async fn save_progress(
        &self,
        learner_id: &str,
        progress: &LearnerProgress,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        self.save_calls.fetch_add(1, Ordering::Relaxed);

        let mut map = self.progress.lock().unwrap();
        let record = map
            .get_mut(learner_id)
            .ok_or_else(|| StoreError::RecordNotFound(learner_id.to_string()))?;

        if self
            .pending_conflicts
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
        {
            // Simulate a concurrent writer landing first.
            record.version += 1;
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                found: Some(record.version),
            });
        }

        if record.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                found: Some(record.version),
            });
        }

        record.version += 1;
        record.progress = progress.clone();
        Ok(record.version)
    }

    async fn find_submission(
        &self,
        learner_id: &str,
        exam_id: &str,
        category: ExamCategory,
    ) -> Result<Option<Submission>, StoreError> {
        let key = (learner_id.to_string(), exam_id.to_string(), category);
        Ok(self.submissions.lock().unwrap().get(&key).cloned())
    }

    async fn insert_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        let (learner_id, exam_id, category) = submission.key();
        let key = (learner_id.to_string(), exam_id.to_string(), category);
        let mut map = self.submissions.lock().unwrap();
        if map.contains_key(&key) {
            return Err(StoreError::DuplicateSubmission);
        }
        map.insert(key, submission.clone());
        Ok(())
    }

    async fn list_submissions(&self, learner_id: &str) -> Result<Vec<Submission>, StoreError> {
        let mut rows: Vec<Submission> = self
            .submissions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.learner_id == learner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn fetch_exam(&self, exam_id: &str) -> Result<Option<Exam>, StoreError> {
        Ok(self.exams.lock().unwrap().get(exam_id).cloned())
    }

    async fn list_learners(&self) -> Result<Vec<Learner>, StoreError> {
        Ok(self.learners.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use chrono::Utc;
    use uuid::Uuid;

    fn make_submission(learner_id: &str, exam_id: &str, category: ExamCategory) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            learner_id: learner_id.into(),
            exam_id: exam_id.into(),
            category,
            answers: BTreeMap::new(),
            score: 100.0,
            total_questions: 1,
            correct_answers: 1,
            passing_threshold: 50.0,
            passed: true,
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.init_progress("a").await.unwrap();
        let second = store.init_progress("a").await.unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 1);
        assert!(!second.progress.has_started());
    }

    #[tokio::test]
    async fn save_bumps_the_version() {
        let store = MemoryStore::new();
        let record = store.init_progress("a").await.unwrap();

        let mut progress = record.progress.clone();
        progress.current_position = Some(0);
        let v2 = store.save_progress("a", &progress, record.version).await.unwrap();
        assert_eq!(v2, 2);

        let reloaded = store.load_progress("a").await.unwrap().unwrap();
        assert_eq!(reloaded.version, 2);
        assert_eq!(reloaded.progress.current_position, Some(0));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = MemoryStore::new();
        let record = store.init_progress("a").await.unwrap();

        let mut progress = record.progress.clone();
        progress.current_position = Some(0);
        store.save_progress("a", &progress, record.version).await.unwrap();

        // Replaying the same expected version must fail.
        let err = store
            .save_progress("a", &progress, record.version)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict {
                expected: 1,
                found: Some(2)
            }
        ));
    }

    #[tokio::test]
    async fn save_requires_an_existing_row() {
        let store = MemoryStore::new();
        let err = store
            .save_progress("ghost", &LearnerProgress::new(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_submission_key_is_rejected() {
        let store = MemoryStore::new();
        let first = make_submission("a", "quiz-1", ExamCategory::Quiz);
        store.insert_submission(&first).await.unwrap();

        // Same triple, different row id.
        let second = make_submission("a", "quiz-1", ExamCategory::Quiz);
        let err = store.insert_submission(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSubmission));

        let found = store
            .find_submission("a", "quiz-1", ExamCategory::Quiz)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn same_exam_id_under_another_category_is_distinct() {
        let store = MemoryStore::new();
        store
            .insert_submission(&make_submission("a", "checkpoint", ExamCategory::Quiz))
            .await
            .unwrap();
        store
            .insert_submission(&make_submission("a", "checkpoint", ExamCategory::Activity))
            .await
            .unwrap();

        let rows = store.list_submissions("a").await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn list_submissions_is_scoped_to_the_learner() {
        let store = MemoryStore::new();
        store
            .insert_submission(&make_submission("a", "quiz-1", ExamCategory::Quiz))
            .await
            .unwrap();
        store
            .insert_submission(&make_submission("b", "quiz-1", ExamCategory::Quiz))
            .await
            .unwrap();

        let rows = store.list_submissions("a").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].learner_id, "a");
    }

    #[tokio::test]
    async fn injected_conflict_fires_once() {
        let store = MemoryStore::new();
        let record = store.init_progress("a").await.unwrap();
        store.conflict_on_next_save();

        let mut progress = record.progress.clone();
        progress.current_position = Some(0);
        let err = store
            .save_progress("a", &progress, record.version)
            .await
            .unwrap_err();
        assert!(err.is_retryable_conflict());

        // The injected writer bumped the version; a re-read save succeeds.
        let reloaded = store.load_progress("a").await.unwrap().unwrap();
        let v = store
            .save_progress("a", &progress, reloaded.version)
            .await
            .unwrap();
        assert_eq!(v, reloaded.version + 1);
        assert_eq!(store.save_calls(), 2);
    }
}
