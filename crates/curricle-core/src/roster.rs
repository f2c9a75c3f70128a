//! Cohort roster rows and aggregate course statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::curriculum::CurriculumIndex;
use crate::model::{ExamCategory, Learner, LearnerProgress, Submission};

/// One learner's row in the admin roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub learner: Learner,
    pub progress: LearnerProgress,
    /// Lessons at positions the learner has moved past.
    pub completed_lessons: usize,
    pub total_lessons: usize,
    /// Every submission by this learner, oldest first.
    pub submissions: Vec<Submission>,
    pub pre_exam_submitted: bool,
    pub final_exam_submitted: bool,
}

impl RosterEntry {
    pub fn build(
        curriculum: &CurriculumIndex,
        learner: Learner,
        progress: LearnerProgress,
        submissions: Vec<Submission>,
    ) -> Self {
        let pre_exam_submitted = submissions
            .iter()
            .any(|s| s.category == ExamCategory::PreExam);
        let final_exam_submitted = submissions
            .iter()
            .any(|s| s.category == ExamCategory::FinalExam);
        Self {
            completed_lessons: completed_lessons(curriculum, &progress),
            total_lessons: curriculum.lesson_count(),
            learner,
            progress,
            submissions,
            pre_exam_submitted,
            final_exam_submitted,
        }
    }
}

/// How many lessons the learner has moved past.
///
/// The lesson at the current position is still in front of the learner, so
/// only strictly lower positions count; a learner past the end of the path
/// has completed every lesson.
pub fn completed_lessons(curriculum: &CurriculumIndex, progress: &LearnerProgress) -> usize {
    if progress.course_completed || progress.final_exam_unlocked {
        return curriculum.lesson_count();
    }
    match progress.current_position {
        Some(position) => curriculum.lesson_count_before(position),
        None => 0,
    }
}

/// Aggregate statistics across the whole cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseStats {
    pub total_learners: usize,
    /// Learners who have unlocked the curriculum.
    pub started: usize,
    /// Learners who have passed the final exam.
    pub completed: usize,
    /// `completed / total_learners`, 0 for an empty cohort.
    pub completion_rate: f64,
    /// Per-exam aggregates keyed by exam id.
    pub per_exam: BTreeMap<String, ExamStats>,
}

/// Aggregates for one exam across the cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamStats {
    pub exam_id: String,
    pub category: ExamCategory,
    pub attempts: usize,
    pub passes: usize,
    pub pass_rate: f64,
    pub mean_score: f64,
}

/// Computes cohort statistics from roster rows.
pub fn compute_course_stats(entries: &[RosterEntry]) -> CourseStats {
    let total_learners = entries.len();
    let started = entries.iter().filter(|e| e.progress.has_started()).count();
    let completed = entries
        .iter()
        .filter(|e| e.progress.course_completed)
        .count();
    let completion_rate = if total_learners == 0 {
        0.0
    } else {
        completed as f64 / total_learners as f64
    };

    let mut grouped: BTreeMap<String, Vec<&Submission>> = BTreeMap::new();
    for entry in entries {
        for submission in &entry.submissions {
            grouped
                .entry(submission.exam_id.clone())
                .or_default()
                .push(submission);
        }
    }

    let per_exam = grouped
        .into_iter()
        .map(|(exam_id, submissions)| {
            let attempts = submissions.len();
            let passes = submissions.iter().filter(|s| s.passed).count();
            let mean_score =
                submissions.iter().map(|s| s.score).sum::<f64>() / attempts.max(1) as f64;
            let stats = ExamStats {
                exam_id: exam_id.clone(),
                category: submissions[0].category,
                attempts,
                passes,
                pass_rate: passes as f64 / attempts.max(1) as f64,
                mean_score,
            };
            (exam_id, stats)
        })
        .collect();

    CourseStats {
        total_learners,
        started,
        completed,
        completion_rate,
        per_exam,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CurriculumItem, Role};
    use chrono::Utc;
    use std::collections::BTreeMap as Answers;
    use uuid::Uuid;

    // Gate exams live off the path; the roster sees their submissions only
    // through the category flags.
    fn curriculum() -> CurriculumIndex {
        CurriculumIndex::new(vec![
            CurriculumItem::lesson("l1", 0, "One"),
            CurriculumItem::lesson("l2", 1, "Two"),
            CurriculumItem::exam("quiz", 2, "Checkpoint", ExamCategory::Quiz),
        ])
        .unwrap()
    }

    fn learner(id: &str) -> Learner {
        Learner {
            id: id.into(),
            name: format!("Learner {id}"),
            email: format!("{id}@example.com"),
            role: Role::Regular,
        }
    }

    fn submission(learner_id: &str, exam_id: &str, category: ExamCategory, score: f64) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            learner_id: learner_id.into(),
            exam_id: exam_id.into(),
            category,
            answers: Answers::new(),
            score,
            total_questions: 4,
            correct_answers: (score / 25.0) as usize,
            passing_threshold: 50.0,
            passed: score >= 50.0,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn completed_lessons_counts_passed_positions() {
        let cur = curriculum();
        assert_eq!(completed_lessons(&cur, &LearnerProgress::new()), 0);

        let mid = LearnerProgress {
            current_position: Some(1),
            ..Default::default()
        };
        // Only l1 at position 0 is behind the learner.
        assert_eq!(completed_lessons(&cur, &mid), 1);

        let finished = LearnerProgress {
            current_position: Some(2),
            final_exam_unlocked: true,
            ..Default::default()
        };
        assert_eq!(completed_lessons(&cur, &finished), 2);
    }

    #[test]
    fn roster_entry_flags_pre_and_final_submissions() {
        let cur = curriculum();
        let entry = RosterEntry::build(
            &cur,
            learner("a"),
            LearnerProgress::new(),
            vec![
                submission("a", "pre", ExamCategory::PreExam, 75.0),
                submission("a", "quiz", ExamCategory::Quiz, 25.0),
            ],
        );
        assert!(entry.pre_exam_submitted);
        assert!(!entry.final_exam_submitted);
        assert_eq!(entry.total_lessons, 2);
    }

    #[test]
    fn stats_over_empty_cohort_do_not_divide_by_zero() {
        let stats = compute_course_stats(&[]);
        assert_eq!(stats.total_learners, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert!(stats.per_exam.is_empty());
    }

    #[test]
    fn stats_aggregate_per_exam() {
        let cur = curriculum();
        let entries = vec![
            RosterEntry::build(
                &cur,
                learner("a"),
                LearnerProgress {
                    current_position: Some(2),
                    ..Default::default()
                },
                vec![submission("a", "quiz", ExamCategory::Quiz, 100.0)],
            ),
            RosterEntry::build(
                &cur,
                learner("b"),
                LearnerProgress {
                    current_position: Some(2),
                    ..Default::default()
                },
                vec![submission("b", "quiz", ExamCategory::Quiz, 25.0)],
            ),
            RosterEntry::build(&cur, learner("c"), LearnerProgress::new(), vec![]),
        ];

        let stats = compute_course_stats(&entries);
        assert_eq!(stats.total_learners, 3);
        assert_eq!(stats.started, 2);
        assert_eq!(stats.completed, 0);

        let quiz = &stats.per_exam["quiz"];
        assert_eq!(quiz.attempts, 2);
        assert_eq!(quiz.passes, 1);
        assert!((quiz.pass_rate - 0.5).abs() < f64::EPSILON);
        assert!((quiz.mean_score - 62.5).abs() < f64::EPSILON);
    }

    #[test]
    fn completion_rate_counts_final_passes() {
        let cur = curriculum();
        let done = LearnerProgress {
            current_position: Some(2),
            course_completed: true,
            completed_at: Some(Utc::now()),
            ..Default::default()
        };
        let entries = vec![
            RosterEntry::build(&cur, learner("a"), done, vec![]),
            RosterEntry::build(&cur, learner("b"), LearnerProgress::new(), vec![]),
        ];
        let stats = compute_course_stats(&entries);
        assert_eq!(stats.completed, 1);
        assert!((stats.completion_rate - 0.5).abs() < f64::EPSILON);
    }
}
