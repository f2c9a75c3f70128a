//! Access rules: which items a learner may open or attempt.
//!
//! Every rule reduces to a comparison against the learner's single
//! `current_position`. There is no graph walk and no per-module bookkeeping;
//! the position is the whole story.

use serde::{Deserialize, Serialize};

use crate::curriculum::CurriculumIndex;
use crate::error::CourseError;
use crate::model::{ExamCategory, ItemKind, LearnerProgress};

/// Outcome of an access check. Denials carry a user-facing reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AccessDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }

    /// Converts a denial into [`CourseError::EligibilityDenied`].
    pub fn into_result(self) -> Result<(), CourseError> {
        if self.allowed {
            Ok(())
        } else {
            Err(CourseError::denied(
                self.reason.unwrap_or_else(|| "access denied".into()),
            ))
        }
    }
}

/// May the learner open this lesson?
///
/// Allowed iff the lesson's position is at or below the learner's current
/// position. A learner who has not passed the pre-exam has no position and
/// is denied everything.
pub fn can_view_lesson(
    curriculum: &CurriculumIndex,
    progress: &LearnerProgress,
    lesson_id: &str,
) -> AccessDecision {
    let Some(current) = progress.current_position else {
        return AccessDecision::deny("complete the pre-exam to start the course");
    };
    let Some(position) = curriculum.position_of(lesson_id, ItemKind::Lesson) else {
        return AccessDecision::deny("lesson not found");
    };
    if position <= current {
        AccessDecision::allow()
    } else {
        AccessDecision::deny("complete prior lessons first")
    }
}

/// May the learner attempt this exam?
///
/// Pre-exams are always open (they are the entry gate; the one-submission
/// rule still applies at submit time). The final exam opens only once the
/// end of the path unlocked it. Quizzes and activities follow the same
/// position comparison as lessons, except that a learner who finished the
/// whole path may revisit any of them.
pub fn can_take_exam(
    curriculum: &CurriculumIndex,
    progress: &LearnerProgress,
    exam_id: &str,
    category: ExamCategory,
) -> AccessDecision {
    match category {
        ExamCategory::PreExam => AccessDecision::allow(),
        ExamCategory::FinalExam => {
            if progress.final_exam_unlocked {
                AccessDecision::allow()
            } else {
                AccessDecision::deny("final exam is not unlocked yet")
            }
        }
        ExamCategory::Quiz | ExamCategory::Activity => {
            if progress.final_exam_unlocked {
                return AccessDecision::allow();
            }
            let Some(current) = progress.current_position else {
                return AccessDecision::deny("complete the pre-exam to start the course");
            };
            let Some(position) = curriculum.position_of(exam_id, ItemKind::Exam) else {
                return AccessDecision::deny("exam not found");
            };
            if position <= current {
                AccessDecision::allow()
            } else {
                AccessDecision::deny("complete prior items first")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CurriculumItem;

    // The pre-exam and final exam are gates outside the path; they never
    // appear in the index.
    fn curriculum() -> CurriculumIndex {
        CurriculumIndex::new(vec![
            CurriculumItem::lesson("l1", 0, "One"),
            CurriculumItem::lesson("l2", 1, "Two"),
            CurriculumItem::lesson("l3", 2, "Three"),
            CurriculumItem::exam("quiz", 3, "Checkpoint", ExamCategory::Quiz),
        ])
        .unwrap()
    }

    fn at(position: usize) -> LearnerProgress {
        LearnerProgress {
            current_position: Some(position),
            ..Default::default()
        }
    }

    #[test]
    fn unstarted_learner_is_denied_lessons() {
        let decision = can_view_lesson(&curriculum(), &LearnerProgress::new(), "l3");
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("pre-exam"));
    }

    #[test]
    fn lesson_open_at_or_below_current_position() {
        let cur = curriculum();
        assert!(can_view_lesson(&cur, &at(1), "l1").allowed);
        assert!(can_view_lesson(&cur, &at(1), "l2").allowed);
        let ahead = can_view_lesson(&cur, &at(1), "l3");
        assert!(!ahead.allowed);
        assert_eq!(ahead.reason.unwrap(), "complete prior lessons first");
    }

    #[test]
    fn unknown_lesson_is_denied() {
        let decision = can_view_lesson(&curriculum(), &at(2), "ghost");
        assert_eq!(decision.reason.unwrap(), "lesson not found");
    }

    #[test]
    fn pre_exam_is_always_open() {
        let cur = curriculum();
        assert!(can_take_exam(&cur, &LearnerProgress::new(), "pre", ExamCategory::PreExam).allowed);
        assert!(can_take_exam(&cur, &at(3), "pre", ExamCategory::PreExam).allowed);
    }

    #[test]
    fn final_exam_requires_the_unlock_flag() {
        let cur = curriculum();
        // Position alone never opens the final exam.
        let denied = can_take_exam(&cur, &at(3), "final", ExamCategory::FinalExam);
        assert!(!denied.allowed);

        let unlocked = LearnerProgress {
            current_position: Some(3),
            final_exam_unlocked: true,
            ..Default::default()
        };
        assert!(can_take_exam(&cur, &unlocked, "final", ExamCategory::FinalExam).allowed);
    }

    #[test]
    fn quiz_follows_the_position_comparison() {
        let cur = curriculum();
        assert!(!can_take_exam(&cur, &at(2), "quiz", ExamCategory::Quiz).allowed);
        assert!(can_take_exam(&cur, &at(3), "quiz", ExamCategory::Quiz).allowed);
        assert!(
            !can_take_exam(&cur, &LearnerProgress::new(), "quiz", ExamCategory::Quiz).allowed
        );
    }

    #[test]
    fn finished_learner_may_revisit_any_quiz() {
        let finished = LearnerProgress {
            current_position: Some(1),
            final_exam_unlocked: true,
            ..Default::default()
        };
        assert!(can_take_exam(&curriculum(), &finished, "quiz", ExamCategory::Quiz).allowed);
    }

    #[test]
    fn denial_converts_to_typed_error() {
        let err = AccessDecision::deny("nope").into_result().unwrap_err();
        assert!(err.is_denied());
        assert!(AccessDecision::allow().into_result().is_ok());
    }
}
