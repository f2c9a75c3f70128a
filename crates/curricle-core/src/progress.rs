//! Progress advancement rules.
//!
//! Both advancement paths (lesson view, passed exam) funnel through a single
//! monotonic clamp: `current_position` only ever moves forward. A curriculum
//! override that points backward unlocks nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::curriculum::CurriculumIndex;
use crate::model::{ExamCategory, ItemKind, LearnerProgress, Role};

/// Advancement policy for one learner role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePolicy {
    /// Position granted when the pre-exam is passed.
    pub entry_position: usize,
}

/// Per-role policy table.
///
/// Regular and Pro learners share one curriculum but enter it at different
/// offsets; keeping both offsets in one table stops the two tracks drifting
/// apart. Admins have no row because they never progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolePolicies {
    pub regular: RolePolicy,
    pub pro: RolePolicy,
}

impl Default for RolePolicies {
    fn default() -> Self {
        Self {
            regular: RolePolicy { entry_position: 0 },
            pro: RolePolicy { entry_position: 6 },
        }
    }
}

impl RolePolicies {
    /// Entry position for a progressing role; `None` for Admin.
    pub fn entry_position(&self, role: Role) -> Option<usize> {
        match role {
            Role::Regular => Some(self.regular.entry_position),
            Role::Pro => Some(self.pro.entry_position),
            Role::Admin => None,
        }
    }
}

/// Advances progress after a lesson view. Returns whether anything changed,
/// so callers can skip the storage write for no-ops.
///
/// Re-viewing a lesson below the current position changes nothing. Viewing
/// the lesson at the current position moves to the next position, or sets
/// `final_exam_unlocked` when the path ends there.
pub fn advance_after_lesson_view(
    curriculum: &CurriculumIndex,
    progress: &mut LearnerProgress,
    lesson_id: &str,
) -> bool {
    let Some(current) = progress.current_position else {
        return false;
    };
    let Some(position) = curriculum.position_of(lesson_id, ItemKind::Lesson) else {
        return false;
    };
    if position != current {
        return false;
    }
    match curriculum.next_position_of(lesson_id, ItemKind::Lesson) {
        Some(next) => unlock_through(progress, next),
        None => unlock_final_exam(progress),
    }
}

/// Advances progress after a passed exam submission. Returns whether
/// anything changed.
///
/// Callers must only invoke this for passed submissions; a failed attempt
/// never advances anything.
pub fn advance_after_exam_submission(
    curriculum: &CurriculumIndex,
    policies: &RolePolicies,
    progress: &mut LearnerProgress,
    exam_id: &str,
    category: ExamCategory,
    role: Role,
    now: DateTime<Utc>,
) -> bool {
    match category {
        ExamCategory::PreExam => match policies.entry_position(role) {
            Some(entry) => unlock_through(progress, entry),
            None => false,
        },
        ExamCategory::FinalExam => {
            if progress.course_completed {
                return false;
            }
            progress.course_completed = true;
            progress.completed_at = Some(now);
            progress.final_exam_unlocked = false;
            true
        }
        ExamCategory::Quiz | ExamCategory::Activity => {
            match curriculum.resolve_advance_target(exam_id) {
                Some(target) => unlock_through(progress, target),
                None => unlock_final_exam(progress),
            }
        }
    }
}

/// The monotonic clamp: raise `current_position` to `target`, never lower it.
fn unlock_through(progress: &mut LearnerProgress, target: usize) -> bool {
    match progress.current_position {
        Some(current) if current >= target => false,
        _ => {
            progress.current_position = Some(target);
            true
        }
    }
}

fn unlock_final_exam(progress: &mut LearnerProgress) -> bool {
    if progress.final_exam_unlocked {
        return false;
    }
    progress.final_exam_unlocked = true;
    true
}
