//! Roster snapshot reports with JSON persistence and cohort drift detection.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roster::{compute_course_stats, CourseStats, RosterEntry};

/// A point-in-time snapshot of the whole cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
    /// Aggregate statistics over `entries`.
    pub stats: CourseStats,
    /// One row per learner.
    pub entries: Vec<RosterEntry>,
}

impl RosterReport {
    /// Builds a snapshot from roster rows, computing the aggregates.
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            stats: compute_course_stats(&entries),
            entries,
        }
    }

    /// Save the snapshot as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a snapshot from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: RosterReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this snapshot against an earlier one.
    pub fn compare(&self, baseline: &RosterReport) -> ProgressDelta {
        let baseline_by_id: HashMap<&str, &RosterEntry> = baseline
            .entries
            .iter()
            .map(|e| (e.learner.id.as_str(), e))
            .collect();
        let current_ids: HashSet<&str> =
            self.entries.iter().map(|e| e.learner.id.as_str()).collect();
        let baseline_submissions: HashSet<Uuid> = baseline
            .entries
            .iter()
            .flat_map(|e| e.submissions.iter().map(|s| s.id))
            .collect();

        let mut newly_started = Vec::new();
        let mut newly_completed = Vec::new();
        let mut advanced = Vec::new();
        let mut new_learners = 0usize;
        let mut new_submissions = 0usize;

        for entry in &self.entries {
            new_submissions += entry
                .submissions
                .iter()
                .filter(|s| !baseline_submissions.contains(&s.id))
                .count();

            let Some(before) = baseline_by_id.get(entry.learner.id.as_str()) else {
                new_learners += 1;
                if entry.progress.has_started() {
                    newly_started.push(entry.learner.id.clone());
                }
                if entry.progress.course_completed {
                    newly_completed.push(entry.learner.id.clone());
                }
                continue;
            };

            if entry.progress.has_started() && !before.progress.has_started() {
                newly_started.push(entry.learner.id.clone());
            }
            if entry.progress.course_completed && !before.progress.course_completed {
                newly_completed.push(entry.learner.id.clone());
            }
            if entry.progress.current_position > before.progress.current_position {
                advanced.push(LearnerAdvance {
                    learner_id: entry.learner.id.clone(),
                    baseline_position: before.progress.current_position,
                    current_position: entry.progress.current_position,
                });
            }
        }

        let removed_learners = baseline
            .entries
            .iter()
            .filter(|e| !current_ids.contains(e.learner.id.as_str()))
            .count();

        let mut exam_score_drift = Vec::new();
        for (exam_id, current) in &self.stats.per_exam {
            if let Some(before) = baseline.stats.per_exam.get(exam_id) {
                let delta = current.mean_score - before.mean_score;
                if delta.abs() > f64::EPSILON {
                    exam_score_drift.push(ExamScoreDrift {
                        exam_id: exam_id.clone(),
                        baseline_mean: before.mean_score,
                        current_mean: current.mean_score,
                        delta,
                    });
                }
            }
        }

        ProgressDelta {
            baseline_at: baseline.generated_at,
            current_at: self.generated_at,
            newly_started,
            newly_completed,
            advanced,
            new_submissions,
            new_learners,
            removed_learners,
            exam_score_drift,
        }
    }
}

/// Result of comparing two snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressDelta {
    pub baseline_at: DateTime<Utc>,
    pub current_at: DateTime<Utc>,
    /// Learners who unlocked the curriculum since the baseline.
    pub newly_started: Vec<String>,
    /// Learners who passed the final exam since the baseline.
    pub newly_completed: Vec<String>,
    /// Learners whose position moved forward.
    pub advanced: Vec<LearnerAdvance>,
    /// Submissions not present in the baseline.
    pub new_submissions: usize,
    /// Learners in current but not baseline.
    pub new_learners: usize,
    /// Learners in baseline but not current.
    pub removed_learners: usize,
    /// Mean-score movement per exam present in both snapshots.
    pub exam_score_drift: Vec<ExamScoreDrift>,
}

/// One learner's position movement between snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerAdvance {
    pub learner_id: String,
    pub baseline_position: Option<usize>,
    pub current_position: Option<usize>,
}

/// Mean-score movement for one exam between snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamScoreDrift {
    pub exam_id: String,
    pub baseline_mean: f64,
    pub current_mean: f64,
    pub delta: f64,
}

impl ProgressDelta {
    /// Format the delta as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} advanced, {} newly completed, {} new submissions\n\n",
            self.advanced.len(),
            self.newly_completed.len(),
            self.new_submissions
        ));

        if !self.newly_completed.is_empty() {
            md.push_str("### Newly completed\n\n");
            for id in &self.newly_completed {
                md.push_str(&format!("- {id}\n"));
            }
            md.push('\n');
        }

        if !self.advanced.is_empty() {
            md.push_str("### Advanced\n\n");
            md.push_str("| Learner | From | To |\n");
            md.push_str("|---------|------|----|\n");
            for a in &self.advanced {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    a.learner_id,
                    position_label(a.baseline_position),
                    position_label(a.current_position)
                ));
            }
            md.push('\n');
        }

        if !self.exam_score_drift.is_empty() {
            md.push_str("### Exam score drift\n\n");
            md.push_str("| Exam | Baseline | Current | Delta |\n");
            md.push_str("|------|----------|---------|-------|\n");
            for d in &self.exam_score_drift {
                md.push_str(&format!(
                    "| {} | {:.2} | {:.2} | {:+.2} |\n",
                    d.exam_id, d.baseline_mean, d.current_mean, d.delta
                ));
            }
        }

        md
    }

    /// True when any learner moved at all since the baseline.
    pub fn has_advancement(&self) -> bool {
        !self.advanced.is_empty()
            || !self.newly_started.is_empty()
            || !self.newly_completed.is_empty()
            || self.new_submissions > 0
    }
}

fn position_label(position: Option<usize>) -> String {
    match position {
        Some(p) => p.to_string(),
        None => "-".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::CurriculumIndex;
    use crate::model::{CurriculumItem, ExamCategory, Learner, LearnerProgress, Role};

    fn curriculum() -> CurriculumIndex {
        CurriculumIndex::new(vec![
            CurriculumItem::lesson("l1", 0, "One"),
            CurriculumItem::lesson("l2", 1, "Two"),
            CurriculumItem::exam("quiz", 2, "Checkpoint", ExamCategory::Quiz),
        ])
        .unwrap()
    }

    fn entry(id: &str, position: Option<usize>, completed: bool) -> RosterEntry {
        RosterEntry::build(
            &curriculum(),
            Learner {
                id: id.into(),
                name: id.to_uppercase(),
                email: format!("{id}@example.com"),
                role: Role::Regular,
            },
            LearnerProgress {
                current_position: position,
                course_completed: completed,
                completed_at: completed.then(Utc::now),
                ..Default::default()
            },
            vec![],
        )
    }

    #[test]
    fn compare_identical_snapshots_is_quiet() {
        let baseline = RosterReport::new(vec![entry("a", Some(1), false)]);
        let current = RosterReport::new(vec![entry("a", Some(1), false)]);

        let delta = current.compare(&baseline);
        assert!(!delta.has_advancement());
        assert!(delta.advanced.is_empty());
        assert_eq!(delta.new_submissions, 0);
    }

    #[test]
    fn compare_detects_advancement_and_completion() {
        let baseline = RosterReport::new(vec![entry("a", None, false), entry("b", Some(1), false)]);
        let current = RosterReport::new(vec![entry("a", Some(0), false), entry("b", Some(2), true)]);

        let delta = current.compare(&baseline);
        assert_eq!(delta.newly_started, vec!["a"]);
        assert_eq!(delta.newly_completed, vec!["b"]);
        assert_eq!(delta.advanced.len(), 2);
        assert!(delta.has_advancement());
    }

    #[test]
    fn compare_counts_new_and_removed_learners() {
        let baseline = RosterReport::new(vec![entry("old", Some(1), false)]);
        let current = RosterReport::new(vec![entry("new", None, false)]);

        let delta = current.compare(&baseline);
        assert_eq!(delta.new_learners, 1);
        assert_eq!(delta.removed_learners, 1);
        assert!(!delta.has_advancement());
    }

    #[test]
    fn json_roundtrip() {
        let report = RosterReport::new(vec![entry("a", Some(2), false)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/roster.json");

        report.save_json(&path).unwrap();
        let loaded = RosterReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.stats.total_learners, 1);
    }

    #[test]
    fn markdown_output_lists_movement() {
        let baseline = RosterReport::new(vec![entry("a", Some(1), false)]);
        let current = RosterReport::new(vec![entry("a", Some(2), true)]);

        let md = current.compare(&baseline).to_markdown();
        assert!(md.contains("Newly completed"));
        assert!(md.contains("| a | 1 | 2 |"));
    }
}
