//! CSV rendering of roster reports.
//!
//! The sink contract is deliberately dumb: a header row plus data rows in,
//! an encoded byte stream out. Quoting follows RFC 4180 (fields containing
//! a comma, quote, or line break are double-quoted, embedded quotes
//! doubled), so the output opens cleanly in spreadsheet tools.

use std::path::Path;

use anyhow::Result;

use curricle_core::report::RosterReport;

/// Encode one field, quoting it when needed.
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Encode a header row plus data rows as CSV bytes (CRLF line endings).
pub fn render_rows(header: &[&str], rows: &[Vec<String>]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(
        &header
            .iter()
            .map(|f| escape_field(f))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push_str("\r\n");
    for row in rows {
        out.push_str(
            &row.iter()
                .map(|f| escape_field(f))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push_str("\r\n");
    }
    out.into_bytes()
}

/// The roster, one row per learner.
pub fn roster_csv(report: &RosterReport) -> Vec<u8> {
    let rows: Vec<Vec<String>> = report
        .entries
        .iter()
        .map(|entry| {
            vec![
                entry.learner.id.clone(),
                entry.learner.name.clone(),
                entry.learner.email.clone(),
                entry.learner.role.to_string(),
                entry
                    .progress
                    .current_position
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
                entry.completed_lessons.to_string(),
                entry.total_lessons.to_string(),
                entry.submissions.len().to_string(),
                entry.pre_exam_submitted.to_string(),
                entry.final_exam_submitted.to_string(),
                entry.progress.course_completed.to_string(),
                entry
                    .progress
                    .completed_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
            ]
        })
        .collect();

    render_rows(
        &[
            "learner_id",
            "name",
            "email",
            "role",
            "current_position",
            "completed_lessons",
            "total_lessons",
            "submissions",
            "pre_exam_submitted",
            "final_exam_submitted",
            "course_completed",
            "completed_at",
        ],
        &rows,
    )
}

/// Per-exam aggregates across the cohort, ordered by exam id.
pub fn exam_breakdown_csv(report: &RosterReport) -> Vec<u8> {
    let rows: Vec<Vec<String>> = report
        .stats
        .per_exam
        .values()
        .map(|stats| {
            vec![
                stats.exam_id.clone(),
                stats.category.to_string(),
                stats.attempts.to_string(),
                stats.passes.to_string(),
                format!("{:.4}", stats.pass_rate),
                format!("{:.2}", stats.mean_score),
            ]
        })
        .collect();

    render_rows(
        &[
            "exam_id",
            "category",
            "attempts",
            "passes",
            "pass_rate",
            "mean_score",
        ],
        &rows,
    )
}

/// Write the roster CSV to a file.
pub fn write_roster_csv(report: &RosterReport, path: &Path) -> Result<()> {
    write_bytes(&roster_csv(report), path)
}

/// Write the per-exam breakdown CSV to a file.
pub fn write_exam_breakdown_csv(report: &RosterReport, path: &Path) -> Result<()> {
    write_bytes(&exam_breakdown_csv(report), path)
}

fn write_bytes(bytes: &[u8], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::Utc;
    use curricle_core::curriculum::CurriculumIndex;
    use curricle_core::model::{
        CurriculumItem, ExamCategory, Learner, LearnerProgress, Role, Submission,
    };
    use curricle_core::roster::RosterEntry;
    use uuid::Uuid;

    fn course() -> CurriculumIndex {
        CurriculumIndex::new(vec![
            CurriculumItem::lesson("l1", 0, "One"),
            CurriculumItem::lesson("l2", 1, "Two"),
            CurriculumItem::exam("quiz", 2, "Checkpoint", ExamCategory::Quiz),
        ])
        .unwrap()
    }

    fn submission(learner_id: &str, exam_id: &str, category: ExamCategory, score: f64) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            learner_id: learner_id.into(),
            exam_id: exam_id.into(),
            category,
            answers: BTreeMap::new(),
            score,
            total_questions: 2,
            correct_answers: (score / 50.0) as usize,
            passing_threshold: 50.0,
            passed: score >= 50.0,
            submitted_at: Utc::now(),
        }
    }

    fn report() -> RosterReport {
        let cur = course();
        RosterReport::new(vec![
            RosterEntry::build(
                &cur,
                Learner {
                    id: "ada".into(),
                    // The comma exercises quoting end to end.
                    name: "Ada, L.".into(),
                    email: "ada@example.com".into(),
                    role: Role::Regular,
                },
                LearnerProgress {
                    current_position: Some(2),
                    ..Default::default()
                },
                vec![
                    submission("ada", "entry-check", ExamCategory::PreExam, 100.0),
                    submission("ada", "quiz", ExamCategory::Quiz, 50.0),
                ],
            ),
            RosterEntry::build(
                &cur,
                Learner {
                    id: "brn".into(),
                    name: "Bryn".into(),
                    email: "brn@example.com".into(),
                    role: Role::Pro,
                },
                LearnerProgress::new(),
                vec![],
            ),
        ])
    }

    #[test]
    fn fields_with_delimiters_are_quoted() {
        let bytes = render_rows(
            &["a", "b"],
            &[
                vec!["plain".into(), "has,comma".into()],
                vec!["has \"quote\"".into(), "line\nbreak".into()],
            ],
        );
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "a,b\r\nplain,\"has,comma\"\r\n\"has \"\"quote\"\"\",\"line\nbreak\"\r\n"
        );
    }

    #[test]
    fn roster_csv_lists_every_learner() {
        let text = String::from_utf8(roster_csv(&report())).unwrap();
        let lines: Vec<&str> = text.trim_end().split("\r\n").collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("learner_id,name,email,role,current_position"));
        assert!(lines[1].starts_with("ada,\"Ada, L.\",ada@example.com,regular,2,2,2,2,true,false"));
        assert!(lines[2].starts_with("brn,Bryn,brn@example.com,pro,,0,2,0,false,false"));
    }

    #[test]
    fn breakdown_aggregates_by_exam() {
        let text = String::from_utf8(exam_breakdown_csv(&report())).unwrap();
        let lines: Vec<&str> = text.trim_end().split("\r\n").collect();

        assert_eq!(lines[0], "exam_id,category,attempts,passes,pass_rate,mean_score");
        // BTreeMap ordering puts entry-check before quiz.
        assert_eq!(lines[1], "entry-check,pre_exam,1,1,1.0000,100.00");
        assert_eq!(lines[2], "quiz,quiz,1,1,1.0000,50.00");
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();

        let roster_path = dir.path().join("exports/roster.csv");
        write_roster_csv(&report(), &roster_path).unwrap();
        let content = std::fs::read_to_string(&roster_path).unwrap();
        assert!(content.starts_with("learner_id,"));

        let breakdown_path = dir.path().join("exports/exams.csv");
        write_exam_breakdown_csv(&report(), &breakdown_path).unwrap();
        assert!(breakdown_path.exists());
    }
}
