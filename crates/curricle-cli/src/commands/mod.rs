//! Subcommand implementations.

pub mod compare;
pub mod init;
pub mod roster;
pub mod show;
pub mod simulate;
pub mod validate;

use comfy_table::{Cell, Table};

use curricle_core::report::RosterReport;

/// Prints the roster summary table shared by `simulate` and `roster`.
pub(crate) fn print_roster(report: &RosterReport) {
    let mut table = Table::new();
    table.set_header(vec![
        "Learner",
        "Role",
        "Position",
        "Lessons",
        "Submissions",
        "Pre",
        "Final",
        "Completed",
    ]);

    for entry in &report.entries {
        let position = entry
            .progress
            .current_position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".into());
        table.add_row(vec![
            Cell::new(&entry.learner.id),
            Cell::new(entry.learner.role),
            Cell::new(position),
            Cell::new(format!(
                "{}/{}",
                entry.completed_lessons, entry.total_lessons
            )),
            Cell::new(entry.submissions.len()),
            Cell::new(flag(entry.pre_exam_submitted)),
            Cell::new(flag(entry.final_exam_submitted)),
            Cell::new(flag(entry.progress.course_completed)),
        ]);
    }

    println!("\n{table}");
    let stats = &report.stats;
    println!(
        "{} learner(s): {} started, {} completed ({:.0}%)",
        stats.total_learners,
        stats.started,
        stats.completed,
        stats.completion_rate * 100.0
    );
}

fn flag(set: bool) -> &'static str {
    if set {
        "yes"
    } else {
        "-"
    }
}
