//! The `curricle compare` command.

use std::path::PathBuf;

use anyhow::Result;

use curricle_core::report::RosterReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    fail_on_stall: bool,
    format: String,
) -> Result<()> {
    let baseline = RosterReport::load_json(&baseline_path)?;
    let current = RosterReport::load_json(&current_path)?;

    let delta = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", delta.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&delta)?);
        }
        _ => {
            // text format
            println!(
                "Delta: {} advanced, {} newly started, {} newly completed, {} new submissions",
                delta.advanced.len(),
                delta.newly_started.len(),
                delta.newly_completed.len(),
                delta.new_submissions
            );
            if delta.new_learners > 0 {
                println!("{} new learner(s)", delta.new_learners);
            }
            if delta.removed_learners > 0 {
                println!("{} removed learner(s)", delta.removed_learners);
            }
            for drift in &delta.exam_score_drift {
                println!(
                    "  {}: mean {:.2} -> {:.2} ({:+.2})",
                    drift.exam_id, drift.baseline_mean, drift.current_mean, drift.delta
                );
            }
        }
    }

    if fail_on_stall && !delta.has_advancement() {
        std::process::exit(1);
    }

    Ok(())
}
