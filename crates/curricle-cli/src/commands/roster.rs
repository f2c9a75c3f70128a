//! The `curricle roster` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use curricle_core::engine::CourseEngine;
use curricle_core::parser;
use curricle_report::csv::{write_exam_breakdown_csv, write_roster_csv};
use curricle_store::config::{create_store, load_config_from};

pub async fn execute(
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    debug!(store = ?config.store, "building roster snapshot");

    let (curriculum, _exams) = parser::load_course_data(&config.curriculum, &config.exam_bank)?;
    let store = create_store(&config.store)?;

    let engine = CourseEngine::new(
        Arc::new(curriculum),
        Arc::from(store),
        config.engine_config(),
    );
    let report = engine.build_roster().await?;

    super::print_roster(&report);

    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "csv"]
    } else {
        format.split(',').collect()
    };
    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output_dir.join(format!("roster-{timestamp}.json"));
                report.save_json(&path)?;
                println!("Roster report saved to: {}", path.display());
            }
            "csv" => {
                let roster_path = output_dir.join(format!("roster-{timestamp}.csv"));
                let breakdown_path = output_dir.join(format!("exam-breakdown-{timestamp}.csv"));
                write_roster_csv(&report, &roster_path)?;
                write_exam_breakdown_csv(&report, &breakdown_path)?;
                println!(
                    "CSV saved to: {} and {}",
                    roster_path.display(),
                    breakdown_path.display()
                );
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}
