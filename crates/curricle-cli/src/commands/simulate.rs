//! The `curricle simulate` command.
//!
//! Replays a scripted cohort session through the engine on an in-memory
//! store. Eligibility denials and duplicate submissions are part of what a
//! script exercises, so they show up in the trace instead of aborting it.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use curricle_core::engine::CourseEngine;
use curricle_core::model::{ExamCategory, Learner, LearnerProgress, Role};
use curricle_core::parser;
use curricle_core::traits::{ExamView, Principal, SubmitRequest};
use curricle_report::csv::{write_exam_breakdown_csv, write_roster_csv};
use curricle_store::config::load_config_from;
use curricle_store::MemoryStore;

/// A scripted cohort session.
#[derive(Debug, Deserialize)]
struct SessionScript {
    session: SessionHeader,
    #[serde(default)]
    learners: Vec<ScriptLearner>,
    #[serde(default)]
    actions: Vec<ScriptAction>,
}

#[derive(Debug, Deserialize)]
struct SessionHeader {
    #[serde(default)]
    name: String,
    /// Curriculum TOML, relative to the script file.
    curriculum: PathBuf,
    /// Exam-bank TOML, relative to the script file.
    exams: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ScriptLearner {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    role: Role,
}

/// One scripted step, applied in file order.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ScriptAction {
    ViewLesson {
        learner: String,
        lesson: String,
    },
    ViewExam {
        learner: String,
        exam: String,
        category: ExamCategory,
    },
    SubmitExam {
        learner: String,
        exam: String,
        category: ExamCategory,
        #[serde(default)]
        answers: BTreeMap<String, String>,
    },
}

pub async fn execute(
    script_path: PathBuf,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let content = std::fs::read_to_string(&script_path)
        .with_context(|| format!("failed to read session script: {}", script_path.display()))?;
    let script: SessionScript = toml::from_str(&content)
        .with_context(|| format!("failed to parse session script: {}", script_path.display()))?;

    // Course data paths resolve relative to the script file.
    let base = script_path.parent().unwrap_or_else(|| Path::new("."));
    let (curriculum, exams) = parser::load_course_data(
        &base.join(&script.session.curriculum),
        &base.join(&script.session.exams),
    )?;

    let config = load_config_from(config_path.as_deref())?;

    let mut store = MemoryStore::new();
    for learner in &script.learners {
        store = store.with_learner(Learner {
            id: learner.id.clone(),
            name: learner.name.clone(),
            email: learner.email.clone(),
            role: learner.role,
        });
    }
    for exam in exams {
        store = store.with_exam(exam);
    }

    let roles: HashMap<&str, Role> = script
        .learners
        .iter()
        .map(|l| (l.id.as_str(), l.role))
        .collect();

    let engine = CourseEngine::new(
        Arc::new(curriculum),
        Arc::new(store),
        config.engine_config(),
    );
    debug!(
        learners = script.learners.len(),
        actions = script.actions.len(),
        "session script loaded"
    );

    if !script.session.name.is_empty() {
        println!(
            "Session: {} ({} learners, {} actions)",
            script.session.name,
            script.learners.len(),
            script.actions.len()
        );
    }

    let total = script.actions.len();
    let mut ok = 0usize;
    for (index, action) in script.actions.iter().enumerate() {
        let (succeeded, line) = apply_action(&engine, &roles, action).await?;
        if succeeded {
            ok += 1;
        }
        println!("[{}] {line}", index + 1);
    }
    println!("\nReplayed {total} actions: {ok} ok, {} denied or failed", total - ok);

    let report = engine.build_roster().await?;
    super::print_roster(&report);

    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
    let formats: Vec<&str> = if format == "all" {
        vec!["json", "csv"]
    } else {
        format.split(',').collect()
    };
    for fmt in &formats {
        match *fmt {
            "table" => {}
            "json" => {
                let path = output_dir.join("roster-report.json");
                report.save_json(&path)?;
                println!("Roster report saved to: {}", path.display());
            }
            "csv" => {
                let roster_path = output_dir.join("roster.csv");
                let breakdown_path = output_dir.join("exam-breakdown.csv");
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

/// Runs one scripted action, returning whether it succeeded and the trace
/// line to print. Engine errors become trace lines; an unknown learner id is
/// a script bug and aborts.
async fn apply_action(
    engine: &CourseEngine,
    roles: &HashMap<&str, Role>,
    action: &ScriptAction,
) -> Result<(bool, String)> {
    let line = match action {
        ScriptAction::ViewLesson { learner, lesson } => {
            let principal = principal_for(roles, learner)?;
            match engine.view_lesson(&principal, lesson).await {
                Ok(view) if view.progress_updated && view.progress.final_exam_unlocked => (
                    true,
                    format!("{learner} viewed lesson '{lesson}', final exam unlocked"),
                ),
                Ok(view) if view.progress_updated => (
                    true,
                    format!(
                        "{learner} viewed lesson '{lesson}', advanced to position {}",
                        position_label(view.progress.current_position)
                    ),
                ),
                Ok(_) => (true, format!("{learner} viewed lesson '{lesson}'")),
                Err(e) => (false, format!("{learner} view lesson '{lesson}': {e}")),
            }
        }
        ScriptAction::ViewExam {
            learner,
            exam,
            category,
        } => {
            let principal = principal_for(roles, learner)?;
            match engine.view_exam(&principal, exam, *category).await {
                Ok(ExamView::Open { sheet }) => (
                    true,
                    format!(
                        "{learner} opened exam '{exam}' ({} questions)",
                        sheet.total_questions
                    ),
                ),
                Ok(ExamView::AlreadySubmitted { submission }) => (
                    true,
                    format!(
                        "{learner} opened exam '{exam}': already submitted, score {:.2}",
                        submission.score
                    ),
                ),
                Err(e) => (false, format!("{learner} open exam '{exam}': {e}")),
            }
        }
        ScriptAction::SubmitExam {
            learner,
            exam,
            category,
            answers,
        } => {
            let principal = principal_for(roles, learner)?;
            let request = SubmitRequest {
                exam_id: exam.clone(),
                category: *category,
                answers: answers.clone(),
            };
            match engine.submit_exam(&principal, &request).await {
                Ok(outcome) => {
                    let verdict = if outcome.submission.passed { "PASS" } else { "FAIL" };
                    let moved = progress_note(*category, &outcome.progress, outcome.progress_updated);
                    (
                        true,
                        format!(
                            "{learner} submitted '{exam}' ({category}): {:.2} {verdict}{moved}",
                            outcome.submission.score
                        ),
                    )
                }
                Err(e) => (false, format!("{learner} submit '{exam}' ({category}): {e}")),
            }
        }
    };
    Ok(line)
}

fn principal_for(roles: &HashMap<&str, Role>, learner: &str) -> Result<Principal> {
    let role = roles
        .get(learner)
        .copied()
        .with_context(|| format!("action names unknown learner '{learner}'"))?;
    Ok(Principal::new(learner, role))
}

fn progress_note(category: ExamCategory, progress: &LearnerProgress, updated: bool) -> String {
    if !updated {
        return String::new();
    }
    if progress.course_completed {
        ", course completed".into()
    } else if category == ExamCategory::PreExam {
        format!(
            ", entered at position {}",
            position_label(progress.current_position)
        )
    } else if progress.final_exam_unlocked {
        ", final exam unlocked".into()
    } else {
        format!(
            ", advanced to position {}",
            position_label(progress.current_position)
        )
    }
}

fn position_label(position: Option<usize>) -> String {
    match position {
        Some(p) => p.to_string(),
        None => "-".into(),
    }
}
