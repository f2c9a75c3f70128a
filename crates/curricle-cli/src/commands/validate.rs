//! The `curricle validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(curriculum_path: PathBuf, bank_path: PathBuf, strict: bool) -> Result<()> {
    let (curriculum, exams) =
        curricle_core::parser::load_course_data(&curriculum_path, &bank_path)?;

    println!(
        "Curriculum: {} items ({} lessons), exam bank: {} exams",
        curriculum.len(),
        curriculum.lesson_count(),
        exams.len()
    );

    let warnings = curricle_core::parser::validate_course(&curriculum, &exams);
    for w in &warnings {
        let prefix = w
            .item_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Course data valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
        if strict {
            anyhow::bail!("{} warning(s) in strict mode", warnings.len());
        }
    }

    Ok(())
}
