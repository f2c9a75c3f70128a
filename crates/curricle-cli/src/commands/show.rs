//! The `curricle show` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

pub fn execute(curriculum_path: PathBuf) -> Result<()> {
    let curriculum = curricle_core::parser::parse_curriculum(&curriculum_path)?;

    let mut table = Table::new();
    table.set_header(vec!["Pos", "Kind", "Id", "Title", "Category", "Next"]);

    for item in curriculum.items() {
        let category = item
            .exam_category
            .map(|c| c.to_string())
            .unwrap_or_default();
        let next = item
            .override_next_position
            .map(|p| p.to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(item.position),
            Cell::new(item.kind),
            Cell::new(&item.id),
            Cell::new(&item.title),
            Cell::new(category),
            Cell::new(next),
        ]);
    }

    println!("{table}");
    println!(
        "{} items: {} lessons, {} exams",
        curriculum.len(),
        curriculum.lesson_count(),
        curriculum.len() - curriculum.lesson_count()
    );

    Ok(())
}
