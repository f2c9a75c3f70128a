//! TOML curriculum and exam-bank parsing.
//!
//! The curriculum is data, not code: a `[[items]]` list whose file order is
//! the path order, plus a separate exam bank holding the full question sets.
//! Loading is strict about structure (an exam item must name its category)
//! and lenient about content; `validate_course` reports the suspicious rest.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::curriculum::CurriculumIndex;
use crate::model::{AnswerOption, CurriculumItem, Exam, ExamCategory, ItemKind, Question};

/// Intermediate TOML structure for curriculum files.
#[derive(Debug, Deserialize)]
struct TomlCurriculumFile {
    #[serde(default)]
    items: Vec<TomlItem>,
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    id: String,
    kind: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    category: Option<String>,
    /// Explicit advance target for branch/skip exams.
    #[serde(default)]
    next_position: Option<usize>,
}

/// Intermediate TOML structure for exam-bank files.
#[derive(Debug, Deserialize)]
struct TomlExamBank {
    #[serde(default)]
    exams: Vec<TomlExam>,
}

#[derive(Debug, Deserialize)]
struct TomlExam {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    passing_threshold: Option<f64>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    text: String,
    #[serde(default)]
    options: Vec<TomlOption>,
}

#[derive(Debug, Deserialize)]
struct TomlOption {
    id: String,
    text: String,
    #[serde(default)]
    correct: bool,
}

/// Parse a curriculum file into a [`CurriculumIndex`].
pub fn parse_curriculum(path: &Path) -> Result<CurriculumIndex> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read curriculum file: {}", path.display()))?;
    parse_curriculum_str(&content, path)
}

/// Parse a curriculum TOML string (useful for testing).
///
/// Positions are assigned from file order. Exam items must carry a
/// `category`; a `category` on a lesson is kept so validation can flag it.
pub fn parse_curriculum_str(content: &str, source_path: &Path) -> Result<CurriculumIndex> {
    let parsed: TomlCurriculumFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let items = parsed
        .items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            let kind: ItemKind = item
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("item '{}': {}", item.id, e))?;

            let category = item
                .category
                .map(|c| {
                    c.parse::<ExamCategory>()
                        .map_err(|e: String| anyhow::anyhow!("item '{}': {}", item.id, e))
                })
                .transpose()?;

            if kind == ItemKind::Exam && category.is_none() {
                bail!("exam item '{}' is missing a category", item.id);
            }

            Ok(CurriculumItem {
                id: item.id,
                kind,
                position,
                title: item.title,
                exam_category: category,
                override_next_position: item.next_position,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    CurriculumIndex::new(items)
        .with_context(|| format!("invalid curriculum: {}", source_path.display()))
}

/// Parse an exam-bank file into its exam definitions.
pub fn parse_exam_bank(path: &Path) -> Result<Vec<Exam>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam bank file: {}", path.display()))?;
    parse_exam_bank_str(&content, path)
}

/// Parse an exam-bank TOML string (useful for testing).
pub fn parse_exam_bank_str(content: &str, source_path: &Path) -> Result<Vec<Exam>> {
    let parsed: TomlExamBank = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mut seen = std::collections::HashSet::new();
    let exams = parsed
        .exams
        .into_iter()
        .map(|exam| {
            if !seen.insert(exam.id.clone()) {
                bail!("duplicate exam id '{}' in exam bank", exam.id);
            }
            let category = exam
                .category
                .map(|c| {
                    c.parse::<ExamCategory>()
                        .map_err(|e: String| anyhow::anyhow!("exam '{}': {}", exam.id, e))
                })
                .transpose()?;
            Ok(Exam {
                id: exam.id,
                title: exam.title,
                category,
                passing_threshold: exam.passing_threshold,
                questions: exam
                    .questions
                    .into_iter()
                    .map(|q| Question {
                        id: q.id,
                        text: q.text,
                        options: q
                            .options
                            .into_iter()
                            .map(|o| AnswerOption {
                                id: o.id,
                                text: o.text,
                                is_correct: o.correct,
                            })
                            .collect(),
                    })
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(exams)
}

/// Load a curriculum and its exam bank together.
pub fn load_course_data(
    curriculum_path: &Path,
    bank_path: &Path,
) -> Result<(CurriculumIndex, Vec<Exam>)> {
    let curriculum = parse_curriculum(curriculum_path)?;
    let exams = parse_exam_bank(bank_path)?;
    Ok((curriculum, exams))
}

/// A warning from course validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item or exam id (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(item_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item_id: Some(item_id.into()),
            message: message.into(),
        }
    }
}

/// Validate a curriculum against its exam bank for common issues.
///
/// These are warnings, not errors: the engine runs fine with all of them,
/// but each one usually means the curriculum author made a mistake.
pub fn validate_course(curriculum: &CurriculumIndex, exams: &[Exam]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if curriculum.is_empty() {
        warnings.push(ValidationWarning {
            item_id: None,
            message: "curriculum has no items".into(),
        });
    }

    // Structural oddities on the path itself
    for item in curriculum.items() {
        if item.kind == ItemKind::Lesson {
            if item.exam_category.is_some() {
                warnings.push(ValidationWarning::new(
                    &item.id,
                    "lesson carries an exam category, which has no effect",
                ));
            }
            if item.override_next_position.is_some() {
                warnings.push(ValidationWarning::new(
                    &item.id,
                    "lesson carries next_position, which has no effect",
                ));
            }
        }
        if item.exam_category.is_some_and(ExamCategory::is_gate) {
            warnings.push(ValidationWarning::new(
                &item.id,
                "gate exams are taken outside the path; scheduling one shifts every later position",
            ));
        }
        if let Some(target) = item.override_next_position {
            if target >= curriculum.len() {
                warnings.push(ValidationWarning::new(
                    &item.id,
                    format!(
                        "next_position {target} points past the end of the path and behaves like path end"
                    ),
                ));
            } else if target <= item.position {
                warnings.push(ValidationWarning::new(
                    &item.id,
                    format!(
                        "next_position {target} does not point forward and will never advance anyone"
                    ),
                ));
            }
        }
    }

    // Cross-check the path against the bank
    let bank: std::collections::HashMap<&str, &Exam> =
        exams.iter().map(|e| (e.id.as_str(), e)).collect();
    for item in curriculum.exams() {
        match bank.get(item.id.as_str()) {
            None => warnings.push(ValidationWarning::new(
                &item.id,
                "exam is scheduled but has no definition in the exam bank",
            )),
            Some(exam) => {
                if exam.category.is_some() && exam.category != item.exam_category {
                    warnings.push(ValidationWarning::new(
                        &item.id,
                        "exam is scheduled under a different category than its bank definition",
                    ));
                }
            }
        }
    }

    // Bank content
    if !exams.iter().any(|e| e.category == Some(ExamCategory::PreExam)) {
        warnings.push(ValidationWarning {
            item_id: None,
            message: "bank defines no pre-exam; learners cannot enter the course".into(),
        });
    }
    if !exams.iter().any(|e| e.category == Some(ExamCategory::FinalExam)) {
        warnings.push(ValidationWarning {
            item_id: None,
            message: "bank defines no final exam; the course cannot be completed".into(),
        });
    }
    for exam in exams {
        let gate = exam.category.is_some_and(ExamCategory::is_gate);
        if !gate && curriculum.position_of(&exam.id, ItemKind::Exam).is_none() {
            warnings.push(ValidationWarning::new(
                &exam.id,
                "exam is defined in the bank but never scheduled",
            ));
        }
        if exam.questions.is_empty() {
            warnings.push(ValidationWarning::new(
                &exam.id,
                "exam has no questions; submissions will fail",
            ));
        }
        for question in &exam.questions {
            let correct = question.options.iter().filter(|o| o.is_correct).count();
            if correct == 0 {
                warnings.push(ValidationWarning::new(
                    &exam.id,
                    format!("question '{}' has no correct option", question.id),
                ));
            } else if correct > 1 {
                warnings.push(ValidationWarning::new(
                    &exam.id,
                    format!(
                        "question '{}' marks {correct} options correct; grading keys on the first",
                        question.id
                    ),
                ));
            }
        }
    }

    warnings
}
