//! The ordered curriculum catalog.
//!
//! A [`CurriculumIndex`] is built once at startup from the curriculum
//! definition and is immutable afterwards; it is safe to share across any
//! number of request handlers. All progress and eligibility rules reduce to
//! position lookups against it.

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::model::{CurriculumItem, ItemKind};

/// Read-only position index over the single global learning path.
///
/// Ids are unique per kind, not globally, so the index keeps one id map per
/// kind and every lookup takes the kind alongside the id.
#[derive(Debug, Clone)]
pub struct CurriculumIndex {
    items: Vec<CurriculumItem>,
    lessons: HashMap<String, usize>,
    exams: HashMap<String, usize>,
}

impl CurriculumIndex {
    /// Builds the index from items in path order.
    ///
    /// Fails when an item's `position` disagrees with its index in the list
    /// or when two items of the same kind share an id.
    pub fn new(items: Vec<CurriculumItem>) -> Result<Self> {
        let mut lessons = HashMap::new();
        let mut exams = HashMap::new();

        for (idx, item) in items.iter().enumerate() {
            if item.position != idx {
                bail!(
                    "curriculum item '{}' has position {} but sits at index {}",
                    item.id,
                    item.position,
                    idx
                );
            }
            let map = match item.kind {
                ItemKind::Lesson => &mut lessons,
                ItemKind::Exam => &mut exams,
            };
            if map.insert(item.id.clone(), idx).is_some() {
                bail!("duplicate {} id '{}' in curriculum", item.kind, item.id);
            }
        }

        Ok(Self {
            items,
            lessons,
            exams,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in path order.
    pub fn items(&self) -> &[CurriculumItem] {
        &self.items
    }

    /// Exam items in path order.
    pub fn exams(&self) -> impl Iterator<Item = &CurriculumItem> {
        self.items.iter().filter(|i| i.kind == ItemKind::Exam)
    }

    /// Position of `(id, kind)`, or `None` when no such item exists.
    pub fn position_of(&self, id: &str, kind: ItemKind) -> Option<usize> {
        self.id_map(kind).get(id).copied()
    }

    /// The position after `(id, kind)`, or `None` when the item is unknown
    /// or is the last one on the path.
    pub fn next_position_of(&self, id: &str, kind: ItemKind) -> Option<usize> {
        let next = self.position_of(id, kind)? + 1;
        (next < self.items.len()).then_some(next)
    }

    /// Item occupying `position`.
    pub fn item_at(&self, position: usize) -> Option<&CurriculumItem> {
        self.items.get(position)
    }

    /// Item with the given id and kind.
    pub fn item(&self, id: &str, kind: ItemKind) -> Option<&CurriculumItem> {
        self.position_of(id, kind).and_then(|p| self.item_at(p))
    }

    /// Where passing the exam lands the learner: the exam's override target
    /// when it has one, otherwise the next position on the path. `None`
    /// means the path ends here (an override pointing past the end behaves
    /// like running off the end).
    pub fn resolve_advance_target(&self, exam_id: &str) -> Option<usize> {
        let exam = self.item(exam_id, ItemKind::Exam)?;
        match exam.override_next_position {
            Some(target) if target < self.items.len() => Some(target),
            Some(_) => None,
            None => self.next_position_of(exam_id, ItemKind::Exam),
        }
    }

    /// How many lessons sit at positions strictly below `position`.
    pub fn lesson_count_before(&self, position: usize) -> usize {
        self.items
            .iter()
            .take(position.min(self.items.len()))
            .filter(|i| i.kind == ItemKind::Lesson)
            .count()
    }

    /// Total number of lessons on the path.
    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }

    fn id_map(&self, kind: ItemKind) -> &HashMap<String, usize> {
        match kind {
            ItemKind::Lesson => &self.lessons,
            ItemKind::Exam => &self.exams,
        }
    }
}
