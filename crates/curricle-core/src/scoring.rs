//! Exam grading.
//!
//! Grading walks the exam's question list, never the submitted answer list:
//! a question the learner skipped counts as incorrect, and answer entries
//! for unknown question ids are ignored rather than rejected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::Exam;

/// One graded question in a detailed review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionReview {
    pub question_id: String,
    pub question_text: String,
    /// All options with the answer key included; only ever shown after a
    /// submission exists.
    pub options: Vec<ReviewOption>,
    /// What the learner picked; `None` when the question was skipped.
    pub submitted_option_id: Option<String>,
    pub correct: bool,
}

/// An option as rendered in a review, answer key included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

/// Result of grading one answer set against one exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Percentage in `[0, 100]`, rounded to two decimals.
    pub score: f64,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub passing_threshold: f64,
    pub passed: bool,
    pub review: Vec<QuestionReview>,
}

/// Grades `answers` against `exam`.
///
/// A question is correct iff the submitted option id equals the id of the
/// first option flagged correct (a malformed question with several flags
/// keys on the first; one with none can never be answered correctly). An
/// empty exam scores 0 rather than dividing by zero.
pub fn score_exam(
    exam: &Exam,
    answers: &BTreeMap<String, String>,
    passing_threshold: f64,
) -> ScoreReport {
    let mut correct_answers = 0;
    let mut review = Vec::with_capacity(exam.questions.len());

    for question in &exam.questions {
        let submitted = answers.get(&question.id);
        let key = question.options.iter().find(|o| o.is_correct);
        let correct = match (submitted, key) {
            (Some(chosen), Some(key)) => chosen == &key.id,
            _ => false,
        };
        if correct {
            correct_answers += 1;
        }
        review.push(QuestionReview {
            question_id: question.id.clone(),
            question_text: question.text.clone(),
            options: question
                .options
                .iter()
                .map(|o| ReviewOption {
                    id: o.id.clone(),
                    text: o.text.clone(),
                    is_correct: o.is_correct,
                })
                .collect(),
            submitted_option_id: submitted.cloned(),
            correct,
        });
    }

    let total_questions = exam.questions.len();
    let score = if total_questions == 0 {
        0.0
    } else {
        round2(100.0 * correct_answers as f64 / total_questions as f64)
    };

    ScoreReport {
        score,
        total_questions,
        correct_answers,
        passing_threshold,
        passed: score >= passing_threshold,
        review,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerOption, Question};

    fn option(id: &str, is_correct: bool) -> AnswerOption {
        AnswerOption {
            id: id.into(),
            text: format!("option {id}"),
            is_correct,
        }
    }

    fn make_exam(questions: usize) -> Exam {
        Exam {
            id: "e1".into(),
            title: "Test exam".into(),
            category: None,
            passing_threshold: None,
            questions: (0..questions)
                .map(|i| Question {
                    id: format!("q{i}"),
                    text: format!("question {i}"),
                    options: vec![option("a", false), option("b", true), option("c", false)],
                })
                .collect(),
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(q, o)| (q.to_string(), o.to_string()))
            .collect()
    }

    #[test]
    fn half_right_meets_a_fifty_percent_threshold() {
        let exam = make_exam(4);
        let report = score_exam(
            &exam,
            &answers(&[("q0", "b"), ("q1", "b"), ("q2", "a"), ("q3", "c")]),
            50.0,
        );
        assert_eq!(report.score, 50.0);
        assert_eq!(report.correct_answers, 2);
        assert_eq!(report.total_questions, 4);
        assert!(report.passed);
    }

    #[test]
    fn perfect_answers_score_one_hundred() {
        let exam = make_exam(3);
        let report = score_exam(
            &exam,
            &answers(&[("q0", "b"), ("q1", "b"), ("q2", "b")]),
            60.0,
        );
        assert_eq!(report.score, 100.0);
        assert!(report.passed);
    }

    #[test]
    fn empty_answers_score_zero() {
        let exam = make_exam(3);
        let report = score_exam(&exam, &BTreeMap::new(), 50.0);
        assert_eq!(report.score, 0.0);
        assert!(!report.passed);
        // Every question still appears in the review, marked skipped.
        assert_eq!(report.review.len(), 3);
        assert!(report.review.iter().all(|r| r.submitted_option_id.is_none()));
    }

    #[test]
    fn unknown_question_ids_are_ignored() {
        let exam = make_exam(2);
        let report = score_exam(
            &exam,
            &answers(&[("q0", "b"), ("q1", "b"), ("ghost", "b")]),
            50.0,
        );
        assert_eq!(report.score, 100.0);
        assert_eq!(report.review.len(), 2);
    }

    #[test]
    fn first_flagged_option_is_the_key() {
        let exam = Exam {
            id: "e1".into(),
            title: String::new(),
            category: None,
            passing_threshold: None,
            questions: vec![Question {
                id: "q0".into(),
                text: "doubly keyed".into(),
                options: vec![option("a", true), option("b", true)],
            }],
        };
        assert_eq!(score_exam(&exam, &answers(&[("q0", "a")]), 50.0).score, 100.0);
        assert_eq!(score_exam(&exam, &answers(&[("q0", "b")]), 50.0).score, 0.0);
    }

    #[test]
    fn question_without_a_key_is_never_correct() {
        let exam = Exam {
            id: "e1".into(),
            title: String::new(),
            category: None,
            passing_threshold: None,
            questions: vec![Question {
                id: "q0".into(),
                text: "keyless".into(),
                options: vec![option("a", false), option("b", false)],
            }],
        };
        let report = score_exam(&exam, &answers(&[("q0", "a")]), 50.0);
        assert_eq!(report.score, 0.0);
        assert!(!report.review[0].correct);
    }

    #[test]
    fn zero_questions_score_zero_without_panicking() {
        let exam = make_exam(0);
        let report = score_exam(&exam, &BTreeMap::new(), 50.0);
        assert_eq!(report.score, 0.0);
        assert!(!report.passed);

        // An ungraded activity has threshold 0, so even an empty sheet passes.
        let report = score_exam(&exam, &BTreeMap::new(), 0.0);
        assert!(report.passed);
    }

    #[test]
    fn scores_round_to_two_decimals() {
        let exam = make_exam(3);
        let report = score_exam(&exam, &answers(&[("q0", "b")]), 50.0);
        assert_eq!(report.score, 33.33);
        assert!(!report.passed);
        assert!(report.score >= 0.0 && report.score <= 100.0);
    }

    #[test]
    fn review_marks_each_answer() {
        let exam = make_exam(2);
        let report = score_exam(&exam, &answers(&[("q0", "b"), ("q1", "a")]), 50.0);
        assert!(report.review[0].correct);
        assert_eq!(report.review[0].submitted_option_id.as_deref(), Some("b"));
        assert!(!report.review[1].correct);
        assert_eq!(report.review[1].submitted_option_id.as_deref(), Some("a"));
    }
}
