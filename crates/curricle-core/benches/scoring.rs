use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chrono::Utc;
use curricle_core::curriculum::CurriculumIndex;
use curricle_core::model::{
    AnswerOption, CurriculumItem, Exam, ExamCategory, Learner, LearnerProgress, Question, Role,
    Submission,
};
use curricle_core::roster::{compute_course_stats, RosterEntry};
use curricle_core::scoring::score_exam;
use uuid::Uuid;

fn make_exam(questions: usize) -> Exam {
    Exam {
        id: "bench".into(),
        title: "Benchmark".into(),
        category: None,
        passing_threshold: None,
        questions: (0..questions)
            .map(|q| Question {
                id: format!("q{q}"),
                text: format!("Question {q}"),
                options: (0..4)
                    .map(|o| AnswerOption {
                        id: format!("q{q}-o{o}"),
                        text: format!("Option {o}"),
                        is_correct: o == q % 4,
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn make_answers(exam: &Exam, correct: bool) -> BTreeMap<String, String> {
    exam.questions
        .iter()
        .map(|q| {
            let pick = if correct {
                q.options.iter().find(|o| o.is_correct)
            } else {
                q.options.iter().find(|o| !o.is_correct)
            };
            (q.id.clone(), pick.map(|o| o.id.clone()).unwrap_or_default())
        })
        .collect()
}

fn bench_score_exam(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_exam");

    for size in [5usize, 50, 200] {
        let exam = make_exam(size);
        let full_marks = make_answers(&exam, true);
        let zero_marks = make_answers(&exam, false);

        group.bench_function(format!("{size}_questions_all_correct"), |b| {
            b.iter(|| score_exam(black_box(&exam), black_box(&full_marks), black_box(50.0)))
        });
        group.bench_function(format!("{size}_questions_all_wrong"), |b| {
            b.iter(|| score_exam(black_box(&exam), black_box(&zero_marks), black_box(50.0)))
        });
    }

    group.finish();
}

fn bench_course_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("course_stats");

    let curriculum = CurriculumIndex::new(vec![
        CurriculumItem::lesson("intro", 0, "Intro"),
        CurriculumItem::exam("quiz-1", 1, "Quiz 1", ExamCategory::Quiz),
        CurriculumItem::lesson("wrap", 2, "Wrap"),
        CurriculumItem::exam("quiz-2", 3, "Quiz 2", ExamCategory::Quiz),
    ])
    .unwrap();

    for cohort in [10usize, 100] {
        let entries: Vec<RosterEntry> = (0..cohort)
            .map(|i| {
                let learner = Learner {
                    id: format!("learner-{i}"),
                    name: format!("Learner {i}"),
                    email: format!("learner{i}@example.com"),
                    role: Role::Regular,
                };
                let mut progress = LearnerProgress::new();
                progress.current_position = Some(i % 4);
                let submissions = vec![Submission {
                    id: Uuid::new_v4(),
                    learner_id: learner.id.clone(),
                    exam_id: "quiz-1".into(),
                    category: ExamCategory::Quiz,
                    answers: BTreeMap::new(),
                    score: (i % 101) as f64,
                    total_questions: 10,
                    correct_answers: i % 11,
                    passing_threshold: 50.0,
                    passed: i % 101 >= 50,
                    submitted_at: Utc::now(),
                }];
                RosterEntry::build(&curriculum, learner, progress, submissions)
            })
            .collect();

        group.bench_function(format!("{cohort}_learners"), |b| {
            b.iter(|| compute_course_stats(black_box(&entries)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_score_exam, bench_course_stats);
criterion_main!(benches);
