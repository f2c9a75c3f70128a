use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_curriculum_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("curriculum_parsing");

    let small_toml = generate_curriculum_toml(5);
    let medium_toml = generate_curriculum_toml(50);
    let large_toml = generate_curriculum_toml(200);

    group.bench_function("5_items", |b| {
        b.iter(|| {
            curricle_core::parser::parse_curriculum_str(
                black_box(&small_toml),
                black_box("bench.toml".as_ref()),
            )
        })
    });

    group.bench_function("50_items", |b| {
        b.iter(|| {
            curricle_core::parser::parse_curriculum_str(
                black_box(&medium_toml),
                black_box("bench.toml".as_ref()),
            )
        })
    });

    group.bench_function("200_items", |b| {
        b.iter(|| {
            curricle_core::parser::parse_curriculum_str(
                black_box(&large_toml),
                black_box("bench.toml".as_ref()),
            )
        })
    });

    group.finish();
}

fn bench_exam_bank_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("exam_bank_parsing");

    let small_toml = generate_bank_toml(5);
    let large_toml = generate_bank_toml(50);

    group.bench_function("5_exams", |b| {
        b.iter(|| {
            curricle_core::parser::parse_exam_bank_str(
                black_box(&small_toml),
                black_box("bank.toml".as_ref()),
            )
        })
    });

    group.bench_function("50_exams", |b| {
        b.iter(|| {
            curricle_core::parser::parse_exam_bank_str(
                black_box(&large_toml),
                black_box("bank.toml".as_ref()),
            )
        })
    });

    group.finish();
}

fn generate_curriculum_toml(n: usize) -> String {
    let mut s = String::new();
    for i in 0..n {
        s.push_str(&format!(
            r#"[[items]]
id = "lesson-{i}"
kind = "lesson"
title = "Lesson {i}"

[[items]]
id = "quiz-{i}"
kind = "exam"
title = "Quiz {i}"
category = "quiz"

"#
        ));
    }
    s
}

fn generate_bank_toml(n: usize) -> String {
    let mut s = String::new();
    for i in 0..n {
        s.push_str(&format!(
            r#"[[exams]]
id = "quiz-{i}"
title = "Quiz {i}"
category = "quiz"

[[exams.questions]]
id = "q1"
text = "Pick the first option"

[[exams.questions.options]]
id = "a"
text = "First"
correct = true

[[exams.questions.options]]
id = "b"
text = "Second"

[[exams.questions]]
id = "q2"
text = "Pick the second option"

[[exams.questions.options]]
id = "a"
text = "First"

[[exams.questions.options]]
id = "b"
text = "Second"
correct = true

"#
        ));
    }
    s
}

criterion_group!(benches, bench_curriculum_parsing, bench_exam_bank_parsing);
criterion_main!(benches);
