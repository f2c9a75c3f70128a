//! The `curricle init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_absent("curricle.toml", SAMPLE_CONFIG)?;
    write_if_absent("curriculum.toml", SAMPLE_CURRICULUM)?;
    write_if_absent("exams.toml", SAMPLE_EXAM_BANK)?;

    println!("\nNext steps:");
    println!("  1. Edit curriculum.toml and exams.toml with your course content");
    println!("  2. Run: curricle validate --curriculum curriculum.toml --exams exams.toml");
    println!("  3. Run: curricle show --curriculum curriculum.toml");

    Ok(())
}

fn write_if_absent(name: &str, content: &str) -> Result<()> {
    if std::path::Path::new(name).exists() {
        println!("{name} already exists, skipping.");
    } else {
        std::fs::write(name, content)?;
        println!("Created {name}");
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# curricle configuration

default_passing_threshold = 50.0
roster_parallelism = 8
curriculum = "curriculum.toml"
exam_bank = "exams.toml"
output_dir = "./curricle-out"

[store]
type = "memory"

# To run against a live course backend, replace the store table with:
#
# [store]
# type = "rest"
# api_key = "${CURRICLE_API_KEY}"
# base_url = "http://localhost:3000"

[roles.regular]
entry_position = 0

[roles.pro]
entry_position = 6
"#;

const SAMPLE_CURRICULUM: &str = r#"# Course path, in file order. Position 0 is the first entry.
# Gate exams (pre_exam, final_exam) live in the exam bank only and are
# never scheduled here.

[[items]]
id = "intro"
kind = "lesson"
title = "Introduction"

[[items]]
id = "setup"
kind = "lesson"
title = "Environment Setup"

[[items]]
id = "basics-quiz"
kind = "exam"
category = "quiz"
title = "Basics Quiz"

[[items]]
id = "control-flow"
kind = "lesson"
title = "Control Flow"

[[items]]
id = "functions"
kind = "lesson"
title = "Functions"

[[items]]
id = "practice-lab"
kind = "exam"
category = "activity"
title = "Practice Lab"

[[items]]
id = "closing"
kind = "lesson"
title = "Wrapping Up"
"#;

const SAMPLE_EXAM_BANK: &str = r#"# Exam bank. Scheduled exams must match the category they carry on the
# path; gate exams are taken outside the path.

[[exams]]
id = "entry-check"
title = "Entry Check"
category = "pre_exam"
passing_threshold = 50.0

[[exams.questions]]
id = "q1"
text = "What does a variable bind?"

[[exams.questions.options]]
id = "a"
text = "A name to a value"
correct = true

[[exams.questions.options]]
id = "b"
text = "A file to a disk"

[[exams.questions]]
id = "q2"
text = "Which keyword declares a function?"

[[exams.questions.options]]
id = "a"
text = "let"

[[exams.questions.options]]
id = "b"
text = "fn"
correct = true

[[exams]]
id = "basics-quiz"
title = "Basics Quiz"
category = "quiz"

[[exams.questions]]
id = "q1"
text = "Which type holds true or false?"

[[exams.questions.options]]
id = "a"
text = "bool"
correct = true

[[exams.questions.options]]
id = "b"
text = "u8"

[[exams.questions]]
id = "q2"
text = "What does `let` introduce?"

[[exams.questions.options]]
id = "a"
text = "A loop"

[[exams.questions.options]]
id = "b"
text = "A binding"
correct = true

[[exams]]
id = "practice-lab"
title = "Practice Lab"
category = "activity"

[[exams.questions]]
id = "q1"
text = "Which line compiles?"

[[exams.questions.options]]
id = "a"
text = "let x = 1;"
correct = true

[[exams.questions.options]]
id = "b"
text = "x int = 1;"

[[exams]]
id = "final-exam"
title = "Final Exam"
category = "final_exam"

[[exams.questions]]
id = "q1"
text = "Which keyword makes a binding mutable?"

[[exams.questions.options]]
id = "a"
text = "mut"
correct = true

[[exams.questions.options]]
id = "b"
text = "var"

[[exams.questions]]
id = "q2"
text = "What does a function without a trailing expression return?"

[[exams.questions.options]]
id = "a"
text = "()"
correct = true

[[exams.questions.options]]
id = "b"
text = "null"
"#;
