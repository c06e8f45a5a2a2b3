use std::fs;
use std::path::PathBuf;

fn workflow() -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(".github")
        .join("workflows")
        .join("ci.yml");
    fs::read_to_string(path).expect("CI workflow is missing")
}

/// Top-level keys under `section:` (two-space indented), in order.
fn children(workflow: &str, section: &str) -> Vec<String> {
    workflow
        .lines()
        .skip_while(|line| *line != format!("{}:", section))
        .skip(1)
        .take_while(|line| line.is_empty() || line.starts_with(' '))
        .filter(|line| line.starts_with("  ") && !line.starts_with("   "))
        .map(|line| line.trim().trim_end_matches(':').to_string())
        .collect()
}

#[test]
fn test_triggers_on_main_only() {
    let workflow = workflow();
    assert_eq!(children(&workflow, "on"), vec!["push", "pull_request"]);
    assert_eq!(workflow.matches("branches: [main]").count(), 2);
}

#[test]
fn test_color_is_forced() {
    let workflow = workflow();
    assert_eq!(children(&workflow, "env"), vec!["CARGO_TERM_COLOR: always"]);
}

#[test]
fn test_defines_lints_and_tests_jobs() {
    let workflow = workflow();
    let jobs: Vec<_> = children(&workflow, "jobs")
        .into_iter()
        .filter(|key| !key.is_empty())
        .collect();
    assert_eq!(jobs, vec!["lints", "tests"]);
    assert!(!workflow.contains("needs:"));
}

#[test]
fn test_job_commands() {
    let workflow = workflow();
    let lints = workflow
        .split("  tests:")
        .next()
        .expect("lints job comes first");
    let fmt = lints.find("cargo fmt --all -- --check").unwrap();
    let clippy = lints.find("cargo clippy --workspace --verbose").unwrap();
    assert!(fmt < clippy);
    assert!(lints.contains("run 'cargo fmt --all' and commit the result"));

    let tests = workflow.split("  tests:").nth(1).expect("tests job");
    let test = tests.find("cargo test --workspace --verbose").unwrap();
    let doc = tests.find("cargo doc --workspace --verbose").unwrap();
    assert!(test < doc);
}
