#[cfg(test)]
extern crate assert_cmd;
extern crate predicates;

use assert_cmd::Command;
use predicates::prelude::*;

use std::fs;

const HELLO: &str = r#"
/* print a greeting */
main() {
    extrn putchar;
    auto c;
    c = 'hi*n';
    putchar(c);
}
"#;

fn badc() -> Command {
    let mut cmd = Command::cargo_bin("badc").expect("Calling binary failed");
    cmd.env_remove("BADC_WORD_SIZE")
        .env_remove("BADC_VERBOSITY")
        .env_remove("BADC_LOG_LEVEL")
        .env_remove("BADC_DEBUG");
    cmd
}

#[test]
fn test_cli() {
    badc().assert().failure();
}

#[test]
fn test_version() {
    let expected_version = "badc 0.1.0\n";
    badc().arg("--version").assert().stdout(expected_version);
}

#[test]
fn test_compile_prints_symbols() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hello.b");
    fs::write(&input, HELLO).unwrap();

    badc()
        .arg("compile")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""name": "main""#))
        .stdout(predicate::str::contains(r#""putchar""#));
}

#[test]
fn test_compile_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hello.b");
    let output = dir.path().join("hello.txt");
    fs::write(&input, HELLO).unwrap();

    badc()
        .args(["compile", "--format", "text", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let table = fs::read_to_string(output).unwrap();
    assert!(table.contains("function"));
}

#[test]
fn test_compile_output_file_holds_the_whole_table() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hello.b");
    let output = dir.path().join("hello.json");
    fs::write(&input, HELLO).unwrap();

    badc()
        .arg("compile")
        .arg("-o")
        .arg(&output)
        .arg(&input)
        .assert()
        .success();

    let json = fs::read_to_string(output).unwrap();
    assert!(json.starts_with('{'), "{:?}", json);
    assert!(json.ends_with("}\n"), "{:?}", json);
    assert!(json.contains(r#""name": "main""#));
}

#[test]
fn test_compile_from_stdin() {
    badc()
        .args(["compile", "--print-ast", "-"])
        .write_stdin("v[2] 1, 2;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("program <stdin>"))
        .stdout(predicate::str::contains("global v [1:1]"));
}

#[test]
fn test_compile_errors_fail() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.b");
    fs::write(&input, "main() { x = 1; }").unwrap();

    badc()
        .arg("compile")
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "B0-0301 - Undeclared name: `x` is not declared in `main`",
        ))
        .stderr(predicate::str::contains(
            "Error: could not compile",
        ));
}

#[test]
fn test_unterminated_comment_is_reported() {
    badc()
        .args(["compile", "-"])
        .write_stdin("main() ;\n/* never closed")
        .assert()
        .failure()
        .stderr(predicate::str::contains("B0-0101 - Unterminated comment"));
}

#[test]
fn test_deep_nesting_is_a_diagnostic() {
    let source = format!("f() return {}x{};", "(".repeat(1000), ")".repeat(1000));
    badc()
        .args(["compile", "-"])
        .write_stdin(source)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("B0-0203 - Nesting too deep"));
}

#[test]
fn test_compile_missing_file() {
    badc()
        .args(["compile", "does-not-exist.b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("B0-0000 - Missing file"));
}

#[test]
fn test_compile_many_keeps_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.b");
    let second = dir.path().join("second.b");
    fs::write(&first, "alpha;").unwrap();
    fs::write(&second, "beta;").unwrap();

    let output = badc()
        .arg("compile")
        .arg(&first)
        .arg(&second)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let alpha = stdout.find("alpha").unwrap();
    let beta = stdout.find("beta").unwrap();
    assert!(alpha < beta);
}

#[test]
fn test_check_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.b"), HELLO).unwrap();
    fs::write(dir.path().join("b.b"), "n 10;").unwrap();
    fs::write(dir.path().join("readme.txt"), "not a program").unwrap();

    badc()
        .arg("check")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 2 files"));
}

#[test]
fn test_check_json_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.b"), "f() { case 1: ; }").unwrap();

    badc()
        .args(["check", "--format", "json"])
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""errors": 1"#))
        .stdout(predicate::str::contains("B0-0303"));
}

#[test]
fn test_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("t.b");
    fs::write(&input, "x =+ 1;").unwrap();

    badc()
        .arg("tokens")
        .arg(&input)
        .assert()
        .success()
        .stdout("1:1\tIdentifier\tx\n1:3\tAssignPlus\t=+\n1:6\tNumber\t1\n1:7\tSemicolon\t;\n");
}

#[test]
fn test_ast() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("t.b");
    fs::write(&input, "f() return (-x);").unwrap();

    badc()
        .arg("ast")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("func f() [1:1]"))
        .stdout(predicate::str::contains("unary -"));
}

#[test]
fn test_symbols_json() {
    badc()
        .args(["symbols", "--format", "json", "-"])
        .write_stdin("buf[100];\nmain(argc, argv) ;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind": "vector""#))
        .stdout(predicate::str::contains(r#""size": 100"#))
        .stdout(predicate::str::contains(r#""size": 2"#));
}

#[test]
fn test_word_size_limits_constants() {
    badc()
        .args(["--word-size", "1", "compile", "-"])
        .write_stdin("n 300;")
        .assert()
        .failure()
        .stderr(predicate::str::contains("B0-0105"));
}

#[test]
fn test_config_reflects_flags_and_env() {
    badc()
        .env("BADC_WORD_SIZE", "4")
        .args(["--verbosity", "trace", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("word_size: 4"))
        .stdout(predicate::str::contains("verbosity: Trace"));
}

#[test]
fn test_word_size_from_env_is_validated() {
    badc()
        .env("BADC_WORD_SIZE", "0")
        .args(["compile", "-"])
        .write_stdin("n 256;")
        .assert()
        .failure()
        .stderr(predicate::str::contains("word_size must be between 1 and 16"));
}

#[test]
fn test_completion() {
    badc()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("badc"));
}
