use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn fixture(path: &str) -> String {
    format!("{}/tests/fixtures/{path}", env!("CARGO_MANIFEST_DIR"))
}

/// The count at the end of each `label = count` line.
fn counts(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| line.rsplit(" = ").next().unwrap_or(line).to_string())
        .collect()
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_cli_help() {
    let output = run(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("case-census"));
    assert!(stdout.contains("ROOT_PACKAGE"));
    assert!(stdout.contains("SUB_PACKAGE"));
    assert!(stdout.contains("--source-root"));
    assert!(stdout.contains("--suite"));
    assert!(stdout.contains("--format"));
}

#[test]
fn test_cli_prints_four_counts() {
    let java = fixture("java");
    let suite = fixture("testng.yaml");
    let output = run(&["counttests", "--source-root", &java, "--suite", &suite, "-q"]);

    assert!(output.status.success());
    assert_eq!(counts(&output.stdout), vec!["3", "8", "7", "11"]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Test cases annotated by @Test in suite "));
    assert!(stdout.contains("Amount of tests in package counttests = 11"));
}

#[test]
fn test_cli_reads_testng_xml() {
    let java = fixture("java");
    let suite = fixture("testng.xml");
    let output = run(&["--source-root", &java, "--suite", &suite, "-q"]);

    assert!(output.status.success());
    assert_eq!(counts(&output.stdout), vec!["3", "8", "7", "11"]);
}

#[test]
fn test_cli_sub_package_and_all() {
    let java = fixture("java");
    let suite = fixture("testng.yaml");
    let output = run(&[
        "counttests",
        "login",
        "--source-root",
        &java,
        "--suite",
        &suite,
        "--all",
        "-q",
    ]);

    assert!(output.status.success());
    assert_eq!(counts(&output.stdout), vec!["4", "9", "3", "5"]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("in package counttests.login = 3"));
}

#[test]
fn test_cli_json_output() {
    let java = fixture("java");
    let suite = fixture("testng.yaml");
    let output = run(&[
        "--source-root",
        &java,
        "--suite",
        &suite,
        "--format",
        "json",
        "-q",
    ]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["root_package"], "counttests");
    assert_eq!(value["suite"]["annotated"], 3);
    assert_eq!(value["package"]["expanded"], 11);
    assert_eq!(value["suite"]["diagnostics"][0]["kind"], "class_not_found");
}

#[test]
fn test_cli_missing_suite_still_counts_package() {
    let temp_dir = TempDir::new().unwrap();
    let java = fixture("java");
    let suite = temp_dir.path().join("absent.yaml");
    let output = run(&[
        "--source-root",
        &java,
        "--suite",
        suite.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    assert_eq!(counts(&output.stdout), vec!["0", "0", "7", "11"]);
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("absent.yaml"));
}

#[test]
fn test_cli_invalid_source_root() {
    let output = run(&["--source-root", "/nonexistent/path/that/does/not/exist"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("does not exist") || stderr.contains("Invalid arguments"));
}

#[test]
fn test_cli_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("census.yaml");
    fs::write(
        &config,
        format!(
            "source_roots: [{}]\nsuite: {}\nsub_package: checkout\n",
            fixture("java"),
            fixture("testng.yaml")
        ),
    )
    .unwrap();

    let output = run(&["--config", config.to_str().unwrap(), "-q"]);

    assert!(output.status.success());
    assert_eq!(counts(&output.stdout), vec!["3", "8", "2", "3"]);
}

#[test]
fn test_cli_invalid_format() {
    let output = run(&["--format", "xml"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("invalid value") || stderr.contains("possible values"));
}
