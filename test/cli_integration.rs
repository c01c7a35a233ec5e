//! CLI Integration Tests for Lowercheck
//!
//! Runs the built binary and checks exit codes and report text.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Get the path to the lowercheck binary
fn lowercheck_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lowercheck"))
}

/// Get a temp directory for test inputs, unique per test
fn temp_dir(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push("lowercheck_cli_tests");
    path.push(format!("{}_{}", name, std::process::id()));
    fs::create_dir_all(&path).ok();
    path
}

/// Run the binary from `dir` so no stray lowercheck.toml is picked up
fn run_in(dir: &PathBuf, args: &[&str]) -> Output {
    Command::new(lowercheck_binary())
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run lowercheck")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

// ============================================================================
// Exit codes
// ============================================================================

#[test]
fn test_embedded_catalog_passes() {
    let dir = temp_dir("embedded_pass");
    let output = run_in(&dir, &["--features", "fma4", "--catalog", "embedded"]);

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(stdout(&output), "PASSED 32/32\n");
}

#[test]
fn test_missing_feature_fails_with_exit_1() {
    let dir = temp_dir("no_features");
    let output = run_in(&dir, &["--features", "", "--catalog", "embedded"]);

    assert_eq!(output.status.code(), Some(1));
    let report = stdout(&output);
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 33);
    assert_eq!(
        lines[0],
        "FAIL macc_ps Packed128 Float32: expected \"fma4.vfmadd.ps\" not found in []"
    );
    assert_eq!(lines[32], "PASSED 0/32");
}

#[test]
fn test_malformed_catalog_exits_2() {
    let dir = temp_dir("malformed");
    let catalog = dir.join("dup.csv");
    fs::write(
        &catalog,
        "macc_ps,Packed128,Float32,fma4.vfmadd.ps\nmacc_ps,Packed128,Float32,fma4.vfmadd.ps\n",
    )
    .unwrap();

    let output = run_in(&dir, &["--catalog", catalog.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("duplicate"), "stderr: {}", stderr);
}

#[test]
fn test_missing_catalog_file_exits_2() {
    let dir = temp_dir("missing_catalog");
    let output = run_in(&dir, &["--catalog", "does-not-exist.csv"]);
    assert_eq!(output.status.code(), Some(2));
}

// ============================================================================
// Catalog files and config
// ============================================================================

#[test]
fn test_catalog_file_partial_failure() {
    let dir = temp_dir("partial");
    let catalog = dir.join("cases.csv");
    fs::write(
        &catalog,
        "# fixture subset\n\
         macc_ps,Packed128,Float32,fma4.vfmadd.ps\n\
         macc_pd,Packed256,Float64,fma4.vfmadd.pd.256\n\
         maddsub_ss,Scalar128,Float32,fma4.vfmaddsub.ss\n",
    )
    .unwrap();

    let output = run_in(&dir, &["--features", "fma4", "--catalog", catalog.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "FAIL maddsub_ss Scalar128 Float32: expected \"fma4.vfmaddsub.ss\" not found in []\n\
         PASSED 2/3\n"
    );
}

#[test]
fn test_config_file_supplies_features() {
    let dir = temp_dir("config");
    fs::write(
        dir.join("lowercheck.toml"),
        "[target]\nfeatures = [\"avx\"]\n",
    )
    .unwrap();

    let output = run_in(&dir, &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).ends_with("PASSED 0/32\n"));

    // Command line overrides the config
    let output = run_in(&dir, &["--features", "avx,fma4"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_bad_config_exits_2() {
    let dir = temp_dir("bad_config");
    let config = dir.join("broken.toml");
    fs::write(&config, "[target\nfeatures = 3\n").unwrap();

    let output = run_in(&dir, &["--config", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
}

// ============================================================================
// Output modes
// ============================================================================

#[test]
fn test_list_prints_catalog() {
    let dir = temp_dir("list");
    let output = run_in(&dir, &["--list"]);

    assert_eq!(output.status.code(), Some(0));
    let listing = stdout(&output);
    assert_eq!(listing.lines().count(), 32);
    assert!(listing.starts_with("macc_ps,Packed128,Float32,fma4.vfmadd.ps,fma4\n"));
}

#[test]
fn test_verbose_prints_pass_lines() {
    let dir = temp_dir("verbose");
    let output = run_in(&dir, &["--features", "fma4", "-v"]);

    assert_eq!(output.status.code(), Some(0));
    let report = stdout(&output);
    assert_eq!(report.lines().filter(|l| l.starts_with("PASS ")).count(), 32);
    assert!(report.contains("PASS msubadd_pd Packed256 Float64: llvm.x86.fma4.vfmsubadd.pd.256"));
}

#[test]
fn test_json_report() {
    let dir = temp_dir("json");
    let output = run_in(&dir, &["--features", "", "--format", "json"]);

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(report["summary"]["total"], 32);
    assert_eq!(report["summary"]["passed"], 0);
    assert_eq!(report["engine"], "reference");
    assert_eq!(report["results"].as_array().map(Vec::len), Some(32));
    assert!(report["results"][0]["message"]
        .as_str()
        .is_some_and(|m| m.starts_with("FAIL macc_ps")));
}

#[cfg(unix)]
#[test]
fn test_command_engine() {
    let dir = temp_dir("command");
    let catalog = dir.join("one.csv");
    fs::write(&catalog, "macc_sd,Scalar128,Float64,fma4.vfmadd.sd\n").unwrap();
    fs::write(
        dir.join("lowercheck.toml"),
        r#"
[engine]
kind = "command"
program = "sh"
args = ["-c", "echo 'tail call <2 x double> @llvm.x86.fma4.vfmadd.sd(<2 x double> %a)'"]
"#,
    )
    .unwrap();

    let output = run_in(&dir, &["--catalog", catalog.to_str().unwrap()]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(stdout(&output), "PASSED 1/1\n");
}

// ============================================================================
// Path resolution and edge-case catalogs
// ============================================================================

#[test]
fn test_config_catalog_resolved_from_config_dir() {
    let dir = temp_dir("config_relative");
    let sub = dir.join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(dir.join("cases.csv"), "macc_ps,Packed128,Float32,fma4.vfmadd.ps\n").unwrap();
    fs::write(dir.join("lowercheck.toml"), "[catalog]\nsource = \"cases.csv\"\n").unwrap();

    for cwd in [&dir, &sub] {
        let output = run_in(cwd, &[]);
        assert_eq!(
            output.status.code(),
            Some(0),
            "from {}: {}",
            cwd.display(),
            String::from_utf8_lossy(&output.stderr)
        );
        assert_eq!(stdout(&output), "PASSED 1/1\n");
    }

    // --catalog stays relative to the working directory
    let output = run_in(&sub, &["--catalog", "cases.csv"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_comment_only_catalog_passes_vacuously() {
    let dir = temp_dir("comment_only");
    let catalog = dir.join("empty.csv");
    fs::write(&catalog, "# header only\n\n").unwrap();

    let output = run_in(&dir, &["--catalog", catalog.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "PASSED 0/0\n");
}

#[test]
fn test_empty_builtin_name_exits_2() {
    let dir = temp_dir("empty_name");
    let catalog = dir.join("noname.csv");
    fs::write(&catalog, ",Packed128,Float32,fma4.vfmadd.ps\n").unwrap();

    let output = run_in(&dir, &["--catalog", catalog.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("empty builtin name"), "stderr: {}", stderr);
}

#[test]
fn test_missing_catalog_names_cause_once() {
    let dir = temp_dir("cause_once");
    let output = run_in(&dir, &["--catalog", "absent.csv"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("absent.csv").count(), 2, "stderr: {}", stderr);
    assert_eq!(stderr.matches("failed to read catalog").count(), 1, "stderr: {}", stderr);
}

// ============================================================================
// Engine failures
// ============================================================================

#[cfg(unix)]
#[test]
fn test_failing_engine_program_exits_2() {
    let dir = temp_dir("engine_exit");
    fs::write(
        dir.join("lowercheck.toml"),
        r#"
[engine]
kind = "command"
program = "sh"
args = ["-c", "echo 'backend crashed' >&2; exit 7"]
"#,
    )
    .unwrap();

    let output = run_in(&dir, &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("backend crashed"), "stderr: {}", stderr);
}

#[test]
fn test_command_engine_without_program_exits_2() {
    let dir = temp_dir("engine_unset");
    fs::write(dir.join("lowercheck.toml"), "[engine]\nkind = \"command\"\n").unwrap();

    let output = run_in(&dir, &[]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("program is not set"), "stderr: {}", stderr);
}

#[test]
fn test_engine_flag_overrides_config() {
    let dir = temp_dir("engine_override");
    fs::write(dir.join("lowercheck.toml"), "[engine]\nkind = \"command\"\n").unwrap();

    let output = run_in(&dir, &["--engine", "reference"]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(stdout(&output), "PASSED 32/32\n");
}
