//! CLI integration tests for axon-server
//!
//! Runs the built binary for the init, config and agent commands. The
//! server itself is never started here.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_axon(args: &[&str], working_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_axon-server"))
        .args(args)
        .current_dir(working_dir)
        .output()
        .expect("Failed to execute axon-server")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn init_project(dir: &TempDir) {
    let output = run_axon(&["init", ".", "--no-color"], dir.path());
    assert!(output.status.success(), "init failed: {:?}", output);
}

// =============================================================================
// Help and Version
// =============================================================================

#[test]
fn test_help_command() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_axon(&["--help"], dir.path());

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Axon"));
    assert!(text.contains("init"));
    assert!(text.contains("config"));
    assert!(text.contains("agent"));
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_axon(&["--version"], dir.path());

    assert!(output.status.success());
    assert!(stdout(&output).contains("axon-server"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_axon(&["deploy"], dir.path());
    assert!(!output.status.success());
}

// =============================================================================
// Init
// =============================================================================

#[test]
fn test_init_creates_project_files() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    init_project(&dir);

    assert!(dir.path().join("axon.toml").is_file());
    assert!(dir.path().join(".env.example").is_file());
    assert!(dir.path().join(".gitignore").is_file());
    assert!(dir.path().join("data/artifacts").is_dir());

    let toml = fs::read_to_string(dir.path().join("axon.toml")).unwrap();
    assert!(toml.contains("[server]"));
    assert!(toml.contains("port = 3000"));
}

#[test]
fn test_init_custom_port() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_axon(&["init", ".", "--port", "8123", "--no-color"], dir.path());
    assert!(output.status.success());

    let toml = fs::read_to_string(dir.path().join("axon.toml")).unwrap();
    assert!(toml.contains("port = 8123"));
}

#[test]
fn test_init_keeps_existing_config_without_force() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("axon.toml"), "# mine\n").unwrap();

    let output = run_axon(&["init", ".", "--no-color"], dir.path());
    assert!(output.status.success());
    assert!(stdout(&output).contains("already exists"));
    assert_eq!(
        fs::read_to_string(dir.path().join("axon.toml")).unwrap(),
        "# mine\n"
    );

    let output = run_axon(&["init", ".", "--force", "--no-color"], dir.path());
    assert!(output.status.success());
    assert!(fs::read_to_string(dir.path().join("axon.toml"))
        .unwrap()
        .contains("[server]"));
}

// =============================================================================
// Config and Agents
// =============================================================================

#[test]
fn test_config_validate() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    init_project(&dir);

    let output = run_axon(&["config", "--validate", "--no-color"], dir.path());
    assert!(output.status.success(), "config failed: {:?}", output);

    let text = stdout(&output);
    assert!(text.contains("Configuration"));
    assert!(text.contains("127.0.0.1:3000"));
    assert!(text.contains("Configuration is valid"));
}

#[test]
fn test_config_missing_file_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_axon(&["config", "--config", "nope.toml"], dir.path());
    assert!(!output.status.success());
}

#[test]
fn test_agent_list() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    init_project(&dir);
    fs::write(
        dir.path().join("axon.toml"),
        "[agents.design]\nenabled = false\n",
    )
    .unwrap();

    let output = run_axon(&["agent", "list", "--no-color"], dir.path());
    assert!(output.status.success(), "agent list failed: {:?}", output);

    let text = stdout(&output);
    for agent in ["content", "code", "research", "design", "data"] {
        assert!(text.contains(agent), "missing {} in {}", agent, text);
    }
    assert!(text.contains("120000ms"));
    let design_row = text
        .lines()
        .find(|l| l.trim_start().starts_with("design"))
        .expect("design row");
    assert!(design_row.contains("no"));
}
