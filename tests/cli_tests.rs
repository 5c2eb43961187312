//! Binary-level tests for the cfgload CLI
//!
//! This test suite covers:
//! - Help and version output
//! - Usage errors (exit code 2)
//! - Named errors before the transaction (exit code 1)
//! - Settings file handling

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::{tempdir, TempDir};

// Helper to get a command for testing, isolated from user settings
fn cfgload_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cfgload").unwrap();
    cmd.env_remove("CFGLOAD_SETTINGS")
        .env_remove("CFGLOAD_PORT")
        .env_remove("CFGLOAD_CONNECT_TIMEOUT")
        .env_remove("CFGLOAD_HOST_KEY_CHECKING")
        .env_remove("RUST_LOG")
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1");
    cmd
}

// Helper to create a workspace with credentials and a config file
fn workspace() -> TempDir {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("credentials.toml"),
        r#"
[inventory]
path = "devices.csv"

[auth.core]
username = "netops"
password = "s3cret"
"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("devices.csv"),
        "hostname,address,proxy,auth\nr1,127.0.0.1,,core\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("flat.toml"),
        "[credentials]\nusername = \"netops\"\npassword = \"s3cret\"\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("r1.conf"), "system { host-name r1; }\n").unwrap();
    dir
}

fn base_args(dir: &TempDir, host: &str, cfgfile: &str) -> Vec<String> {
    vec![
        host.to_string(),
        "-i".to_string(),
        dir.path().join(cfgfile).display().to_string(),
        "-c".to_string(),
        dir.path().join("r1.conf").display().to_string(),
    ]
}

// ============================================================================
// Help
// ============================================================================

#[test]
fn test_help_lists_flags() {
    let dir = workspace();
    cfgload_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--cfgfile"))
        .stdout(predicate::str::contains("--loadfile"))
        .stdout(predicate::str::contains("--noprompt"))
        .stdout(predicate::str::contains("--exclusive"))
        .stdout(predicate::str::contains("--override"));
}

#[test]
fn test_version() {
    let dir = workspace();
    cfgload_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// Usage errors
// ============================================================================

#[test]
fn test_two_load_modes_exit_2() {
    let dir = workspace();
    cfgload_cmd(dir.path())
        .args(base_args(&dir, "r1", "credentials.toml"))
        .args(["--merge", "--replace"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_two_scopes_exit_2() {
    let dir = workspace();
    cfgload_cmd(dir.path())
        .args(base_args(&dir, "r1", "credentials.toml"))
        .args(["--shared", "--private"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_required_args_exit_2() {
    let dir = workspace();
    cfgload_cmd(dir.path()).arg("r1").assert().code(2);
}

#[test]
fn test_invalid_port_exit_2() {
    let dir = workspace();
    cfgload_cmd(dir.path())
        .args(base_args(&dir, "r1", "credentials.toml"))
        .args(["-p", "99999"])
        .assert()
        .code(2);
}

// ============================================================================
// Named errors
// ============================================================================

#[test]
fn test_missing_varfile_exit_1() {
    let dir = workspace();
    let varfile = dir.path().join("vars.json");
    cfgload_cmd(dir.path())
        .args(base_args(&dir, "r1", "credentials.toml"))
        .arg("-t")
        .arg(&varfile)
        .assert()
        .code(1)
        .stderr(predicate::str::contains(format!(
            "ERROR: Unable to open {}",
            varfile.display()
        )));
}

#[test]
fn test_invalid_varfile_exit_1() {
    let dir = workspace();
    let varfile = dir.path().join("vars.json");
    std::fs::write(&varfile, "[1, 2").unwrap();
    cfgload_cmd(dir.path())
        .args(base_args(&dir, "r1", "credentials.toml"))
        .arg("-t")
        .arg(&varfile)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid JSON in"));
}

#[test]
fn test_unknown_host_exit_1() {
    let dir = workspace();
    cfgload_cmd(dir.path())
        .args(base_args(&dir, "r9", "credentials.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Host 'r9' not found"));
}

#[test]
fn test_missing_credentials_file_exit_1() {
    let dir = workspace();
    cfgload_cmd(dir.path())
        .args(base_args(&dir, "r1", "absent.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unable to read"));
}

#[test]
fn test_connection_refused_exit_1() {
    let dir = workspace();
    // Grab a free port, then release it so nothing listens there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port().to_string()
    };

    cfgload_cmd(dir.path())
        .args(base_args(&dir, "127.0.0.1", "flat.toml"))
        .args(["-p", port.as_str(), "--timeout", "5"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ERROR: Connection refused."));
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn test_malformed_settings_exit_1() {
    let dir = workspace();
    let settings = dir.path().join("settings.toml");
    std::fs::write(&settings, "[connection\nport = 22\n").unwrap();
    cfgload_cmd(dir.path())
        .args(base_args(&dir, "r1", "credentials.toml"))
        .arg("--settings")
        .arg(&settings)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse settings file"));
}

#[test]
fn test_settings_from_environment() {
    let dir = workspace();
    let settings = dir.path().join("settings.toml");
    std::fs::write(&settings, "[connection]\nport = \"twenty-two\"\n").unwrap();
    cfgload_cmd(dir.path())
        .env("CFGLOAD_SETTINGS", &settings)
        .args(base_args(&dir, "r1", "credentials.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ERROR:"));
}
