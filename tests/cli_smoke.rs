//! CLI startup smoke tests.
//!
//! Verifies that key subcommands exit cleanly (or with expected codes)
//! without panicking. Uses `std::process::Command` against the compiled binary.

use std::process::Command;

fn waktu_bin() -> std::path::PathBuf {
    env!("CARGO_BIN_EXE_waktu").into()
}

/// Informational invocations that must succeed without a config file.
#[test]
fn info_flags_exit_zero() {
    let cases: &[(&[&str], &str)] = &[
        (&["--help"], "Prayer-time countdown"),
        (&["--version"], env!("CARGO_PKG_VERSION")),
        (&["daemon", "--help"], "background"),
        (&["today", "--help"], "reminder times"),
        (&["zone", "--help"], "DESCRIPTOR"),
    ];

    for (args, expected) in cases {
        let output = Command::new(waktu_bin())
            .args(*args)
            .output()
            .unwrap_or_else(|e| panic!("failed to run waktu {args:?}: {e}"));

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            output.status.success(),
            "waktu {args:?} failed:\nstdout: {stdout}\nstderr: {}",
            String::from_utf8_lossy(&output.stderr),
        );
        assert!(
            stdout.contains(expected),
            "waktu {args:?} should mention {expected:?}: {stdout}"
        );
    }
}

#[test]
fn zone_resolves_descriptor() {
    let output = Command::new(waktu_bin())
        .args([
            "zone",
            "JHR04 - Batu Pahat, Muar, Segamat, Gemas Johor, Tangkak",
        ])
        .output()
        .expect("failed to run waktu zone");

    assert!(
        output.status.success(),
        "waktu zone failed:\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().next(), Some("Batu Pahat"));
    assert!(stdout.contains("JHR04"));
}

#[test]
fn zone_falls_back_to_configured_zone() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "zone = \"SGR01 - Gombak, Petaling\"\ntimer = 10\n").unwrap();

    let output = Command::new(waktu_bin())
        .arg("--config")
        .arg(&path)
        .arg("zone")
        .output()
        .expect("failed to run waktu zone");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().next(), Some("Gombak"));
    assert!(stdout.contains("code: SGR01"));
}

#[test]
fn zone_rejects_malformed_descriptor() {
    let output = Command::new(waktu_bin())
        .args(["zone", "JHR04"])
        .output()
        .expect("failed to run waktu zone");

    assert!(
        !output.status.success(),
        "malformed descriptor should fail, but it succeeded"
    );
}

#[test]
fn next_without_config_exits_nonzero() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("config.toml");

    let output = Command::new(waktu_bin())
        .arg("--config")
        .arg(&missing)
        .arg("next")
        .output()
        .expect("failed to run waktu next");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no config found"),
        "stderr should explain the missing config: {stderr}"
    );
}

#[test]
fn incomplete_config_exits_nonzero() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "zone = \"JHR04 - Batu Pahat\"\n").unwrap();

    let output = Command::new(waktu_bin())
        .arg("--config")
        .arg(&path)
        .arg("today")
        .output()
        .expect("failed to run waktu today");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Incomplete configuration. Fill in all fields."),
        "stderr should report the incomplete config: {stderr}"
    );
}

#[test]
fn unknown_subcommand_exits_nonzero() {
    let output = Command::new(waktu_bin())
        .arg("nonexistent-subcommand")
        .output()
        .expect("failed to run waktu with unknown subcommand");

    assert!(
        !output.status.success(),
        "unknown subcommand should fail, but it succeeded"
    );
}
