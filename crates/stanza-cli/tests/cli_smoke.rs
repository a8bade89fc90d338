//! CLI smoke tests
//!
//! Run the built `stanza` binary against temporary config files. Commands
//! that need real fonts are covered by the facade's tests; here only the
//! paths that fail before or without rendering are exercised.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn stanza(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stanza"))
        .current_dir(dir)
        .env_remove("STANZA_CACHE")
        .env_remove("STANZA_CACHE_TTL")
        .env_remove("STANZA_WORKERS")
        .env_remove("STANZA_PADDING")
        .args(args)
        .output()
        .expect("failed to run stanza")
}

#[test]
fn test_help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = stanza(dir.path(), &["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["render", "batch", "info"] {
        assert!(stdout.contains(name), "help should mention {name}");
    }
}

#[test]
fn test_info_uses_builtin_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let output = stanza(dir.path(), &["info"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("* m1"));
    assert!(stdout.contains("poem_y2.jpg"));
    assert!(stdout.contains("21600s"));
}

#[test]
fn test_info_reads_config_and_env() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("stanza.toml"),
        "default_font = \"body\"\n[fonts.body]\npath = \"body.otf\"\nsize = 20\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_stanza"))
        .current_dir(dir.path())
        .env("STANZA_CACHE_TTL", "90")
        .args(["info"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("* body"));
    assert!(!stdout.contains("y3"));
    assert!(stdout.contains("90s"));

    let ids = stanza(dir.path(), &["info", "--fonts"]);
    assert_eq!(String::from_utf8_lossy(&ids.stdout).trim(), "body");
}

#[test]
fn test_bad_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.toml"), "padding = -3").unwrap();

    let output = stanza(dir.path(), &["-c", "broken.toml", "info"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("broken.toml"));
}

#[test]
fn test_render_without_assets_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = stanza(dir.path(), &["render", "roses are red"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load assets"));
}
