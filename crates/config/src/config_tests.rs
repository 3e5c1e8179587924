//! Unit tests for configuration loading

use crate::{config::Config, loader::ConfigLoader, read_config_file};
use onair_core::Error;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_defaults_are_valid() {
    let config = Config::default();
    config.validate().unwrap();
    assert_eq!(config.protocol.terminator, "END");
    assert_eq!(config.protocol.probe_verb, "help");
    assert_eq!(config.timeouts.command(), Duration::from_secs(5));
    assert_eq!(config.readiness.budget(), Duration::from_secs(30));
}

#[test]
fn test_partial_file_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "socket_path": "/run/radio/engine.sock",
            "engine": { "binary": "/usr/bin/liquidsoap", "config_file": "/etc/radio/main.liq" },
            "protocol": { "queue_verb": "tracks.queue" }
        }"#,
    )
    .unwrap();

    let config = read_config_file(&path).unwrap();
    assert_eq!(config.socket_path, PathBuf::from("/run/radio/engine.sock"));
    assert_eq!(config.engine.binary, PathBuf::from("/usr/bin/liquidsoap"));
    assert_eq!(config.protocol.queue_verb, "tracks.queue");
    assert_eq!(config.protocol.push_verb, "queue.push");
    assert_eq!(config.engine.terminate_grace_ms, 10_000);
}

#[test]
fn test_unknown_fields_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, r#"{ "sockt_path": "/typo" }"#).unwrap();

    let err = read_config_file(&path).unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

#[test]
fn test_validate_rejects_zero_budget() {
    let mut config = Config::default();
    config.readiness.attempts = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.timeouts.command_ms = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_oversized_readiness_budget() {
    let mut config = Config::default();
    config.readiness.attempts = u32::MAX;
    config.readiness.interval_ms = u64::MAX;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("readiness budget"), "{err}");

    config.readiness.attempts = 1_440;
    config.readiness.interval_ms = 60_000;
    config.validate().unwrap();
}

#[test]
fn test_validate_rejects_multiword_verb_and_bad_terminator() {
    let mut config = Config::default();
    config.protocol.skip_verb = "queue skip".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.protocol.terminator = "END\n".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.protocol.error_markers.push(String::new());
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_loader_precedence() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "socket_path": "/from/file.sock", "kill_switch_path": "/from/file.flag" }"#,
    )
    .unwrap();

    std::env::set_var("ONAIR_SOCKET", "/from/env.sock");
    let config = ConfigLoader::new().file(&path).load().unwrap();
    assert_eq!(config.socket_path, PathBuf::from("/from/env.sock"));
    assert_eq!(config.kill_switch_path, PathBuf::from("/from/file.flag"));

    let config = ConfigLoader::new()
        .file(&path)
        .socket_path("/from/cli.sock")
        .load()
        .unwrap();
    assert_eq!(config.socket_path, PathBuf::from("/from/cli.sock"));
    std::env::remove_var("ONAIR_SOCKET");

    let config = ConfigLoader::new().file(&path).ignore_env().load().unwrap();
    assert_eq!(config.socket_path, PathBuf::from("/from/file.sock"));
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = ConfigLoader::new()
        .file(temp_dir.path().join("absent.json"))
        .load()
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}
