use super::*;
use onair_config::EngineSettings;
use onair_core::Error;
use onair_protocol::testing::FakeEngine;
use onair_protocol::{CommandProtocol, ReadinessProbe};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn settings(binary: PathBuf) -> EngineSettings {
    EngineSettings {
        binary,
        terminate_grace_ms: 500,
        ..EngineSettings::default()
    }
}

fn quick_probe(socket: PathBuf) -> ReadinessProbe {
    ReadinessProbe::new(socket, CommandProtocol::default())
        .attempts(3)
        .interval(Duration::from_millis(50))
        .probe_timeout(Duration::from_millis(40))
}

#[tokio::test]
async fn test_missing_binary_is_process_start_failure() {
    let temp_dir = TempDir::new().unwrap();
    let mut supervisor = ProcessSupervisor::new(
        settings(temp_dir.path().join("no-engine")),
        quick_probe(temp_dir.path().join("engine.sock")),
    );

    let err = supervisor.start().await.unwrap_err();
    assert!(matches!(err, Error::ProcessStart { .. }), "{err}");
    assert_eq!(err.exit_code(), onair_core::EXIT_FAILURE);
    assert!(supervisor.state().is_none());
}

#[tokio::test]
async fn test_missing_config_file_is_process_start_failure() {
    let temp_dir = TempDir::new().unwrap();
    let binary = write_script(temp_dir.path(), "engine", "exec sleep 30");
    let mut engine = settings(binary);
    engine.config_file = Some(temp_dir.path().join("radio.liq"));

    let mut supervisor =
        ProcessSupervisor::new(engine, quick_probe(temp_dir.path().join("engine.sock")));
    let err = supervisor.start().await.unwrap_err();
    match err {
        Error::ProcessStart { message, .. } => assert!(message.contains("radio.liq")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_engine_receives_environment_and_config_argument() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("seen.txt");
    let toolchain = temp_dir.path().join("toolchain");
    std::fs::create_dir(&toolchain).unwrap();
    let config_file = temp_dir.path().join("radio.liq");
    std::fs::write(&config_file, "# engine script").unwrap();

    let binary = write_script(
        temp_dir.path(),
        "engine",
        &format!(
            "printf '%s\\n' \"$ENGINE_CONFIG\" \"$STATION\" \"$1\" \"${{PATH%%:*}}\" > '{}'",
            out.display()
        ),
    );
    let mut engine = settings(binary);
    engine.config_file = Some(config_file.clone());
    engine.config_env_var = Some("ENGINE_CONFIG".to_string());
    engine.env.insert("STATION".to_string(), "night-shift".to_string());
    engine.toolchain_dirs = vec![toolchain.clone()];

    let mut supervisor =
        ProcessSupervisor::new(engine, quick_probe(temp_dir.path().join("engine.sock")));
    supervisor.start().await.unwrap();
    let state = supervisor.wait().await.unwrap();

    // Exiting before supervision settled counts as a crash.
    assert_eq!(state, ProcessState::Crashed(Some(0)));

    let seen = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = seen.lines().collect();
    let config = config_file.display().to_string();
    let toolchain = toolchain.display().to_string();
    assert_eq!(lines, [config.as_str(), "night-shift", config.as_str(), toolchain.as_str()]);
}

#[tokio::test]
async fn test_engine_dying_during_readiness_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let binary = write_script(temp_dir.path(), "engine", "exit 3");

    let mut supervisor =
        ProcessSupervisor::new(settings(binary), quick_probe(temp_dir.path().join("engine.sock")));
    supervisor.start().await.unwrap();

    let err = supervisor.await_ready().await.unwrap_err();
    assert!(matches!(err, Error::Process { .. }), "{err}");
    assert_eq!(supervisor.state(), Some(ProcessState::Crashed(Some(3))));
    assert!(!supervisor.is_settled());
}

#[tokio::test]
async fn test_degraded_mode_then_seed_then_terminate() {
    let temp_dir = TempDir::new().unwrap();
    let binary = write_script(temp_dir.path(), "engine", "exec sleep 30");

    let mut supervisor =
        ProcessSupervisor::new(settings(binary), quick_probe(temp_dir.path().join("engine.sock")));
    let pid = supervisor.start().await.unwrap();
    assert_eq!(supervisor.pid(), Some(pid));
    assert_eq!(supervisor.state(), Some(ProcessState::Starting));
    assert_eq!(supervisor.try_status().unwrap(), ProcessState::Starting);

    let outcome = supervisor.await_ready().await.unwrap();
    assert!(!outcome.is_ready());
    assert!(supervisor.degraded());
    assert_eq!(supervisor.state(), Some(ProcessState::Running));

    let seeded = supervisor
        .seed(|| async { Err::<(), _>(Error::application("queue.push /a.flac", "ERROR")) })
        .await;
    assert!(matches!(seeded, Err(Error::Application { .. })));
    assert!(supervisor.is_settled());

    let again = supervisor.seed(|| async { Ok(()) }).await;
    assert!(matches!(again, Err(Error::Process { .. })));

    let state = supervisor.terminate(DEFAULT_TERMINATE_SIGNAL).await.unwrap();
    assert_eq!(state, ProcessState::Exited(128 + libc::SIGTERM));
}

#[tokio::test]
async fn test_terminate_escalates_to_sigkill() {
    let temp_dir = TempDir::new().unwrap();
    let binary = write_script(
        temp_dir.path(),
        "engine",
        "trap '' TERM\nwhile :; do sleep 0.1; done",
    );
    let mut engine = settings(binary);
    engine.terminate_grace_ms = 200;

    let mut supervisor =
        ProcessSupervisor::new(engine, quick_probe(temp_dir.path().join("engine.sock")));
    supervisor.start().await.unwrap();
    // Give the shell time to install its trap.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let state = supervisor.terminate(libc::SIGTERM).await.unwrap();
    assert_eq!(state, ProcessState::Exited(128 + libc::SIGKILL));
}

#[tokio::test]
async fn test_ready_engine_runs_seed_once() {
    let temp_dir = TempDir::new().unwrap();
    let socket = temp_dir.path().join("engine.sock");
    let _fake = FakeEngine::start(&socket).unwrap();
    let binary = write_script(temp_dir.path(), "engine", "exec sleep 30");

    let mut supervisor = ProcessSupervisor::new(settings(binary), quick_probe(socket));
    supervisor.start().await.unwrap();

    let outcome = supervisor.await_ready().await.unwrap();
    assert!(outcome.is_ready());
    assert!(!supervisor.degraded());

    let id = supervisor.seed(|| async { Ok(17_u64) }).await.unwrap();
    assert_eq!(id, 17);
    assert!(supervisor.is_settled());

    assert_eq!(supervisor.try_status().unwrap(), ProcessState::Running);
    supervisor.terminate(libc::SIGTERM).await.unwrap();
    assert!(supervisor.state().unwrap().is_finished());
}

#[tokio::test]
async fn test_operations_before_start_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut supervisor = ProcessSupervisor::new(
        settings(PathBuf::from("sleep")),
        quick_probe(temp_dir.path().join("engine.sock")),
    );
    assert!(supervisor.try_status().is_err());
    assert!(supervisor.seed(|| async { Ok(()) }).await.is_err());
}
