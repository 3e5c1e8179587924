//! `onair run`: the long-lived supervision entry point

use onair_config::Config;
use onair_core::{Error, Result};
use onair_protocol::ControlSocketClient;
use onair_queue::QueueController;
use onair_supervisor::{ProcessState, ProcessSupervisor, DEFAULT_TERMINATE_SIGNAL};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};

enum Stop {
    Exited(Result<ProcessState>),
    Signal(&'static str),
}

pub async fn execute(
    config: &Config,
    seed: Option<PathBuf>,
    library: Option<PathBuf>,
) -> Result<()> {
    let mut seed_settings = config.seed.clone();
    if let Some(track) = seed {
        seed_settings.track = Some(track);
    }
    if let Some(dir) = library {
        seed_settings.library_dir = Some(dir);
    }

    let client = Arc::new(ControlSocketClient::from_config(config));
    let queue = QueueController::from_config(client, config);
    let mut supervisor = ProcessSupervisor::from_config(config);

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| Error::configuration(format!("cannot install SIGTERM handler: {e}")))?;

    let pid = supervisor.start().await?;
    supervisor.await_ready().await?;

    match supervisor.seed(|| queue.seed_from(&seed_settings)).await {
        Ok(Some(receipt)) => tracing::info!(
            pid,
            track = %receipt.track.display(),
            reply = %receipt.reply,
            "queue seeded"
        ),
        Ok(None) => {}
        Err(e @ Error::GenerationDisabled { .. }) => {
            tracing::info!(pid, error = %e, "seed skipped");
        }
        Err(e) => tracing::error!(pid, error = %e, "seed failed, engine keeps running"),
    }

    let stop = tokio::select! {
        state = supervisor.wait() => Stop::Exited(state),
        _ = tokio::signal::ctrl_c() => Stop::Signal("SIGINT"),
        _ = sigterm.recv() => Stop::Signal("SIGTERM"),
    };

    match stop {
        Stop::Signal(name) => {
            tracing::info!(pid, signal = name, "shutting down");
            let state = supervisor.terminate(DEFAULT_TERMINATE_SIGNAL).await?;
            tracing::info!(pid, %state, "engine stopped");
            Ok(())
        }
        Stop::Exited(state) => match state? {
            ProcessState::Exited(0) => Ok(()),
            state => Err(Error::process(pid, format!("engine {state}"))),
        },
    }
}
