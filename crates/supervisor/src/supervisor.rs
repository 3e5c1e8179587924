//! Core supervisor implementation

use onair_config::{Config, EngineSettings};
use onair_core::{Error, Result};
use onair_protocol::{ProbeOutcome, ReadinessProbe};
use std::future::Future;
use std::time::Duration;
use tokio::process::Child;
use tokio::task::JoinHandle;

use super::launch::spawn_engine;
use super::process::{ManagedProcess, ProcessState};
use super::utils::send_signal;

/// Starts the engine and owns it until it exits
pub struct ProcessSupervisor {
    /// How to launch the engine
    settings: EngineSettings,
    /// Readiness check run after spawning
    probe: ReadinessProbe,
    /// The spawned child, until it is reaped
    child: Option<Child>,
    /// Identity and state of the current engine
    process: Option<ManagedProcess>,
    /// Output forwarding tasks
    forwarders: Vec<JoinHandle<()>>,
    /// Signals sent by `terminate`
    requested_signals: Vec<i32>,
    degraded: bool,
    settled: bool,
    seeded: bool,
}

impl ProcessSupervisor {
    pub fn new(settings: EngineSettings, probe: ReadinessProbe) -> Self {
        Self {
            settings,
            probe,
            child: None,
            process: None,
            forwarders: Vec::new(),
            requested_signals: Vec::new(),
            degraded: false,
            settled: false,
            seeded: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.engine.clone(), ReadinessProbe::from_config(config))
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(ManagedProcess::pid)
    }

    pub fn state(&self) -> Option<ProcessState> {
        self.process.as_ref().map(ManagedProcess::state)
    }

    /// Whether the engine is running without a confirmed control socket
    pub fn degraded(&self) -> bool {
        self.degraded
    }

    /// Whether readiness handling and the seed step are both done
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Spawn the engine; the state becomes `Starting`
    pub async fn start(&mut self) -> Result<u32> {
        if let Some(process) = &self.process {
            if !process.state().is_finished() {
                return Err(Error::process(process.pid(), "engine is already running"));
            }
        }

        let (child, forwarders) = spawn_engine(&self.settings)?;
        let pid = child
            .id()
            .ok_or_else(|| Error::process_start(&self.settings.binary, "child has no pid"))?;

        self.child = Some(child);
        self.process = Some(ManagedProcess::new(pid));
        self.forwarders = forwarders;
        self.requested_signals.clear();
        self.degraded = false;
        self.settled = false;
        self.seeded = false;
        Ok(pid)
    }

    /// Wait for the control socket.
    ///
    /// `NotReady` with a live engine is not an error: the state becomes
    /// `Running` in degraded mode. An engine that died meanwhile is.
    pub async fn await_ready(&mut self) -> Result<ProbeOutcome> {
        let pid = self.require_started()?;
        let outcome = self.probe.run().await;

        if outcome.is_ready() {
            self.mark_running();
            return Ok(outcome);
        }

        let state = self.try_status()?;
        if state.is_finished() {
            tracing::error!(pid, %state, "engine exited before its control socket answered");
            return Err(Error::process(
                pid,
                format!("engine {state} before its control socket answered"),
            ));
        }

        if let ProbeOutcome::NotReady {
            elapsed,
            attempts,
            last_error,
        } = &outcome
        {
            tracing::warn!(
                pid,
                socket = %self.probe.socket_path().display(),
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                last_error = %last_error,
                "continuing in degraded mode: control socket not confirmed"
            );
        }
        self.degraded = true;
        self.mark_running();
        Ok(outcome)
    }

    /// Run the one-off seed step and settle supervision.
    ///
    /// Returns only after `action` finished. Supervision is settled whatever
    /// the outcome; the outcome itself is handed back to the caller.
    pub async fn seed<F, Fut, T>(&mut self, action: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let pid = self.require_started()?;
        if self.seeded {
            return Err(Error::process(pid, "seed step already ran"));
        }
        if self.state() != Some(ProcessState::Running) {
            return Err(Error::process(
                pid,
                "seed step requires the readiness step to finish first",
            ));
        }

        self.seeded = true;
        let result = action().await;
        self.settled = true;

        match &result {
            Ok(_) => tracing::info!(pid, degraded = self.degraded, "seed step done"),
            Err(e) => tracing::warn!(pid, error = %e, "seed step failed"),
        }
        result
    }

    /// Refresh the state without blocking
    pub fn try_status(&mut self) -> Result<ProcessState> {
        let pid = self.require_started()?;
        let status = match self.child.as_mut() {
            Some(child) => child
                .try_wait()
                .map_err(|e| Error::process(pid, format!("failed to poll engine: {e}")))?,
            None => None,
        };
        match status {
            Some(status) => Ok(self.record_exit(status)),
            None => self.current_state(),
        }
    }

    /// Block until the engine exits and return its final state
    pub async fn wait(&mut self) -> Result<ProcessState> {
        let pid = self.require_started()?;
        let Some(child) = self.child.as_mut() else {
            return self.current_state();
        };
        let status = child
            .wait()
            .await
            .map_err(|e| Error::process(pid, format!("failed to wait for engine: {e}")))?;
        Ok(self.record_exit(status))
    }

    /// Send `signal`, wait the grace period, then SIGKILL and reap
    pub async fn terminate(&mut self, signal: i32) -> Result<ProcessState> {
        let pid = self.require_started()?;
        let grace = self.settings.terminate_grace();
        let Some(child) = self.child.as_mut() else {
            return self.current_state();
        };

        if let Some(status) = child
            .try_wait()
            .map_err(|e| Error::process(pid, format!("failed to poll engine: {e}")))?
        {
            return Ok(self.record_exit(status));
        }

        tracing::info!(pid, signal, grace_ms = grace.as_millis() as u64, "stopping engine");
        self.requested_signals.push(signal);
        send_signal(pid, signal)?;

        let status = match tokio::time::timeout(grace, child.wait()).await {
            Ok(waited) => {
                waited.map_err(|e| Error::process(pid, format!("failed to wait for engine: {e}")))?
            }
            Err(_) => {
                tracing::warn!(pid, "engine ignored signal {signal}; sending SIGKILL");
                self.requested_signals.push(libc::SIGKILL);
                child
                    .start_kill()
                    .map_err(|e| Error::process(pid, format!("failed to kill engine: {e}")))?;
                tokio::time::timeout(Duration::from_secs(5), child.wait())
                    .await
                    .map_err(|_| Error::process(pid, "engine survived SIGKILL"))?
                    .map_err(|e| Error::process(pid, format!("failed to wait for engine: {e}")))?
            }
        };
        Ok(self.record_exit(status))
    }

    fn require_started(&self) -> Result<u32> {
        self.pid()
            .ok_or_else(|| Error::process(0, "engine has not been started"))
    }

    fn current_state(&self) -> Result<ProcessState> {
        self.state()
            .ok_or_else(|| Error::process(0, "engine has not been started"))
    }

    fn mark_running(&mut self) {
        if let Some(process) = self.process.as_mut() {
            process.mark_running();
        }
    }

    fn record_exit(&mut self, status: std::process::ExitStatus) -> ProcessState {
        self.child = None;
        // Detached: the forwarders drain what is left in the pipes and stop at EOF.
        self.forwarders.clear();
        let settled = self.settled;
        let requested = self.requested_signals.clone();
        let Some(process) = self.process.as_mut() else {
            return ProcessState::Crashed(status.code());
        };
        let state = process.record_exit(status, &requested, settled);
        let uptime_ms = process.uptime().as_millis() as u64;
        match state {
            ProcessState::Crashed(code) => {
                tracing::error!(pid = process.pid(), code = ?code, uptime_ms, "engine crashed")
            }
            _ => tracing::info!(pid = process.pid(), %state, uptime_ms, "engine stopped"),
        }
        state
    }
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("binary", &self.settings.binary)
            .field("process", &self.process)
            .field("degraded", &self.degraded)
            .field("settled", &self.settled)
            .finish()
    }
}
