//! The single choke point every control-socket command goes through

use crate::codec::CommandProtocol;
use crate::command::{Command, CommandClass};
use crate::connection::{ConnectionMode, SocketConnection};
use crate::response::Response;
use onair_config::Config;
use onair_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::Instrument;

/// Deadlines applied by [`ControlSocketClient::send`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTimeouts {
    pub connect: Duration,
    pub command: Duration,
    pub metadata: Duration,
    pub probe: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(2),
            command: Duration::from_secs(5),
            metadata: Duration::from_secs(10),
            probe: Duration::from_secs(1),
        }
    }
}

impl ClientTimeouts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            connect: config.timeouts.connect(),
            command: config.timeouts.command(),
            metadata: config.timeouts.metadata(),
            probe: config.timeouts.probe(),
        }
    }

    pub fn for_class(&self, class: CommandClass) -> Duration {
        match class {
            CommandClass::Probe => self.probe,
            CommandClass::Metadata => self.metadata,
            CommandClass::Query | CommandClass::Mutation => self.command,
        }
    }
}

/// Client for the engine's control socket.
///
/// Owns the socket address, the protocol and at most one persistent
/// connection. Ephemeral calls never share anything and can run
/// concurrently; persistent use is serialized by an internal mutex.
#[derive(Debug)]
pub struct ControlSocketClient {
    socket_path: PathBuf,
    protocol: CommandProtocol,
    timeouts: ClientTimeouts,
    persistent: Mutex<Option<SocketConnection>>,
}

impl ControlSocketClient {
    pub fn new(
        socket_path: impl Into<PathBuf>,
        protocol: CommandProtocol,
        timeouts: ClientTimeouts,
    ) -> Self {
        Self {
            socket_path: socket_path.into(),
            protocol,
            timeouts,
            persistent: Mutex::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.socket_path.clone(),
            CommandProtocol::from_config(config),
            ClientTimeouts::from_config(config),
        )
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn protocol(&self) -> &CommandProtocol {
        &self.protocol
    }

    pub fn timeouts(&self) -> &ClientTimeouts {
        &self.timeouts
    }

    /// Build a command framed by this client's protocol
    pub fn command<I, S>(&self, verb: &str, args: I, class: CommandClass) -> Result<Command>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protocol.command(verb, args, class)
    }

    /// Default connection mode for a command class.
    ///
    /// Every class defaults to a fresh connection: reused connections have
    /// been seen to hang on metadata-shaped responses that a fresh connection
    /// answers. Persistent use is opt-in through [`Self::session`].
    pub fn default_mode(_class: CommandClass) -> ConnectionMode {
        ConnectionMode::Ephemeral
    }

    /// Send `command` over a connection of the given mode within `timeout`.
    ///
    /// In persistent mode the wait for the session counts against the same
    /// deadline; a session held elsewhere for too long yields a `Timeout`.
    pub async fn invoke(
        &self,
        command: &Command,
        mode: ConnectionMode,
        timeout: Duration,
    ) -> Result<Response> {
        match mode {
            ConnectionMode::Ephemeral => self.invoke_ephemeral(command, timeout).await,
            ConnectionMode::Persistent => {
                let started = Instant::now();
                match tokio::time::timeout(timeout, self.persistent.lock()).await {
                    Ok(slot) => {
                        let remaining = timeout.saturating_sub(started.elapsed());
                        PersistentSession { client: self, slot }
                            .invoke(command, remaining)
                            .await
                    }
                    Err(_) => {
                        tracing::warn!(
                            command = %command.text(),
                            timeout_ms = timeout.as_millis() as u64,
                            "persistent session busy"
                        );
                        Ok(Response::timeout(command.text(), Vec::new(), started.elapsed()))
                    }
                }
            }
        }
    }

    /// Send with the default mode and the class timeout
    pub async fn send(&self, command: &Command) -> Result<Response> {
        let class = command.class();
        self.invoke(
            command,
            Self::default_mode(class),
            self.timeouts.for_class(class),
        )
        .await
    }

    /// Send and require `Success`; returns the payload
    pub async fn execute(&self, command: &Command) -> Result<String> {
        self.send(command).await?.into_result()
    }

    /// Exclusive persistent session, waiting at most the command timeout
    pub async fn session(&self) -> Result<PersistentSession<'_>> {
        self.session_within(self.timeouts.command).await
    }

    /// Exclusive persistent session, waiting at most `timeout` for another
    /// holder to release it
    pub async fn session_within(&self, timeout: Duration) -> Result<PersistentSession<'_>> {
        let slot = tokio::time::timeout(timeout, self.persistent.lock())
            .await
            .map_err(|_| Error::transport_timeout("persistent session", timeout))?;
        Ok(PersistentSession { client: self, slot })
    }

    /// Close the idle persistent connection, if any. A session in use is
    /// left to its holder.
    pub async fn close(&self) {
        if let Ok(mut slot) = self.persistent.try_lock() {
            if let Some(mut connection) = slot.take() {
                connection.close().await;
            }
        }
    }

    async fn invoke_ephemeral(&self, command: &Command, timeout: Duration) -> Result<Response> {
        let text = command.text();
        let span = onair_utils::tracing::command_span(&text, "ephemeral");
        async {
            let mut connection = SocketConnection::connect(
                &self.socket_path,
                ConnectionMode::Ephemeral,
                self.timeouts.connect,
                &text,
            )
            .await?;
            let result = connection.exchange(&self.protocol, command, timeout).await;
            connection.close().await;
            log_outcome(&result);
            result
        }
        .instrument(span)
        .await
    }
}

/// Holds the client's persistent connection exclusively until dropped
pub struct PersistentSession<'a> {
    client: &'a ControlSocketClient,
    slot: MutexGuard<'a, Option<SocketConnection>>,
}

impl PersistentSession<'_> {
    /// Send over the held connection, reconnecting if the previous one is
    /// gone. A `Timeout` discards the connection; it is never retried on the
    /// same transport.
    pub async fn invoke(&mut self, command: &Command, timeout: Duration) -> Result<Response> {
        let client = self.client;
        let text = command.text();
        let span = onair_utils::tracing::command_span(&text, "persistent");
        async {
            // The connection is owned by this call while in flight, so an
            // abandoned call drops it instead of leaving it in the slot.
            let mut connection = match self.slot.take().filter(SocketConnection::is_open) {
                Some(connection) => connection,
                None => {
                    SocketConnection::connect(
                        &client.socket_path,
                        ConnectionMode::Persistent,
                        client.timeouts.connect,
                        &text,
                    )
                    .await?
                }
            };

            let result = connection.exchange(&client.protocol, command, timeout).await;
            let reusable = matches!(&result, Ok(response) if !response.is_timeout());
            if reusable {
                *self.slot = Some(connection);
            } else {
                tracing::debug!("discarding persistent connection");
                connection.close().await;
            }
            log_outcome(&result);
            result
        }
        .instrument(span)
        .await
    }

    /// Send with the class timeout
    pub async fn send(&mut self, command: &Command) -> Result<Response> {
        let timeout = self.client.timeouts.for_class(command.class());
        self.invoke(command, timeout).await
    }

    /// Whether a live connection is currently held
    pub fn is_connected(&self) -> bool {
        self.slot.as_ref().is_some_and(SocketConnection::is_open)
    }

    /// Close the held connection and release the session
    pub async fn close(mut self) {
        if let Some(mut connection) = self.slot.take() {
            connection.close().await;
        }
    }
}

fn log_outcome(result: &Result<Response>) {
    match result {
        Ok(response) => tracing::debug!(
            classification = response.classification().name(),
            elapsed_ms = response.elapsed().as_millis() as u64,
            "command answered"
        ),
        Err(e) => tracing::debug!(error = %e, "command failed"),
    }
}
