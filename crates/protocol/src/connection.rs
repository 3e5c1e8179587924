//! One transport session to the control socket

use crate::codec::CommandProtocol;
use crate::command::Command;
use crate::response::Response;
use onair_core::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::time::{timeout, timeout_at, Instant};

/// Lifecycle of a connection relative to the commands sent over it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Opened for one command and closed right after
    Ephemeral,
    /// Held open across commands by its owner
    Persistent,
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionMode::Ephemeral => f.write_str("ephemeral"),
            ConnectionMode::Persistent => f.write_str("persistent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    /// Unusable: timed out, broke, or was abandoned mid-exchange
    Failed,
}

/// A Unix socket session with read/write deadlines
#[derive(Debug)]
pub struct SocketConnection {
    path: PathBuf,
    mode: ConnectionMode,
    state: ConnectionState,
    stream: Option<BufReader<UnixStream>>,
}

impl SocketConnection {
    /// Connect within `connect_timeout`. `label` names the command that
    /// needed the connection in any error.
    pub async fn connect(
        path: &Path,
        mode: ConnectionMode,
        connect_timeout: Duration,
        label: &str,
    ) -> Result<Self> {
        let mut connection = Self {
            path: path.to_path_buf(),
            mode,
            state: ConnectionState::Connecting,
            stream: None,
        };

        match timeout(connect_timeout, UnixStream::connect(path)).await {
            Ok(Ok(stream)) => {
                connection.stream = Some(BufReader::new(stream));
                connection.state = ConnectionState::Open;
                tracing::trace!(socket = %path.display(), %mode, "connected");
                Ok(connection)
            }
            Ok(Err(e)) => Err(Error::transport(path, label, e)),
            Err(_) => Err(Error::transport_timeout(
                format!("connect {} ({label})", path.display()),
                connect_timeout,
            )),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open && self.stream.is_some()
    }

    /// Write one command and read until its terminator or the deadline.
    ///
    /// A deadline expiry yields a `Timeout` response and leaves the
    /// connection `Failed`. Transport errors and premature EOF are errors and
    /// also leave it `Failed`.
    pub async fn exchange(
        &mut self,
        protocol: &CommandProtocol,
        command: &Command,
        deadline: Duration,
    ) -> Result<Response> {
        let text = command.text();
        let path = self.path.clone();
        let Some(stream) = self.stream.as_mut().filter(|_| self.state == ConnectionState::Open)
        else {
            return Err(Error::transport(
                path,
                text,
                std::io::Error::new(std::io::ErrorKind::NotConnected, "connection is not open"),
            ));
        };

        // Stays Failed unless the exchange completes; a dropped future
        // leaves nothing reusable behind.
        self.state = ConnectionState::Failed;
        let started = Instant::now();
        let until = started + deadline;

        match timeout_at(until, async {
            stream.get_mut().write_all(&protocol.encode(command)).await?;
            stream.get_mut().flush().await
        })
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.stream = None;
                return Err(Error::transport(path, text, e));
            }
            Err(_) => {
                self.stream = None;
                return Ok(Response::timeout(text, Vec::new(), started.elapsed()));
            }
        }

        let mut buf = Vec::new();
        loop {
            match timeout_at(until, stream.read_until(b'\n', &mut buf)).await {
                Ok(Ok(0)) => {
                    if protocol.frame_complete(command, &buf) {
                        break;
                    }
                    self.stream = None;
                    return Err(Error::framing(
                        text,
                        format!(
                            "connection closed after {} byte(s) without '{}'",
                            buf.len(),
                            command.terminator()
                        ),
                    ));
                }
                Ok(Ok(_)) => {
                    if protocol.frame_complete(command, &buf) {
                        break;
                    }
                }
                Ok(Err(e)) => {
                    self.stream = None;
                    return Err(Error::transport(path, text, e));
                }
                Err(_) => {
                    self.stream = None;
                    tracing::warn!(
                        socket = %path.display(),
                        command = %text,
                        mode = %self.mode,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "no terminator before deadline"
                    );
                    return Ok(Response::timeout(text, buf, started.elapsed()));
                }
            }
        }

        let response = protocol.parse(command, buf)?.with_elapsed(started.elapsed());
        self.state = ConnectionState::Open;
        Ok(response)
    }

    /// Shut the stream down; safe to call in any state
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.get_mut().shutdown().await;
        }
        if self.state != ConnectionState::Failed {
            self.state = ConnectionState::Closed;
        }
    }
}
