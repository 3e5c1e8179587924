//! Queue operations over the control socket

use crate::kill_switch::KillSwitch;
use crate::metadata::Metadata;
use crate::seed::pick_seed_track;
use crate::validate::{validate_track, Identity};
use onair_config::{Config, ProtocolSettings, SeedSettings};
use onair_core::{Error, QueueEntry, RequestId, Result};
use onair_protocol::{Classification, CommandClass, ConnectionMode, ControlSocketClient};
use onair_utils::retry_once;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Verbs of the queue commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueVerbs {
    pub queue: String,
    pub push: String,
    pub ignore: String,
    pub skip: String,
    pub metadata: String,
}

impl Default for QueueVerbs {
    fn default() -> Self {
        Self::from(&ProtocolSettings::default())
    }
}

impl From<&ProtocolSettings> for QueueVerbs {
    fn from(protocol: &ProtocolSettings) -> Self {
        Self {
            queue: protocol.queue_verb.clone(),
            push: protocol.push_verb.clone(),
            ignore: protocol.ignore_verb.clone(),
            skip: protocol.skip_verb.clone(),
            metadata: protocol.metadata_verb.clone(),
        }
    }
}

/// Connection policy for the ignores issued by a clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClearStrategy {
    /// One held-open session; a timeout moves the rest to fresh connections
    #[default]
    Persistent,
    /// A fresh connection per ignore
    Ephemeral,
}

/// What a successful clear removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub cleared: usize,
    pub ids: Vec<RequestId>,
}

/// Engine answer to a push
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushReceipt {
    pub track: PathBuf,
    /// Parsed request ID, when the answer was numeric
    pub id: Option<RequestId>,
    /// Answer as sent by the engine
    pub reply: String,
}

/// Domain operations on the engine's request queue.
///
/// Stateless apart from its handles: the queue is re-read from the engine on
/// every call.
#[derive(Debug, Clone)]
pub struct QueueController {
    client: Arc<ControlSocketClient>,
    verbs: QueueVerbs,
    kill_switch: Option<KillSwitch>,
    engine_user: Option<String>,
}

impl QueueController {
    pub fn new(client: Arc<ControlSocketClient>, verbs: QueueVerbs) -> Self {
        Self {
            client,
            verbs,
            kill_switch: None,
            engine_user: None,
        }
    }

    /// Controller with verbs, kill switch and engine user from `config`
    pub fn from_config(client: Arc<ControlSocketClient>, config: &Config) -> Self {
        Self::new(client, QueueVerbs::from(&config.protocol))
            .with_kill_switch(KillSwitch::from_config(config))
            .with_engine_user(config.engine.user.clone())
    }

    #[must_use]
    pub fn with_kill_switch(mut self, kill_switch: KillSwitch) -> Self {
        self.kill_switch = Some(kill_switch);
        self
    }

    #[must_use]
    pub fn without_kill_switch(mut self) -> Self {
        self.kill_switch = None;
        self
    }

    #[must_use]
    pub fn with_engine_user(mut self, user: Option<String>) -> Self {
        self.engine_user = user;
        self
    }

    pub fn client(&self) -> &ControlSocketClient {
        &self.client
    }

    pub fn kill_switch(&self) -> Option<&KillSwitch> {
        self.kill_switch.as_ref()
    }

    /// Enqueue `track` and return the engine's request ID
    pub async fn push(&self, track: &Path) -> Result<PushReceipt> {
        if let Some(kill_switch) = &self.kill_switch {
            kill_switch.ensure_disengaged()?;
        }

        let identity = Identity::resolve(self.engine_user.as_deref())?;
        let track = validate_track(track, &identity)?;
        let arg = track.to_str().ok_or_else(|| {
            Error::validation(
                "track path",
                track.display().to_string(),
                "is not valid UTF-8",
            )
        })?;

        let command = self
            .client
            .command(&self.verbs.push, [arg], CommandClass::Mutation)?;
        let reply = self.client.execute(&command).await?;
        let reply = reply.trim().to_string();

        let id = match reply.parse::<RequestId>() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(
                    track = %track.display(),
                    reply = %reply,
                    "push answered with a non-numeric request id"
                );
                None
            }
        };
        tracing::info!(track = %track.display(), request = ?id.map(RequestId::get), "track pushed");

        Ok(PushReceipt { track, id, reply })
    }

    /// Push the configured seed track or a random library track.
    /// `Ok(None)` when neither is configured.
    pub async fn seed_from(&self, settings: &SeedSettings) -> Result<Option<PushReceipt>> {
        match pick_seed_track(settings)? {
            Some(track) => self.push(&track).await.map(Some),
            None => {
                tracing::warn!("no seed track or library configured, leaving queue as is");
                Ok(None)
            }
        }
    }

    pub async fn skip(&self) -> Result<String> {
        let command = self
            .client
            .command(&self.verbs.skip, Vec::<String>::new(), CommandClass::Mutation)?;
        let reply = self.client.execute(&command).await?;
        tracing::info!("skipped current track");
        Ok(reply)
    }

    /// Request IDs currently queued, in engine order.
    ///
    /// A transient transport failure is retried once on a fresh connection.
    pub async fn queued_ids(&self) -> Result<Vec<RequestId>> {
        let command = self
            .client
            .command(&self.verbs.queue, Vec::<String>::new(), CommandClass::Query)?;
        let text = command.text();
        let (client, command) = (&self.client, &command);

        let payload = retry_once(&text, || async move {
            let response = client.send(command).await?;
            if response.classification() == &Classification::Empty {
                return Ok(None);
            }
            response.into_result().map(Some)
        })
        .await?;

        let Some(payload) = payload else {
            return Ok(Vec::new());
        };
        payload
            .split_whitespace()
            .map(|token| {
                token.parse::<RequestId>().map_err(|_| {
                    Error::framing(
                        text.clone(),
                        format!("unexpected token '{token}' in queue listing"),
                    )
                })
            })
            .collect()
    }

    pub async fn metadata(&self, id: RequestId) -> Result<Metadata> {
        let command = self.client.command(
            &self.verbs.metadata,
            [id.to_string()],
            CommandClass::Metadata,
        )?;
        let (client, command) = (&self.client, &command);
        let payload =
            retry_once(&command.text(), || async move { client.execute(command).await }).await?;
        Ok(Metadata::parse(&payload))
    }

    /// Queued entries with their track paths, read fresh from the engine
    pub async fn list_queue(&self) -> Result<Vec<QueueEntry>> {
        let ids = self.queued_ids().await?;
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            let metadata = self.metadata(id).await?;
            entries.push(QueueEntry::new(id, metadata.path()));
        }
        Ok(entries)
    }

    /// Ignore every queued request, in order.
    ///
    /// Stops at the first failed ignore with `PartialClear`; later entries are
    /// never attempted. An empty queue clears trivially.
    pub async fn clear_queue(&self, strategy: ClearStrategy) -> Result<ClearReport> {
        let ids = self.queued_ids().await?;
        let total = ids.len();
        if total == 0 {
            tracing::info!("queue already empty");
            return Ok(ClearReport::default());
        }

        let timeout = self.client.timeouts().command;
        let mut session = match strategy {
            ClearStrategy::Persistent => match self.client.session_within(timeout).await {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!(error = %e, "persistent session busy, using fresh connections");
                    None
                }
            },
            ClearStrategy::Ephemeral => None,
        };
        let mut report = ClearReport::default();

        for id in ids {
            let command = self.client.command(
                &self.verbs.ignore,
                [id.to_string()],
                CommandClass::Mutation,
            )?;

            let mut outcome = match session.as_mut() {
                Some(session) => session.invoke(&command, timeout).await,
                None => {
                    self.client
                        .invoke(&command, ConnectionMode::Ephemeral, timeout)
                        .await
                }
            };

            if session.is_some() && matches!(&outcome, Ok(response) if response.is_timeout()) {
                tracing::warn!(
                    request = id.get(),
                    "persistent session timed out, continuing on fresh connections"
                );
                session = None;
                outcome = self
                    .client
                    .invoke(&command, ConnectionMode::Ephemeral, timeout)
                    .await;
            }

            match outcome.and_then(|response| response.into_result()) {
                Ok(_) => {
                    tracing::debug!(request = id.get(), "ignored");
                    report.cleared += 1;
                    report.ids.push(id);
                }
                Err(e) => {
                    tracing::warn!(
                        request = id.get(),
                        cleared = report.cleared,
                        total,
                        error = %e,
                        "clear stopped"
                    );
                    if let Some(session) = session {
                        session.close().await;
                    }
                    return Err(Error::partial_clear(report.cleared, total, e));
                }
            }
        }

        if let Some(session) = session {
            session.close().await;
        }
        tracing::info!(cleared = report.cleared, "queue cleared");
        Ok(report)
    }
}
