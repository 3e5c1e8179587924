//! In-process stand-in for the engine's control socket.
//!
//! Speaks the same line protocol with the default verbs and keeps a small
//! request queue, so clients, the queue controller and the CLI can be tested
//! without a real engine. Behaviour can be bent per test: reject a command,
//! hang on a verb, or go completely silent.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::{JoinHandle, JoinSet};

#[derive(Debug, Default)]
struct EngineState {
    queue: Vec<(u64, PathBuf)>,
    next_id: u64,
    commands: Vec<String>,
    connections: usize,
    rejections: HashMap<String, String>,
    hang: HashSet<String>,
    hang_on_reuse: HashSet<String>,
    empty: HashSet<String>,
    mute: bool,
}

enum Reply {
    Text(String),
    Hang,
}

/// A fake engine listening on a Unix socket until dropped
#[derive(Debug)]
pub struct FakeEngine {
    path: PathBuf,
    state: Arc<Mutex<EngineState>>,
    accept: JoinHandle<()>,
}

impl FakeEngine {
    /// Bind `path` and start answering. Must be called inside a runtime.
    pub fn start(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        let listener = UnixListener::bind(&path)?;
        let state = Arc::new(Mutex::new(EngineState {
            next_id: 1,
            ..EngineState::default()
        }));

        let accept = tokio::spawn(accept_loop(listener, Arc::clone(&state)));
        Ok(Self {
            path,
            state,
            accept,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.path
    }

    /// Put a request on the queue as if it had been pushed
    pub fn enqueue(&self, path: impl Into<PathBuf>) -> u64 {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.queue.push((id, path.into()));
        id
    }

    /// Replace the queue with the given IDs, each with a made-up file
    pub fn seed_queue(&self, ids: &[u64]) {
        let mut state = self.state.lock();
        state.queue = ids
            .iter()
            .map(|id| (*id, PathBuf::from(format!("/music/track-{id}.mp3"))))
            .collect();
        state.next_id = ids.iter().max().map_or(1, |max| max + 1);
    }

    /// Answer exactly `command` with `reply` and skip its effect
    pub fn reject(&self, command: impl Into<String>, reply: impl Into<String>) {
        self.state
            .lock()
            .rejections
            .insert(command.into(), reply.into());
    }

    /// Never answer `verb`
    pub fn hang(&self, verb: impl Into<String>) {
        self.state.lock().hang.insert(verb.into());
    }

    /// Never answer `verb` unless it is the first command on its connection
    pub fn hang_on_reuse(&self, verb: impl Into<String>) {
        self.state.lock().hang_on_reuse.insert(verb.into());
    }

    /// Answer `verb` with nothing but the terminator
    pub fn answer_empty(&self, verb: impl Into<String>) {
        self.state.lock().empty.insert(verb.into());
    }

    /// Accept connections but never answer anything
    pub fn mute(&self) {
        self.state.lock().mute = true;
    }

    /// Every command line received, in arrival order
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().commands.clone()
    }

    pub fn queue_ids(&self) -> Vec<u64> {
        self.state.lock().queue.iter().map(|(id, _)| *id).collect()
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.state.lock().connections
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.accept.abort();
        let _ = std::fs::remove_file(&self.path);
    }
}

async fn accept_loop(listener: UnixListener, state: Arc<Mutex<EngineState>>) {
    // Dropping the set when this task is aborted tears down every session.
    let mut sessions = JoinSet::new();
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                state.lock().connections += 1;
                sessions.spawn(serve(stream, Arc::clone(&state)));
            }
            Err(e) => {
                tracing::debug!(error = %e, "fake engine accept failed");
                return;
            }
        }
        while sessions.try_join_next().is_some() {}
    }
}

async fn serve(stream: UnixStream, state: Arc<Mutex<EngineState>>) {
    let mut stream = BufReader::new(stream);
    let mut line = String::new();
    let mut served = 0usize;

    loop {
        line.clear();
        match stream.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let command = line.trim_end_matches(['\r', '\n']).to_string();
        let reply = respond(&state, &command, served);
        served += 1;

        match reply {
            Reply::Hang => std::future::pending::<()>().await,
            Reply::Text(text) => {
                let mut frame = text;
                if !frame.is_empty() {
                    frame.push('\n');
                }
                frame.push_str("END\n");
                if stream.get_mut().write_all(frame.as_bytes()).await.is_err() {
                    return;
                }
            }
        }
    }
}

fn respond(state: &Mutex<EngineState>, command: &str, served: usize) -> Reply {
    let mut state = state.lock();
    state.commands.push(command.to_string());

    let (verb, arg) = command
        .split_once(' ')
        .map_or((command, ""), |(verb, arg)| (verb, arg.trim()));

    if state.mute
        || state.hang.contains(verb)
        || (served > 0 && state.hang_on_reuse.contains(verb))
    {
        return Reply::Hang;
    }
    if let Some(reply) = state.rejections.get(command) {
        return Reply::Text(reply.clone());
    }
    if state.empty.contains(verb) {
        return Reply::Text(String::new());
    }

    let text = match verb {
        "help" => [
            "Available commands:",
            "| help",
            "| queue.ignore <rid>",
            "| queue.push <uri>",
            "| queue.queue",
            "| queue.skip",
            "| request.metadata <rid>",
        ]
        .join("\n"),
        "queue.queue" => state
            .queue
            .iter()
            .map(|(id, _)| id.to_string())
            .collect::<Vec<_>>()
            .join(" "),
        "queue.push" if !arg.is_empty() => {
            let id = state.next_id;
            state.next_id += 1;
            state.queue.push((id, PathBuf::from(arg)));
            id.to_string()
        }
        "queue.ignore" => {
            let id = arg.parse::<u64>().ok();
            let before = state.queue.len();
            state.queue.retain(|(queued, _)| Some(*queued) != id);
            if state.queue.len() < before {
                "OK".to_string()
            } else {
                "ERROR: No such request".to_string()
            }
        }
        "queue.skip" => "Done".to_string(),
        "request.metadata" => {
            let found = arg
                .parse::<u64>()
                .ok()
                .and_then(|id| state.queue.iter().find(|(queued, _)| *queued == id));
            match found {
                Some((id, path)) => {
                    let path = path
                        .display()
                        .to_string()
                        .replace('\\', "\\\\")
                        .replace('"', "\\\"");
                    format!(
                        "rid=\"{id}\"\nfilename=\"{path}\"\ninitial_uri=\"{path}\"\nstatus=\"ready\""
                    )
                }
                None => "No such request.".to_string(),
            }
        }
        _ => "ERROR: unknown command, type `help` to get a list of commands.".to_string(),
    };
    Reply::Text(text)
}
