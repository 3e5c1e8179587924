//! Client side of the engine's line-oriented control socket
//!
//! Everything that talks to the engine goes through [`ControlSocketClient`]:
//! commands are framed by [`CommandProtocol`], carried over a
//! [`SocketConnection`] and come back as exactly one classified [`Response`].
//! [`ReadinessProbe`] answers the separate question of whether the socket is
//! usable at all.

pub mod client;
pub mod codec;
pub mod command;
pub mod connection;
pub mod probe;
pub mod response;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{ClientTimeouts, ControlSocketClient, PersistentSession};
pub use codec::CommandProtocol;
pub use command::{Command, CommandClass};
pub use connection::{ConnectionMode, ConnectionState, SocketConnection};
pub use probe::{ProbeOutcome, ReadinessProbe};
pub use response::{Classification, ErrorVocabulary, Response};
