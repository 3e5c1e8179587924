//! Queue-level operations on the engine
//!
//! Built on the control-socket client: pushing tracks, skipping, listing and
//! clearing the request queue, metadata lookups, and the kill switch that
//! gates every automated push.

pub mod controller;
pub mod kill_switch;
pub mod metadata;
pub mod seed;
pub mod validate;

pub use controller::{ClearReport, ClearStrategy, PushReceipt, QueueController, QueueVerbs};
pub use kill_switch::KillSwitch;
pub use metadata::Metadata;
pub use seed::{pick_seed_track, random_track};
pub use validate::{validate_track, Identity};
