// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # slotwatch Daemon
//!
//! The two long-running loops of the `slotwatch` binary and the state they
//! share.
//!
//! - [`poller`] - Timed fetch/classify/dispatch loop that owns the known set
//! - [`commands`] - Long-poll loop answering `/start` and `/check`; owns the
//!   command offset
//! - [`session`] - The credential bundle both loops read, with single-flight
//!   reauthentication
//! - [`source`] - One authenticated schedule fetch, shared by both loops
//! - [`notifications`] - Rendering and best-effort delivery of slot lists
//! - [`supervisor`] - Restarts a loop whose task stops

pub mod commands;
pub mod notifications;
pub mod poller;
pub mod session;
pub mod source;
pub mod supervisor;

pub use commands::CommandChannel;
pub use notifications::Dispatcher;
pub use poller::{CycleOutcome, PollOrchestrator, PollState};
pub use session::{RefreshOutcome, SessionManager, SessionTicket};
pub use source::{FetchOutcome, SlotSource};
pub use supervisor::Supervisor;
