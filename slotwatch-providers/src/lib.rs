// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # slotwatch Providers
//!
//! Concrete collaborators behind the core traits.
//!
//! ## Modules
//!
//! - [`lks`] - The monitored schedule endpoint: payload parsing and the
//!   external login helper ([`Reauthenticator`](slotwatch_core::Reauthenticator))
//! - [`telegram`] - Bot API client ([`Messenger`](slotwatch_core::Messenger))

pub mod lks;
pub mod telegram;

pub use lks::{parse_schedule, LoginHelper};
pub use telegram::TelegramClient;
