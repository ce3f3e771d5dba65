// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # slotwatch Store
//!
//! Persistent state and configuration for slotwatch.
//!
//! This crate provides:
//!
//! - **CredentialStore**: The session blob on disk; corruption reads as absence
//! - **Config**: Environment configuration, validated eagerly
//! - **Persistence**: File I/O helpers for JSON data with restrictive permissions
//!
//! ## Usage
//!
//! ```ignore
//! use slotwatch_store::{Config, CredentialStore};
//!
//! let config = Config::from_env()?;
//! let store = CredentialStore::new(config.credentials_path());
//!
//! match store.load().await {
//!     Some(bundle) => println!("{} cookies", bundle.len()),
//!     None => println!("no session yet"),
//! }
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod persistence;

pub use config::Config;
pub use credentials::CredentialStore;
pub use error::{ConfigError, StoreError};
pub use persistence::{default_state_dir, ensure_dir, load_json, remove_file, save_json};
