//! # Checker Core - Rate-limited Multi-account Dispatch
//!
//! Shared logic for checking phone-number registration on a messaging
//! platform through a pool of accounts, without blowing any account's daily
//! request quota.
//!
//! ## Modules
//!
//! - [`batch`] - Batched phone-number input
//! - [`config`] - Accounts and global settings
//! - [`dispatcher`] - The batch dispatch loop
//! - [`error`] - Typed error handling with thiserror
//! - [`lookup`] - Single-number lookup over temporary contact import
//! - [`output`] - Append-only CSV result output
//! - [`pacing`] - Inter-request and inter-batch delays
//! - [`quota`] - Durable per-account daily usage
//! - [`rotator`] - Round-robin account selection
//! - [`session`] - Per-account session cache
//! - [`traits`] - Session, connector and credential-provider seams

pub mod batch;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod lookup;
pub mod output;
pub mod pacing;
pub mod quota;
pub mod rotator;
pub mod session;
pub mod traits;
pub(crate) mod utils;

pub use config::{Account, CheckerConfig, Settings};
pub use dispatcher::{BatchDispatcher, RunStats};
pub use error::{ConfigError, InputError, SessionError, StorageError};
pub use lookup::{ContactLookupAdapter, LookupFailure, LookupOutcome, Profile};
pub use output::ResultWriter;
pub use pacing::PacingController;
pub use quota::{today, QuotaStore};
pub use rotator::AccountRotator;
pub use session::SessionCache;
pub use traits::{Connector, CredentialProvider, Session};
pub use utils::setup_logger;
