use crate::config::Account;
use crate::error::SessionError;
use crate::lookup::Profile;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A live, authorized connection to the platform for one account.
///
/// The contact operations are the opaque remote surface of the lookup: the
/// adapter composes them, implementations own the wire protocol.
#[async_trait]
pub trait Session: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Imports `phone` as a temporary contact under `first_name` and
    /// returns the ids of every user the number resolved to.
    async fn import_contact(&self, phone: &str, first_name: &str) -> Result<Vec<i64>>;

    /// Removes a previously imported contact and returns the fresh profile
    /// of that user.
    async fn delete_contact(&self, user_id: i64) -> Result<Profile>;

    async fn disconnect(&self) -> Result<()>;
}

/// Establishes sessions. Connecting is a multi-step handshake and may pull
/// credentials through a [`CredentialProvider`]; either it yields a usable
/// session or it fails for that account.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, account: &Account) -> Result<Arc<dyn Session>, SessionError>;
}

/// Supplies interactive credentials during the connect handshake, keeping
/// terminal I/O out of the dispatch loop.
pub trait CredentialProvider: Send + Sync {
    fn login_code(&self, account_id: &str) -> Result<String>;
    fn two_factor_password(&self, account_id: &str) -> Result<String>;
}
