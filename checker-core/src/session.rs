//! Session cache: at most one live session per account, reused across
//! batches within a run.

use crate::config::Account;
use crate::error::SessionError;
use crate::traits::{Connector, Session};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct SessionCache {
    connector: Arc<dyn Connector>,
    sessions: HashMap<String, Arc<dyn Session>>,
}

impl SessionCache {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            sessions: HashMap::new(),
        }
    }

    /// Returns the cached session for `account` when it is still live,
    /// otherwise establishes a new one through the connector.
    pub async fn get_or_connect(
        &mut self,
        account: &Account,
    ) -> Result<Arc<dyn Session>, SessionError> {
        if let Some(session) = self.sessions.get(&account.phone_number) {
            if session.is_connected() {
                return Ok(Arc::clone(session));
            }
        }

        info!("Connecting account {}...", account.phone_number);
        let session = self.connector.connect(account).await?;
        self.sessions
            .insert(account.phone_number.clone(), Arc::clone(&session));
        Ok(session)
    }

    /// Drops the cached session for `account_id`, e.g. after it was lost.
    pub fn evict(&mut self, account_id: &str) {
        self.sessions.remove(account_id);
    }

    /// Gracefully disconnects every cached session. Called unconditionally
    /// on shutdown, whatever state the dispatcher halted in.
    pub async fn disconnect_all(&mut self) {
        for (account_id, session) in self.sessions.drain() {
            if session.is_connected() {
                info!("Disconnecting account {}...", account_id);
                if let Err(e) = session.disconnect().await {
                    warn!("Failed to disconnect {}: {:#}", account_id, e);
                }
            }
        }
    }
}
