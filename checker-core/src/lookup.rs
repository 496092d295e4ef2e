//! Single-number lookup built on temporary contact import.
//!
//! The flow mirrors how the platform exposes phone resolution: import the
//! number as a contact, read the matched profile, delete the contact again.
//! The adapter owns that side effect and guarantees the reversal is at least
//! attempted on every path; a reversal that fails is surfaced in the failure
//! message, never swallowed.

use crate::traits::Session;
use anyhow::Result;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Profile record for a registered number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub usernames: Vec<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub fake: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub premium: bool,
    #[serde(default)]
    pub mutual_contact: bool,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub bot_chat_history: bool,
    #[serde(default)]
    pub restricted: bool,
    #[serde(default)]
    pub restriction_reason: Option<String>,
    /// Human-readable last-seen descriptor, e.g. "Last seen recently".
    #[serde(default)]
    pub last_seen: Option<String>,
    /// Canonical phone number as the platform reports it.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Exactly one of these is produced per phone number.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found(Profile),
    Failed(LookupFailure),
}

#[derive(Debug, Clone)]
pub enum LookupFailure {
    /// Number unregistered, or the user blocks contact imports.
    NotFound,
    /// More than one account resolved to the number; identity cannot be
    /// determined, so this is always a failure.
    Ambiguous,
    /// Transient or unexpected error, with a message.
    Transient(String),
}

impl LookupFailure {
    pub fn message(&self) -> String {
        match self {
            LookupFailure::NotFound => {
                "Number not registered, or the user blocks being added as a contact.".to_string()
            }
            LookupFailure::Ambiguous => {
                "Multiple accounts are registered for this number; identity cannot be determined."
                    .to_string()
            }
            LookupFailure::Transient(msg) => msg.clone(),
        }
    }
}

// Plain decoy names for the temporary contact entry; a blank or repeated
// name makes the import pattern stand out.
const DECOY_FIRST_NAMES: &[&str] = &[
    "Alex", "Max", "Ivan", "Daniel", "Egor", "Andrey", "Alexey", "Kirill", "Ilya", "Matvey",
    "Roman", "Sergey", "Vladimir", "Pavel", "Gleb", "Viktor", "Anton", "Vasily", "Grigory",
    "Evgeny", "Konstantin", "Leonid", "Oleg", "Ruslan",
];

fn decoy_first_name() -> &'static str {
    DECOY_FIRST_NAMES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Alex")
}

const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Wraps a [`Session`]'s contact operations into the one-number lookup
/// contract.
pub struct ContactLookupAdapter {
    /// Pause between the import and its reversal, so the platform has
    /// settled the contact before it is removed again.
    settle_delay: Duration,
}

impl Default for ContactLookupAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactLookupAdapter {
    pub fn new() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }

    /// Looks up one normalized phone number through `session`.
    ///
    /// `Ok(outcome)` carries the per-number result, failures included; `Err`
    /// means the session itself is gone and the batch must stop.
    pub async fn lookup(
        &self,
        session: &dyn Session,
        phone_number: &str,
    ) -> Result<LookupOutcome> {
        let phone = if phone_number.starts_with('+') {
            phone_number.to_string()
        } else {
            format!("+{phone_number}")
        };
        info!("Checking number {}...", phone);

        let user_ids = match session.import_contact(&phone, decoy_first_name()).await {
            Ok(ids) => ids,
            Err(e) => {
                if !session.is_connected() {
                    return Err(e.context(format!("session lost while importing {phone}")));
                }
                return Ok(LookupOutcome::Failed(LookupFailure::Transient(format!(
                    "Contact import failed for {phone}: {e:#}"
                ))));
            }
        };

        match user_ids.as_slice() {
            [] => Ok(LookupOutcome::Failed(LookupFailure::NotFound)),
            [user_id] => {
                debug!("Pausing {:?} before removing temporary contact", self.settle_delay);
                sleep(self.settle_delay).await;
                match session.delete_contact(*user_id).await {
                    Ok(profile) => Ok(LookupOutcome::Found(profile)),
                    Err(e) => {
                        if !session.is_connected() {
                            return Err(e.context(format!(
                                "session lost before the temporary contact for {phone} was removed"
                            )));
                        }
                        Ok(LookupOutcome::Failed(LookupFailure::Transient(format!(
                            "Failed to remove temporary contact for {phone}: {e:#}"
                        ))))
                    }
                }
            }
            ids => {
                // Still reverse every import before reporting the ambiguity.
                sleep(self.settle_delay).await;
                let mut cleanup_errors = Vec::new();
                for id in ids {
                    if let Err(e) = session.delete_contact(*id).await {
                        cleanup_errors.push(format!("user {id}: {e:#}"));
                    }
                }
                if cleanup_errors.is_empty() {
                    Ok(LookupOutcome::Failed(LookupFailure::Ambiguous))
                } else {
                    Ok(LookupOutcome::Failed(LookupFailure::Transient(format!(
                        "Multiple accounts matched {phone} and contact cleanup failed: {}",
                        cleanup_errors.join("; ")
                    ))))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedSession {
        import_result: Mutex<Result<Vec<i64>>>,
        delete_fails: bool,
        connected: AtomicBool,
        deletes: AtomicUsize,
    }

    impl ScriptedSession {
        fn importing(ids: Vec<i64>) -> Self {
            Self {
                import_result: Mutex::new(Ok(ids)),
                delete_fails: false,
                connected: AtomicBool::new(true),
                deletes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Session for ScriptedSession {
        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        async fn import_contact(&self, _phone: &str, _first_name: &str) -> Result<Vec<i64>> {
            let mut guard = self.import_result.lock().unwrap();
            std::mem::replace(&mut *guard, Ok(Vec::new()))
        }

        async fn delete_contact(&self, user_id: i64) -> Result<Profile> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            if self.delete_fails {
                return Err(anyhow!("delete rejected"));
            }
            Ok(Profile {
                id: user_id,
                username: Some("someone".to_string()),
                ..Profile::default()
            })
        }

        async fn disconnect(&self) -> Result<()> {
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    fn adapter() -> ContactLookupAdapter {
        ContactLookupAdapter::with_settle_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn no_match_is_not_found() {
        let session = ScriptedSession::importing(vec![]);
        let outcome = adapter().lookup(&session, "+15550001").await.unwrap();
        assert!(matches!(
            outcome,
            LookupOutcome::Failed(LookupFailure::NotFound)
        ));
    }

    #[tokio::test]
    async fn single_match_yields_profile_and_removes_contact() {
        let session = ScriptedSession::importing(vec![42]);
        let outcome = adapter().lookup(&session, "15550001").await.unwrap();
        match outcome {
            LookupOutcome::Found(profile) => assert_eq!(profile.id, 42),
            other => panic!("expected Found, got {other:?}"),
        }
        assert_eq!(session.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn multiple_matches_are_ambiguous_after_cleanup() {
        let session = ScriptedSession::importing(vec![1, 2]);
        let outcome = adapter().lookup(&session, "+15550001").await.unwrap();
        assert!(matches!(
            outcome,
            LookupOutcome::Failed(LookupFailure::Ambiguous)
        ));
        // Every imported contact was reversed.
        assert_eq!(session.deletes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_reversal_is_surfaced_not_swallowed() {
        let mut session = ScriptedSession::importing(vec![7]);
        session.delete_fails = true;
        let outcome = adapter().lookup(&session, "+15550001").await.unwrap();
        match outcome {
            LookupOutcome::Failed(LookupFailure::Transient(msg)) => {
                assert!(msg.contains("remove temporary contact"));
            }
            other => panic!("expected Transient, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn import_error_on_live_session_is_transient() {
        let session = ScriptedSession::importing(vec![]);
        *session.import_result.lock().unwrap() = Err(anyhow!("flood wait"));
        let outcome = adapter().lookup(&session, "+15550001").await.unwrap();
        assert!(matches!(
            outcome,
            LookupOutcome::Failed(LookupFailure::Transient(_))
        ));
    }

    #[tokio::test]
    async fn import_error_on_dead_session_aborts() {
        let session = ScriptedSession::importing(vec![]);
        *session.import_result.lock().unwrap() = Err(anyhow!("broken pipe"));
        session.connected.store(false, Ordering::SeqCst);
        assert!(adapter().lookup(&session, "+15550001").await.is_err());
    }
}
