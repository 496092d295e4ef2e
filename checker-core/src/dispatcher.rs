//! The end-to-end dispatch loop.
//!
//! For every batch: select an eligible account, obtain or reuse its session,
//! process the numbers sequentially with randomized pacing, append the
//! results, report the consumed quota, then pause before the next batch.
//! Everything runs on one logical thread of control; the pacing delays and
//! remote round-trips are the only suspension points, and the cancellation
//! token is observed at each of them.

use crate::config::Account;
use crate::lookup::{ContactLookupAdapter, LookupOutcome};
use crate::output::ResultWriter;
use crate::pacing::PacingController;
use crate::quota::{today, QuotaStore};
use crate::rotator::AccountRotator;
use crate::session::SessionCache;
use crate::traits::Session;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub processed: u64,
    pub total: u64,
}

pub struct BatchDispatcher {
    rotator: AccountRotator,
    quota: QuotaStore,
    pacing: PacingController,
    adapter: ContactLookupAdapter,
    sessions: SessionCache,
    writer: ResultWriter,
}

impl BatchDispatcher {
    pub fn new(
        rotator: AccountRotator,
        quota: QuotaStore,
        pacing: PacingController,
        adapter: ContactLookupAdapter,
        sessions: SessionCache,
        writer: ResultWriter,
    ) -> Self {
        Self {
            rotator,
            quota,
            pacing,
            adapter,
            sessions,
            writer,
        }
    }

    /// Read access to the quota store, e.g. for reporting.
    pub fn quota(&self) -> &QuotaStore {
        &self.quota
    }

    /// Processes `batches` in order until they are exhausted, no account has
    /// quota left, or `cancel` fires. Sessions are always disconnected
    /// before this returns.
    pub async fn run(
        &mut self,
        batches: &[Vec<String>],
        cancel: CancellationToken,
    ) -> Result<RunStats> {
        let mut stats = RunStats {
            processed: 0,
            total: batches.iter().map(|b| b.len() as u64).sum(),
        };

        for (i, batch) in batches.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }
            info!("--- Processing batch {}/{} ---", i + 1, batches.len());

            // SelectingAccount
            let Some(account) = self.rotator.next_eligible(&self.quota, batch.len()) else {
                warn!("No account has quota left for this batch; halting dispatch.");
                break;
            };

            // Connecting
            match self.sessions.get_or_connect(&account).await {
                Ok(session) => {
                    // ProcessingBatch
                    let (results, batch_error) = self
                        .process_batch(&account, session, batch, &cancel)
                        .await;

                    // Persisting: whatever was gathered is flushed, even
                    // after an abort, so completed lookups are never lost.
                    // Quota counts only lookups whose results actually
                    // reached the output file.
                    if !results.is_empty() {
                        let performed = results.len() as u32;
                        match self.writer.append(&results, &account.phone_number) {
                            Ok(()) => {
                                self.quota
                                    .increment(&account.phone_number, &today(), performed);
                                stats.processed += performed as u64;
                                info!(
                                    "Checked {} numbers with {} ({} used today of its daily limit)",
                                    performed,
                                    account.phone_number,
                                    self.quota.get_used(&account.phone_number, &today())
                                );
                            }
                            Err(e) => {
                                error!("Failed to persist batch {} results: {}", i + 1, e);
                            }
                        }
                    }

                    if let Some(e) = batch_error {
                        error!("Batch {} aborted: {:#}", i + 1, e);
                        self.sessions.evict(&account.phone_number);
                    }
                }
                Err(e) => {
                    error!("Skipping batch {}: {}", i + 1, e);
                }
            }

            if cancel.is_cancelled() {
                break;
            }

            // Pacing: applied between batches whatever the previous batch's
            // outcome, skipped after the final one.
            if i + 1 < batches.len() {
                let pause = self.pacing.inter_batch_delay();
                info!("Pausing {:?} before the next batch...", pause);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(pause) => {}
                }
            }
        }

        self.sessions.disconnect_all().await;

        info!("======================================");
        info!("Dispatch finished.");
        info!("Numbers processed: {} of {}", stats.processed, stats.total);
        info!("Results saved to {}", self.writer.path().display());
        info!("======================================");

        Ok(stats)
    }

    /// Runs the lookups of one batch in order. Returns the results gathered
    /// so far plus the error that aborted the batch, if any. Numbers are
    /// de-duplicated within the batch only.
    async fn process_batch(
        &self,
        account: &Account,
        session: Arc<dyn Session>,
        batch: &[String],
        cancel: &CancellationToken,
    ) -> (Vec<(String, LookupOutcome)>, Option<anyhow::Error>) {
        let mut results: Vec<(String, LookupOutcome)> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for raw in batch {
            if cancel.is_cancelled() {
                break;
            }
            let phone: String = raw.split_whitespace().collect();
            if phone.is_empty() || !seen.insert(phone.clone()) {
                continue;
            }

            if !results.is_empty() {
                let delay = self.pacing.inter_request_delay(account);
                info!("Pausing {:.2}s before the next number...", delay.as_secs_f64());
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(delay) => {}
                }
            }

            match self.adapter.lookup(session.as_ref(), &phone).await {
                Ok(outcome) => results.push((phone, outcome)),
                Err(e) => return (results, Some(e)),
            }
        }

        (results, None)
    }
}
