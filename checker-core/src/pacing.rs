//! Request pacing: randomized spacing within a batch, fixed spacing between
//! batches. Randomized gaps break up the request pattern; the fixed batch
//! pause keeps total run time predictable.

use crate::config::{Account, Settings};
use rand::Rng;
use std::time::Duration;

pub struct PacingController {
    batch_pause: Duration,
    default_min_secs: u64,
    default_max_secs: u64,
}

impl PacingController {
    pub fn new(settings: &Settings) -> Self {
        Self {
            batch_pause: Duration::from_secs(settings.batch_pause_seconds),
            default_min_secs: settings.request_pause_min,
            default_max_secs: settings.request_pause_max,
        }
    }

    /// Uniformly random delay in `[min, max]` seconds, applied before every
    /// lookup except the first of a batch. Per-account overrides win over
    /// the global defaults.
    pub fn inter_request_delay(&self, account: &Account) -> Duration {
        let min = account.request_pause_min.unwrap_or(self.default_min_secs);
        let max = account
            .request_pause_max
            .unwrap_or(self.default_max_secs)
            .max(min);
        let secs = rand::thread_rng().gen_range(min as f64..=max as f64);
        Duration::from_secs_f64(secs)
    }

    /// Fixed delay between batches, skipped after the final batch.
    pub fn inter_batch_delay(&self) -> Duration {
        self.batch_pause
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(min: Option<u64>, max: Option<u64>) -> Account {
        Account {
            phone_number: "+15550001".to_string(),
            api_id: 1,
            api_hash: "hash".to_string(),
            session_name: None,
            request_pause_min: min,
            request_pause_max: max,
        }
    }

    fn settings(batch: u64, min: u64, max: u64) -> Settings {
        Settings {
            batch_pause_seconds: batch,
            request_pause_min: min,
            request_pause_max: max,
            ..Settings::default()
        }
    }

    #[test]
    fn request_delay_stays_within_bounds() {
        let pacing = PacingController::new(&settings(120, 2, 5));
        let acct = account(None, None);
        for _ in 0..100 {
            let d = pacing.inter_request_delay(&acct);
            assert!(d >= Duration::from_secs(2) && d <= Duration::from_secs(5));
        }
    }

    #[test]
    fn per_account_overrides_take_precedence() {
        let pacing = PacingController::new(&settings(120, 100, 200));
        let acct = account(Some(1), Some(1));
        assert_eq!(pacing.inter_request_delay(&acct), Duration::from_secs(1));
    }

    #[test]
    fn batch_delay_is_fixed() {
        let pacing = PacingController::new(&settings(30, 1, 2));
        assert_eq!(pacing.inter_batch_delay(), Duration::from_secs(30));
    }
}
