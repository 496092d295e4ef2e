//! Round-robin selection of the next account with quota headroom.

use crate::config::Account;
use crate::quota::{today, QuotaStore};
use tracing::{info, warn};

pub struct AccountRotator {
    accounts: Vec<Account>,
    index: usize,
    daily_limit: u32,
}

impl AccountRotator {
    pub fn new(accounts: Vec<Account>, daily_limit: u32) -> Self {
        Self {
            accounts,
            index: 0,
            daily_limit,
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Returns the next account whose usage plus `batch_size` stays within
    /// the daily limit, or `None` when a full scan finds no headroom.
    ///
    /// The scan is strict round-robin from the current index; the index
    /// advances to one past the *selected* account only, so accounts that
    /// were merely checked and found full keep their place in the order.
    pub fn next_eligible(&mut self, quota: &QuotaStore, batch_size: usize) -> Option<Account> {
        let n = self.accounts.len();
        let date = today();
        for offset in 0..n {
            let idx = (self.index + offset) % n;
            let account = &self.accounts[idx];
            let used = quota.get_used(&account.phone_number, &date);
            if used as usize + batch_size <= self.daily_limit as usize {
                self.index = (idx + 1) % n;
                info!(
                    "Switching to account {} (used today: {}, limit: {})",
                    account.phone_number, used, self.daily_limit
                );
                return Some(account.clone());
            }
        }
        warn!("No account has remaining quota for a batch of {}", batch_size);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(phone: &str) -> Account {
        Account {
            phone_number: phone.to_string(),
            api_id: 1,
            api_hash: "hash".to_string(),
            session_name: None,
            request_pause_min: None,
            request_pause_max: None,
        }
    }

    fn rotator(phones: &[&str], limit: u32) -> AccountRotator {
        AccountRotator::new(phones.iter().map(|p| account(p)).collect(), limit)
    }

    #[test]
    fn round_robin_is_fair_with_headroom() {
        let quota = QuotaStore::in_memory();
        let mut rot = rotator(&["+1", "+2", "+3"], 50);
        let picks: Vec<String> = (0..4)
            .map(|_| rot.next_eligible(&quota, 10).unwrap().phone_number)
            .collect();
        assert_eq!(picks, ["+1", "+2", "+3", "+1"]);
    }

    #[test]
    fn skips_accounts_without_headroom() {
        let mut quota = QuotaStore::in_memory();
        let date = today();
        quota.increment("+1", &date, 45);
        let mut rot = rotator(&["+1", "+2"], 50);
        assert_eq!(
            rot.next_eligible(&quota, 10).unwrap().phone_number,
            "+2".to_string()
        );
    }

    #[test]
    fn used_plus_batch_exactly_at_limit_is_eligible() {
        let mut quota = QuotaStore::in_memory();
        quota.increment("+1", &today(), 40);
        let mut rot = rotator(&["+1"], 50);
        assert!(rot.next_eligible(&quota, 10).is_some());
        quota.increment("+1", &today(), 10);
        assert!(rot.next_eligible(&quota, 1).is_none());
    }

    #[test]
    fn exhaustion_returns_none() {
        let mut quota = QuotaStore::in_memory();
        let date = today();
        for phone in ["+1", "+2", "+3"] {
            quota.increment(phone, &date, 45);
        }
        let mut rot = rotator(&["+1", "+2", "+3"], 50);
        assert!(rot.next_eligible(&quota, 10).is_none());
    }

    #[test]
    fn oversized_batch_can_never_be_satisfied() {
        let quota = QuotaStore::in_memory();
        let mut rot = rotator(&["+1", "+2"], 50);
        assert!(rot.next_eligible(&quota, 51).is_none());
    }

    #[test]
    fn checked_but_unselected_accounts_keep_their_turn() {
        let mut quota = QuotaStore::in_memory();
        let date = today();
        quota.increment("+1", &date, 50);
        let mut rot = rotator(&["+1", "+2", "+3"], 50);

        // "+1" is full, so "+2" is selected; the pointer lands on "+3".
        assert_eq!(rot.next_eligible(&quota, 1).unwrap().phone_number, "+2");
        assert_eq!(rot.next_eligible(&quota, 1).unwrap().phone_number, "+3");
    }
}
