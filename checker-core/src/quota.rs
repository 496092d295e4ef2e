//! Durable per-account daily usage tracking.
//!
//! The backing file maps account identifier -> calendar date -> request
//! count. It is rewritten in full, atomically, after every increment so a
//! crash loses at most the in-flight batch's update.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

type Records = HashMap<String, HashMap<String, u32>>;

/// Today's calendar date in process-local time, ISO 8601.
pub fn today() -> String {
    chrono::Local::now().date_naive().to_string()
}

pub struct QuotaStore {
    path: Option<PathBuf>,
    records: Records,
}

impl QuotaStore {
    /// Loads the store from `path`, creating an empty one when the file is
    /// absent or unreadable. Any account whose record does not mention today
    /// is reset to `{today: 0}`: usage never carries across days.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut records: Records = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(records) => records,
                Err(e) => {
                    error!("Failed to parse quota file {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                error!("Failed to read quota file {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        let today = today();
        for usage in records.values_mut() {
            if !usage.contains_key(&today) {
                *usage = HashMap::from([(today.clone(), 0)]);
            }
        }

        Self {
            path: Some(path),
            records,
        }
    }

    /// A store with no backing file; nothing is ever persisted.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: HashMap::new(),
        }
    }

    /// Recorded usage for `(account_id, date)`, zero when absent.
    pub fn get_used(&self, account_id: &str, date: &str) -> u32 {
        self.records
            .get(account_id)
            .and_then(|usage| usage.get(date))
            .copied()
            .unwrap_or(0)
    }

    /// Adds `delta` to the record for `(account_id, date)` and persists the
    /// whole store before returning. Persistence failures are logged and
    /// swallowed: quota tracking degrades to in-memory for this run rather
    /// than aborting the dispatch.
    pub fn increment(&mut self, account_id: &str, date: &str, delta: u32) {
        let usage = self.records.entry(account_id.to_string()).or_default();
        let count = usage.entry(date.to_string()).or_insert(0);
        *count += delta;

        if let Some(path) = self.path.clone() {
            if let Err(e) = self.persist(&path) {
                warn!(
                    "Failed to persist quota state to {}: {}; continuing in-memory",
                    path.display(),
                    e
                );
            }
        }
    }

    fn persist(&self, path: &Path) -> std::io::Result<()> {
        let serialized = serde_json::to_string_pretty(&self.records)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        // Write-then-rename so readers never observe a torn file.
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(serialized.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absent_entry_reads_as_zero() {
        let store = QuotaStore::in_memory();
        assert_eq!(store.get_used("+15550001", &today()), 0);
    }

    #[test]
    fn increments_accumulate_within_a_day() {
        let mut store = QuotaStore::in_memory();
        let date = today();
        store.increment("+15550001", &date, 10);
        store.increment("+15550001", &date, 7);
        assert_eq!(store.get_used("+15550001", &date), 17);
        assert_eq!(store.get_used("+15550002", &date), 0);
    }

    #[test]
    fn reload_resets_accounts_with_stale_dates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("limits.json");
        fs::write(
            &path,
            r#"{"+15550001": {"2020-01-01": 49}, "+15550002": {"2020-01-01": 3}}"#,
        )
        .unwrap();

        let store = QuotaStore::load(&path);
        assert_eq!(store.get_used("+15550001", &today()), 0);
        assert_eq!(store.get_used("+15550002", &today()), 0);
        // The stale date is gone entirely, not carried forward.
        assert_eq!(store.get_used("+15550001", "2020-01-01"), 0);
    }

    #[test]
    fn increments_survive_a_reload_same_day() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("limits.json");
        let date = today();

        let mut store = QuotaStore::load(&path);
        store.increment("+15550001", &date, 10);
        drop(store);

        let reloaded = QuotaStore::load(&path);
        assert_eq!(reloaded.get_used("+15550001", &date), 10);
    }

    #[test]
    fn corrupt_file_degrades_to_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("limits.json");
        fs::write(&path, "not json at all").unwrap();

        let store = QuotaStore::load(&path);
        assert_eq!(store.get_used("+15550001", &today()), 0);
    }
}
