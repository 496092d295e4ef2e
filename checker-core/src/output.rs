//! Append-only CSV result output.
//!
//! The header is written once, iff the file is absent or empty; every later
//! run strictly appends rows. Each row is tagged with the account that
//! performed the check.

use crate::error::StorageError;
use crate::lookup::{LookupOutcome, Profile};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const RESULT_HEADER: [&str; 19] = [
    "phone_number",
    "found",
    "id",
    "username",
    "usernames",
    "first_name",
    "last_name",
    "fake",
    "verified",
    "premium",
    "mutual_contact",
    "bot",
    "bot_chat_history",
    "restricted",
    "restriction_reason",
    "user_was_online",
    "phone",
    "error",
    "checked_by_account",
];

pub struct ResultWriter {
    path: PathBuf,
}

impl ResultWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, e: impl std::fmt::Display) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            msg: e.to_string(),
        }
    }

    fn csv_err(&self, e: csv::Error) -> StorageError {
        StorageError::Csv {
            path: self.path.display().to_string(),
            msg: e.to_string(),
        }
    }

    fn write_header_if_needed(&self) -> Result<(), StorageError> {
        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(self.io_err(e)),
        };
        if !needs_header {
            return Ok(());
        }
        let mut writer = csv::Writer::from_path(&self.path).map_err(|e| self.csv_err(e))?;
        writer
            .write_record(RESULT_HEADER)
            .map_err(|e| self.csv_err(e))?;
        writer.flush().map_err(|e| self.io_err(e))?;
        Ok(())
    }

    /// Appends one row per result, tagged with `checked_by`.
    pub fn append(
        &self,
        results: &[(String, LookupOutcome)],
        checked_by: &str,
    ) -> Result<(), StorageError> {
        self.write_header_if_needed()?;

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        let mut writer = csv::Writer::from_writer(file);
        for (phone, outcome) in results {
            writer
                .write_record(row_for(phone, outcome, checked_by))
                .map_err(|e| self.csv_err(e))?;
        }
        writer.flush().map_err(|e| self.io_err(e))?;
        Ok(())
    }
}

fn row_for(phone: &str, outcome: &LookupOutcome, checked_by: &str) -> Vec<String> {
    match outcome {
        LookupOutcome::Found(profile) => found_row(phone, profile, checked_by),
        LookupOutcome::Failed(failure) => {
            let mut row = vec![phone.to_string(), "No".to_string()];
            row.extend(std::iter::repeat(String::new()).take(15));
            row.push(failure.message());
            row.push(checked_by.to_string());
            row
        }
    }
}

fn found_row(phone: &str, profile: &Profile, checked_by: &str) -> Vec<String> {
    let usernames = if profile.usernames.is_empty() {
        String::new()
    } else {
        serde_json::to_string(&profile.usernames).unwrap_or_default()
    };
    vec![
        phone.to_string(),
        "Yes".to_string(),
        profile.id.to_string(),
        profile.username.clone().unwrap_or_default(),
        usernames,
        profile.first_name.clone().unwrap_or_default(),
        profile.last_name.clone().unwrap_or_default(),
        profile.fake.to_string(),
        profile.verified.to_string(),
        profile.premium.to_string(),
        profile.mutual_contact.to_string(),
        profile.bot.to_string(),
        profile.bot_chat_history.to_string(),
        profile.restricted.to_string(),
        profile.restriction_reason.clone().unwrap_or_default(),
        profile.last_seen.clone().unwrap_or_default(),
        profile.phone.clone().unwrap_or_default(),
        String::new(),
        checked_by.to_string(),
    ]
}
