//! # Core Error Types
//!
//! Centralized error definitions for the checker-core crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse config {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Input-source errors. These are fatal: no dispatch happens without input.
#[derive(Error, Debug, Clone)]
pub enum InputError {
    #[error("Input file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read input {path}: {msg}")]
    Read { path: String, msg: String },
}

/// Session establishment and reuse errors
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    #[error("Failed to connect account {account}: {reason}")]
    ConnectFailed { account: String, reason: String },

    #[error("Account {account} is not authorized: {reason}")]
    NotAuthorized { account: String, reason: String },

    #[error("Connection lost for account {account}: {reason}")]
    Lost { account: String, reason: String },
}

/// Durable-output errors (result CSV, quota file)
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("I/O error writing {path}: {msg}")]
    Io { path: String, msg: String },

    #[error("CSV error writing {path}: {msg}")]
    Csv { path: String, msg: String },
}
