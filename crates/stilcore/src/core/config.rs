use once_cell::sync::Lazy;
use std::env;

/// Snapshot file path
/// Read from STORE_PATH environment variable
/// Supports tilde (~) expansion for home directory
/// Default: data/store.json
pub static STORE_PATH: Lazy<String> =
    Lazy::new(|| env::var("STORE_PATH").unwrap_or_else(|_| "data/store.json".to_string()));

/// Directory for snapshot backups
/// Read from BACKUP_DIR environment variable
/// Default: backups
pub static BACKUP_DIR: Lazy<String> =
    Lazy::new(|| env::var("BACKUP_DIR").unwrap_or_else(|_| "backups".to_string()));

/// Free-tier throttling configuration
pub mod free_tier {
    /// Rolling window during which one free analysis may be used (days)
    pub const WINDOW_DAYS: i64 = 30;

    /// Window length in milliseconds
    pub const WINDOW_MS: i64 = WINDOW_DAYS * 24 * 60 * 60 * 1000;
}
