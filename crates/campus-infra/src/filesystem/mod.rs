//! Data directory layout for the chat server.
//!
//! Everything the server persists lives under one directory:
//! `config.toml` and the `campus.db` SQLite database.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CAMPUS_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority: `CAMPUS_DATA_DIR`, then `~/.campus`, then `./.campus`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    // Use home directory fallback: ~/.campus
    if let Some(home) = dirs::home_dir() {
        return home.join(".campus");
    }

    // Last resort: current directory
    PathBuf::from(".campus")
}

/// Path of the config file inside `data_dir`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Path of the SQLite history database inside `data_dir`.
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("campus.db")
}
