//! CloudPanel Common Library
//!
//! Shared wire types, error taxonomy, configuration and durable session
//! storage for the CloudPanel client.

pub mod config;
pub mod error;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{Error, Result, ValidationError, REQUEST_FAILED_MESSAGE, SESSION_EXPIRED_MESSAGE};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use types::*;

/// CloudPanel version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store path
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".cloudpanel")
}

/// Default configuration file path
pub fn default_config_path() -> std::path::PathBuf {
    default_store_path().join("config.toml")
}

/// Default session database path
pub fn default_session_db_path() -> std::path::PathBuf {
    default_store_path().join("session.db")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
