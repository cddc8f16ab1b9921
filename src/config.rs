//! Runtime configuration and logging setup.

use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

pub const DB_PATH_VAR: &str = "FAMFEED_DB_PATH";
pub const LOG_VAR: &str = "FAMFEED_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite file. `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    /// `tracing` filter directive, e.g. `famfeed_core=debug`.
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// platform data directory for the database.
    pub fn from_env() -> Result<Self> {
        let db_path = match env::var_os(DB_PATH_VAR) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => default_db_path()?,
        };
        Ok(Self {
            db_path: Some(db_path),
            log_filter: env::var(LOG_VAR).unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            db_path: None,
            log_filter: "info".to_string(),
        }
    }

    pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::in_memory()
        }
    }
}

/// Get the default storage path for the SQLite database.
pub fn default_db_path() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| Error::Config("Failed to get data directory".to_string()))?;
    Ok(data_dir.join("famfeed").join("famfeed.db"))
}

/// Install a fmt subscriber filtered by `config.log_filter`.
///
/// Does nothing if a global subscriber is already set.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_has_no_path() {
        let config = Config::in_memory();
        assert_eq!(config.db_path, None);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn explicit_path() {
        let config = Config::with_db_path("/tmp/famfeed-test.db");
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/famfeed-test.db")));
    }

    // The only test that touches these variables, so it does not race.
    #[test]
    fn from_env_reads_and_falls_back() {
        env::set_var(DB_PATH_VAR, "/tmp/famfeed-env.db");
        env::set_var(LOG_VAR, "famfeed_core=debug");
        let config = Config::from_env().unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/famfeed-env.db")));
        assert_eq!(config.log_filter, "famfeed_core=debug");

        env::set_var(DB_PATH_VAR, "");
        env::remove_var(LOG_VAR);
        match (Config::from_env(), default_db_path()) {
            (Ok(config), Ok(path)) => {
                assert_eq!(config.log_filter, "info");
                assert!(path.ends_with("famfeed/famfeed.db"));
                assert_eq!(config.db_path, Some(path));
            }
            (Err(Error::Config(_)), Err(_)) => {}
            (config, path) => panic!("mismatch: {:?} vs {:?}", config, path),
        }
        env::remove_var(DB_PATH_VAR);
    }

    #[test]
    fn init_logging_twice_is_harmless() {
        let config = Config::in_memory();
        init_logging(&config);
        init_logging(&config);
    }
}
