//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 3004;
pub const DEFAULT_MAX_SESSIONS: usize = 64;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Paths to the DiScEPT data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Saved TEI exports (`data/exports/`).
    pub exports: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            exports: root.join("exports"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.exports)?;
        Ok(())
    }
}

/// Top-level DiScEPT service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisceptConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Live editing sessions kept in memory before the least recently used is evicted.
    pub max_sessions: usize,
    /// Upper bound for uploaded TEI bodies.
    pub max_upload_bytes: usize,
}

impl DisceptConfig {
    /// Create configuration from environment and defaults. A session limit
    /// of zero is rejected with [`Error::Config`].
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let port = env_parse("PORT").unwrap_or(DEFAULT_PORT);
        let max_sessions = at_least_one("DISCEPT_MAX_SESSIONS", env_parse("DISCEPT_MAX_SESSIONS"))?
            .unwrap_or(DEFAULT_MAX_SESSIONS);
        let max_upload_bytes =
            env_parse("DISCEPT_MAX_UPLOAD_BYTES").unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            max_sessions,
            max_upload_bytes,
        })
    }
}

fn at_least_one(key: &str, value: Option<usize>) -> Result<Option<usize>> {
    match value {
        Some(0) => Err(Error::Config(format!("{} must be at least 1", key))),
        other => Ok(other),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
                None
            }
        },
        Err(_) => None,
    }
}
