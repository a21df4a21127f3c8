//! Configuration for the persistence layer

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which table store implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local tables, lost on exit
    Memory,
    /// One JSON file per table under `data_dir`
    Local,
    /// PostgreSQL, rows stored as JSONB per table
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "local" => Ok(Self::Local),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

/// Configuration for the persistence layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Backend to use
    pub backend: StorageBackend,

    /// Base directory for table files (local backend)
    pub data_dir: PathBuf,

    /// Connection URL (postgres backend)
    pub database_url: Option<String>,

    /// Connection pool size (postgres backend)
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection before giving up
    pub connect_timeout_secs: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            data_dir: PathBuf::from("./data"),
            database_url: None,
            max_connections: 2,
            connect_timeout_secs: 10,
        }
    }
}

impl PersistenceConfig {
    /// Create a local-file configuration rooted at `data_dir`
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackend::Local,
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Create a postgres configuration for `url`
    pub fn postgres(url: impl Into<String>) -> Self {
        Self {
            backend: StorageBackend::Postgres,
            database_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        match self.backend {
            StorageBackend::Postgres => {
                let url = self.database_url.as_deref().unwrap_or("").trim();
                if url.is_empty() {
                    return Err("postgres backend requires a database URL".to_string());
                }
                if self.max_connections == 0 {
                    return Err("max_connections must be greater than 0".to_string());
                }
            }
            StorageBackend::Local => {
                if self.data_dir.as_os_str().is_empty() {
                    return Err("local backend requires a data directory".to_string());
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("Local".parse::<StorageBackend>().unwrap(), StorageBackend::Local);
        assert_eq!("postgresql".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert!("sheets".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn postgres_requires_url() {
        let mut config = PersistenceConfig::postgres("");
        tokio_test::assert_err!(config.validate());

        config.database_url = Some("postgresql://localhost/scores".to_string());
        tokio_test::assert_ok!(config.validate());
    }
}
