//! # Persistence Layer
//!
//! Whole-table storage for the playoff scoring job. Every table is read in
//! full and written in full; there is no per-row update primitive.
//!
//! ## Architecture
//!
//! - **TableStore**: Abstract trait for storage backends (load-all / save-all)
//! - **InMemoryTableStore**: Process-local tables for tests and dry runs
//! - **LocalTableStore**: One JSON file per table
//! - **PgTableStore**: PostgreSQL, rows kept as JSONB
//! - **TableRecord / KeyedTable**: Typed rows with validated parsing and upsert-by-key
//!
//! ## Usage
//!
//! ```rust
//! use persistence::{create_table_store, PersistenceConfig};
//! use tempfile::TempDir;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let temp_dir = TempDir::new()?;
//!     let store = create_table_store(&PersistenceConfig::local(temp_dir.path())).await?;
//!
//!     let rows = store.load_table("schedule").await?;
//!     store.save_table("schedule", &rows).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod local;
pub mod postgres;
pub mod record;
pub mod table;

pub use backend::{load_records, save_records, InMemoryTableStore, TableStore};
pub use config::{PersistenceConfig, StorageBackend};
pub use error::{PersistenceError, Result};
pub use local::LocalTableStore;
pub use postgres::PgTableStore;
pub use record::{row_from_pairs, KeyedRecord, Row, RowReader, TableRecord};
pub use table::{KeyedTable, UpsertOutcome};

/// Open and initialize the table store selected by `config`
pub async fn create_table_store(config: &PersistenceConfig) -> Result<Box<dyn TableStore>> {
    config.validate().map_err(PersistenceError::config)?;

    let store: Box<dyn TableStore> = match config.backend {
        StorageBackend::Memory => Box::new(InMemoryTableStore::new()),
        StorageBackend::Local => Box::new(LocalTableStore::new(config.data_dir.clone())),
        StorageBackend::Postgres => Box::new(PgTableStore::connect(config).await?),
    };

    store.initialize().await?;
    tracing::info!(backend = store.backend_name(), "Table store ready");

    Ok(store)
}
