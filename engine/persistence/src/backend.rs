//! Table store trait and the in-memory implementation

use crate::error::{PersistenceError, Result};
use crate::record::{decode_rows, encode_rows, Row, TableRecord};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Whole-table persistence: read every row of a table, or replace every row.
///
/// There is no partial-row update primitive. Callers load a snapshot,
/// modify it in memory and write the full table back.
#[async_trait::async_trait]
pub trait TableStore: Send + Sync {
    /// Prepare the backend (create directories, tables)
    async fn initialize(&self) -> Result<()>;

    /// Read all rows of `table`. A table that was never written is empty.
    async fn load_table(&self, table: &str) -> Result<Vec<Row>>;

    /// Replace all rows of `table` with `rows`
    async fn save_table(&self, table: &str, rows: &[Row]) -> Result<()>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// Load and decode a typed table
pub async fn load_records<R: TableRecord>(
    store: &dyn TableStore,
    table: &str,
) -> Result<Vec<R>> {
    let rows = store.load_table(table).await?;
    decode_rows(table, &rows)
}

/// Encode and write a typed table
pub async fn save_records<R: TableRecord>(
    store: &dyn TableStore,
    table: &str,
    records: &[R],
) -> Result<()> {
    store.save_table(table, &encode_rows(records)).await
}

pub(crate) fn validate_table_name(table: &str) -> Result<()> {
    let bad = table.trim().is_empty()
        || table.contains(['/', '\\'])
        || table.starts_with('.')
        || table.chars().any(char::is_control);
    if bad {
        return Err(PersistenceError::invalid_operation(format!(
            "invalid table name: {table:?}"
        )));
    }
    Ok(())
}

/// In-memory table store (for testing and dry runs)
#[derive(Clone, Default)]
pub struct InMemoryTableStore {
    tables: Arc<Mutex<HashMap<String, Vec<Row>>>>,
    writes: Arc<Mutex<HashMap<String, usize>>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table without counting it as a write
    pub async fn seed(&self, table: &str, rows: Vec<Row>) {
        self.tables.lock().await.insert(table.to_string(), rows);
    }

    /// Number of `save_table` calls made for `table`
    pub async fn write_count(&self, table: &str) -> usize {
        self.writes.lock().await.get(table).copied().unwrap_or(0)
    }

    /// Current rows of `table`
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.lock().await.get(table).cloned().unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl TableStore for InMemoryTableStore {
    async fn initialize(&self) -> Result<()> {
        tracing::debug!("In-memory table store initialized");
        Ok(())
    }

    async fn load_table(&self, table: &str) -> Result<Vec<Row>> {
        validate_table_name(table)?;
        Ok(self.rows(table).await)
    }

    async fn save_table(&self, table: &str, rows: &[Row]) -> Result<()> {
        validate_table_name(table)?;
        self.tables.lock().await.insert(table.to_string(), rows.to_vec());
        *self.writes.lock().await.entry(table.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
