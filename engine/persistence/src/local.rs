//! Local file-based table store

use crate::backend::{validate_table_name, TableStore};
use crate::error::{PersistenceError, Result};
use crate::record::Row;
use std::path::{Path, PathBuf};

/// One pretty-printed JSON array per table, `<data_dir>/<table>.json`.
///
/// Writes go to a sibling temp file that is renamed over the table file,
/// so an interrupted write leaves the previous table intact.
pub struct LocalTableStore {
    data_dir: PathBuf,
}

impl LocalTableStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{table}.json"))
    }
}

#[async_trait::async_trait]
impl TableStore for LocalTableStore {
    async fn initialize(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(PersistenceError::Io)?;
        tracing::info!("Local table store initialized at: {:?}", self.data_dir);
        Ok(())
    }

    async fn load_table(&self, table: &str) -> Result<Vec<Row>> {
        validate_table_name(table)?;
        let path = self.table_path(table);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(table, path = ?path, "Table file not found, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(PersistenceError::Io(e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<Row> = serde_json::from_str(&content)?;
        tracing::debug!(table, rows = rows.len(), "Loaded table");
        Ok(rows)
    }

    async fn save_table(&self, table: &str, rows: &[Row]) -> Result<()> {
        validate_table_name(table)?;
        let path = self.table_path(table);
        let tmp_path = self.data_dir.join(format!(".{table}.json.tmp"));

        let body = serde_json::to_string_pretty(rows)?;
        tokio::fs::write(&tmp_path, body).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        tracing::debug!(table, rows = rows.len(), "Wrote table");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
