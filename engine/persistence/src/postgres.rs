//! PostgreSQL table store

use crate::backend::{validate_table_name, TableStore};
use crate::config::PersistenceConfig;
use crate::error::{PersistenceError, Result};
use crate::record::Row;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row as _};
use std::time::Duration;

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sheet_rows (
    table_name TEXT NOT NULL,
    row_index INTEGER NOT NULL,
    row_data JSONB NOT NULL,
    PRIMARY KEY (table_name, row_index)
)
"#;

/// Stores every logical table in one `sheet_rows` relation.
///
/// `save_table` deletes and re-inserts the table's rows inside a single
/// transaction, so readers never observe a half-written table.
pub struct PgTableStore {
    pool: PgPool,
}

impl PgTableStore {
    /// Connect using the URL and pool settings from `config`
    pub async fn connect(config: &PersistenceConfig) -> Result<Self> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| PersistenceError::config("database_url is not set"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(url)
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl TableStore for PgTableStore {
    async fn initialize(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        tracing::info!("PostgreSQL table store initialized");
        Ok(())
    }

    async fn load_table(&self, table: &str) -> Result<Vec<Row>> {
        validate_table_name(table)?;

        let records = sqlx::query(
            "SELECT row_data FROM sheet_rows WHERE table_name = $1 ORDER BY row_index",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let Json(row): Json<Row> = record.try_get("row_data")?;
            rows.push(row);
        }

        tracing::debug!(table, rows = rows.len(), "Loaded table");
        Ok(rows)
    }

    async fn save_table(&self, table: &str, rows: &[Row]) -> Result<()> {
        validate_table_name(table)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM sheet_rows WHERE table_name = $1")
            .bind(table)
            .execute(&mut *tx)
            .await?;

        for (index, row) in rows.iter().enumerate() {
            let row_index = i32::try_from(index).map_err(|_| {
                PersistenceError::invalid_operation(format!("table {table} has too many rows"))
            })?;

            sqlx::query(
                "INSERT INTO sheet_rows (table_name, row_index, row_data) VALUES ($1, $2, $3)",
            )
            .bind(table)
            .bind(row_index)
            .bind(Json(row.clone()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(table, rows = rows.len(), "Wrote table");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
