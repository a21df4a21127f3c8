//! Keyed in-memory snapshot of a whole table

use crate::backend::{load_records, save_records, TableStore};
use crate::error::Result;
use crate::record::KeyedRecord;
use std::collections::HashMap;

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Snapshot of a table indexed by record key.
///
/// Load-all, upsert-by-key, save-all: the narrow interface the job needs,
/// independent of whether the backend can update rows individually.
/// Row order is preserved; new keys are appended.
#[derive(Debug, Clone)]
pub struct KeyedTable<R: KeyedRecord> {
    table: String,
    records: Vec<R>,
    index: HashMap<R::Key, usize>,
    dirty: bool,
}

impl<R: KeyedRecord> KeyedTable<R> {
    /// Build from records already in memory. Later duplicates of a key replace
    /// earlier ones and mark the snapshot dirty so the next save collapses them.
    pub fn from_records(table: impl Into<String>, records: Vec<R>) -> Self {
        let table = table.into();
        let mut snapshot = Self {
            table,
            records: Vec::with_capacity(records.len()),
            index: HashMap::new(),
            dirty: false,
        };

        for record in records {
            let key = record.key();
            if let Some(&pos) = snapshot.index.get(&key) {
                tracing::warn!(
                    table = %snapshot.table,
                    key = ?key,
                    "Duplicate key in table, keeping last row"
                );
                snapshot.records[pos] = record;
                snapshot.dirty = true;
            } else {
                snapshot.index.insert(key, snapshot.records.len());
                snapshot.records.push(record);
            }
        }

        snapshot
    }

    /// Load and decode the whole table from `store`
    pub async fn load(store: &dyn TableStore, table: &str) -> Result<Self> {
        let records = load_records::<R>(store, table).await?;
        Ok(Self::from_records(table, records))
    }

    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.index.get(key).map(|&pos| &self.records[pos])
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the snapshot differs from what was loaded
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Insert or replace the record with the same key.
    ///
    /// A record whose content matches the stored one is ignored, which keeps
    /// the stored row (including bookkeeping columns) untouched.
    pub fn upsert(&mut self, record: R) -> UpsertOutcome {
        let key = record.key();
        match self.index.get(&key) {
            Some(&pos) => {
                if self.records[pos].same_content(&record) {
                    UpsertOutcome::Unchanged
                } else {
                    self.records[pos] = record;
                    self.dirty = true;
                    UpsertOutcome::Updated
                }
            }
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(record);
                self.dirty = true;
                UpsertOutcome::Inserted
            }
        }
    }

    /// Write the whole table if anything changed. Returns whether a write happened.
    pub async fn save_if_changed(&mut self, store: &dyn TableStore) -> Result<bool> {
        if !self.dirty {
            tracing::debug!(table = %self.table, "No changes, skipping write");
            return Ok(false);
        }

        save_records(store, &self.table, &self.records).await?;
        self.dirty = false;
        tracing::info!(table = %self.table, rows = self.records.len(), "Saved table");
        Ok(true)
    }
}
