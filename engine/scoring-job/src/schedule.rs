use crate::models::Game;
use chrono_tz::Tz;
use persistence::{RowReader, TableStore};

/// Typed view over the persisted Schedule table
pub struct GameRecordStore {
    table: String,
    timezone: Tz,
}

impl GameRecordStore {
    pub fn new(table: impl Into<String>, timezone: Tz) -> Self {
        Self {
            table: table.into(),
            timezone,
        }
    }

    /// Load and validate every game. Any malformed row fails the load.
    pub async fn load(&self, store: &dyn TableStore) -> persistence::Result<Vec<Game>> {
        let rows = store.load_table(&self.table).await?;
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                Game::from_row_in(&RowReader::new(&self.table, i, row), self.timezone)
            })
            .collect()
    }

    /// Replace the whole table with `games`
    pub async fn save(&self, store: &dyn TableStore, games: &[Game]) -> persistence::Result<()> {
        let rows: Vec<_> = games.iter().map(Game::to_row).collect();
        store.save_table(&self.table, &rows).await
    }
}
