use crate::models::ScoreRecord;
use persistence::{KeyedTable, TableStore, UpsertOutcome};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub written: bool,
}

/// Upserts fetched scores into the run's Scores snapshot and writes it once
pub struct ScoreMerger {
    scores: KeyedTable<ScoreRecord>,
    report: MergeReport,
}

impl ScoreMerger {
    pub fn new(scores: KeyedTable<ScoreRecord>) -> Self {
        Self {
            scores,
            report: MergeReport::default(),
        }
    }

    pub fn scores(&self) -> &KeyedTable<ScoreRecord> {
        &self.scores
    }

    pub fn merge(&mut self, record: ScoreRecord) -> UpsertOutcome {
        let (player_id, week) = (record.player_id.clone(), record.week.clone());
        let outcome = self.scores.upsert(record);
        match outcome {
            UpsertOutcome::Inserted => self.report.inserted += 1,
            UpsertOutcome::Updated => self.report.updated += 1,
            UpsertOutcome::Unchanged => self.report.unchanged += 1,
        }
        debug!(player_id = %player_id, week = %week, outcome = ?outcome, "Merged score");
        outcome
    }

    /// Write the whole Scores table if any record changed
    pub async fn finish(mut self, store: &dyn TableStore) -> persistence::Result<MergeReport> {
        self.report.written = self.scores.save_if_changed(store).await?;
        if self.report.written {
            info!(
                inserted = self.report.inserted,
                updated = self.report.updated,
                "Scores updated"
            );
        } else {
            info!("No score changes, skipping write");
        }
        Ok(self.report)
    }
}
