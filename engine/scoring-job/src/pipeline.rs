use crate::config::JobConfig;
use crate::error::{JobError, Result};
use crate::fetcher::{FetchOutcome, ScoreFetcher};
use crate::merger::ScoreMerger;
use crate::models::{Pick, RunSummary, ScoreRecord};
use crate::planner::FetchPlanner;
use crate::provider::{StatsProvider, Tank01Client};
use crate::reconciler::StatusReconciler;
use crate::schedule::GameRecordStore;
use crate::window::ActiveGames;
use chrono::{DateTime, Utc};
use persistence::{create_table_store, load_records, KeyedTable, TableStore};
use player_registry::{Player, PlayerRegistry};
use std::time::Duration;
use tracing::info;

/// One scoring run: reconcile statuses, select active games, plan, fetch, merge
pub struct ScoringJob {
    config: JobConfig,
    store: Box<dyn TableStore>,
    provider: Box<dyn StatsProvider>,
}

impl ScoringJob {
    pub fn new(
        config: JobConfig,
        store: Box<dyn TableStore>,
        provider: Box<dyn StatsProvider>,
    ) -> Self {
        Self {
            config,
            store,
            provider,
        }
    }

    /// Open the configured table store and provider client
    pub async fn connect(config: JobConfig) -> Result<Self> {
        let store = create_table_store(&config.storage).await?;
        let provider = Tank01Client::new(&config.provider)?;
        Ok(Self::new(config, store, Box::new(provider)))
    }

    /// Run the pipeline once against fresh snapshots of every table
    pub async fn run(
        &self,
        week_override: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<RunSummary> {
        let store = self.store.as_ref();
        let provider = self.provider.as_ref();
        let tables = &self.config.tables;
        let timezone = self
            .config
            .timezone()
            .map_err(|e| JobError::config(e.to_string()))?;
        let mut summary = RunSummary::default();

        let schedule = GameRecordStore::new(&tables.schedule, timezone);
        let mut games = schedule.load(store).await?;
        info!(games = games.len(), "Loaded schedule");

        let report = StatusReconciler::new(provider, &self.config.provider)
            .reconcile(store, &schedule, &mut games)
            .await?;
        summary.weeks_polled = report.weeks_polled;
        summary.games_changed = report.games_changed;

        let active = ActiveGames::select(&games, now, &self.config.window);
        summary.active_games = active.len();
        info!(active = active.len(), weeks = ?active.weeks(), "Selected active games");

        if active.is_empty() && week_override.is_none() {
            info!("No active games, nothing to fetch");
            return Ok(summary);
        }

        let players = load_records::<Player>(store, &tables.players).await?;
        let registry = PlayerRegistry::from_players(&players);
        let picks = load_records::<Pick>(store, &tables.picks).await?;
        let scores = KeyedTable::<ScoreRecord>::load(store, &tables.scores).await?;
        info!(
            players = registry.player_count(),
            picks = picks.len(),
            scores = scores.len(),
            "Loaded tables"
        );

        let plan =
            FetchPlanner::new(&registry, &active, &scores).plan(&picks, week_override);
        summary.targets = plan.targets.len();
        info!(targets = plan.targets.len(), "Planned stats fetches");

        let mut fetcher = ScoreFetcher::new(
            provider,
            &active,
            &self.config.retry,
            Duration::from_millis(self.config.provider.call_delay_ms),
        );
        let mut merger = ScoreMerger::new(scores);

        for target in &plan.targets {
            match fetcher.fetch(target, now).await {
                FetchOutcome::Fetched(record) => {
                    summary.fetched += 1;
                    merger.merge(record);
                }
                FetchOutcome::Rejected(_) => summary.rejected += 1,
                FetchOutcome::Empty => summary.empty += 1,
                FetchOutcome::Failed(_) => summary.failed += 1,
            }
        }

        let merged = merger.finish(store).await?;
        summary.scores_inserted = merged.inserted;
        summary.scores_updated = merged.updated;
        summary.scores_written = merged.written;

        info!(
            fetched = summary.fetched,
            rejected = summary.rejected,
            empty = summary.empty,
            failed = summary.failed,
            "Scoring run complete"
        );

        Ok(summary)
    }
}
