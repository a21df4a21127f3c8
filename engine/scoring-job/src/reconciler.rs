use crate::config::ProviderConfig;
use crate::models::{Game, GameStatus};
use crate::provider::{StatsProvider, WeekQuery};
use crate::schedule::GameRecordStore;
use persistence::TableStore;
use std::collections::{BTreeSet, HashMap};
use tracing::{error, info, warn};

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub weeks_polled: usize,
    pub weeks_failed: usize,
    pub weeks_unmapped: usize,
    pub games_changed: usize,
    pub written: bool,
}

/// Brings stored game statuses in line with the provider
pub struct StatusReconciler<'a> {
    provider: &'a dyn StatsProvider,
    config: &'a ProviderConfig,
}

impl<'a> StatusReconciler<'a> {
    pub fn new(provider: &'a dyn StatsProvider, config: &'a ProviderConfig) -> Self {
        Self { provider, config }
    }

    /// Weeks that still have at least one non-final game, in sorted order
    pub fn weeks_to_poll(games: &[Game]) -> BTreeSet<String> {
        games.iter().filter(|g| !g.status.is_final()).map(|g| g.week.clone()).collect()
    }

    /// Poll each open week once and update changed statuses in place.
    ///
    /// A failed poll is logged and the remaining weeks still run.
    pub async fn refresh(&self, games: &mut [Game]) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let weeks = Self::weeks_to_poll(games);
        if weeks.is_empty() {
            info!("All games are final, no status updates needed");
            return report;
        }

        let mut updates: HashMap<String, GameStatus> = HashMap::new();

        for week in &weeks {
            let Some(params) = self.config.week_params(week) else {
                warn!(week = %week, "No provider parameters configured for week");
                report.weeks_unmapped += 1;
                continue;
            };

            let query = WeekQuery {
                label: week.clone(),
                week: params.week,
                season_type: params.season_type.clone(),
                season: self.config.season,
            };

            report.weeks_polled += 1;
            match self.provider.games_for_week(&query).await {
                Ok(provider_games) => {
                    info!(
                        week = %week,
                        games = provider_games.len(),
                        "Fetched game statuses"
                    );
                    updates.extend(provider_games.into_iter().map(|g| (g.game_id, g.status)));
                }
                Err(e) => {
                    error!(week = %week, error = %e, "Failed to fetch game statuses");
                    report.weeks_failed += 1;
                }
            }
        }

        for game in games.iter_mut() {
            if let Some(status) = updates.get(&game.game_id) {
                if *status != game.status {
                    info!(
                        game_id = %game.game_id,
                        from = %game.status,
                        to = %status,
                        "Game status changed"
                    );
                    game.status = status.clone();
                    report.games_changed += 1;
                }
            }
        }

        report
    }

    /// Refresh statuses and write the Schedule table once if anything changed
    pub async fn reconcile(
        &self,
        store: &dyn TableStore,
        schedule: &GameRecordStore,
        games: &mut [Game],
    ) -> persistence::Result<ReconcileReport> {
        let mut report = self.refresh(games).await;

        if report.games_changed > 0 {
            schedule.save(store, games).await?;
            report.written = true;
            info!(changed = report.games_changed, "Updated game statuses in schedule");
        } else {
            info!("No game status changes detected");
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::ProviderGame;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use persistence::InMemoryTableStore;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Answers week queries from a fixed table and records which weeks were asked for
    struct WeeklyStatuses {
        by_week: HashMap<String, Vec<ProviderGame>>,
        polled: Mutex<Vec<String>>,
    }

    impl WeeklyStatuses {
        fn new(entries: &[(&str, &str, GameStatus)]) -> Self {
            let mut by_week: HashMap<String, Vec<ProviderGame>> = HashMap::new();
            for (week, id, status) in entries {
                by_week
                    .entry(week.to_string())
                    .or_default()
                    .push(ProviderGame {
                        game_id: id.to_string(),
                        status: status.clone(),
                    });
            }
            Self {
                by_week,
                polled: Mutex::new(Vec::new()),
            }
        }

        fn polled(&self) -> Vec<String> {
            self.polled.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatsProvider for WeeklyStatuses {
        async fn games_for_week(
            &self,
            query: &WeekQuery,
        ) -> Result<Vec<ProviderGame>, ProviderError> {
            self.polled.lock().unwrap().push(query.label.clone());
            self.by_week
                .get(&query.label)
                .cloned()
                .ok_or(ProviderError::HttpStatus {
                    endpoint: "getNFLGamesForWeek".to_string(),
                    status: 500,
                })
        }

        async fn player_game_stats(
            &self,
            _player_id: &str,
        ) -> Result<Option<Value>, ProviderError> {
            Ok(None)
        }
    }

    fn game(id: &str, week: &str, status: GameStatus) -> Game {
        Game {
            game_id: id.to_string(),
            week: week.to_string(),
            kickoff: Utc.with_ymd_and_hms(2026, 1, 10, 21, 25, 0).unwrap(),
            game_time: "2026-01-10T16:25:00".to_string(),
            home_team: "CHI".to_string(),
            away_team: "GB".to_string(),
            status,
        }
    }

    #[tokio::test]
    async fn test_all_final_weeks_are_not_polled() {
        let provider = WeeklyStatuses::new(&[]);
        let config = ProviderConfig::default();
        let store = InMemoryTableStore::new();
        let schedule = GameRecordStore::new("schedule", chrono_tz::America::New_York);

        let mut games = vec![
            game("G1", "Wildcard", GameStatus::Final),
            game("G2", "Week 18", GameStatus::Final),
        ];
        let report = StatusReconciler::new(&provider, &config)
            .reconcile(&store, &schedule, &mut games)
            .await
            .unwrap();

        assert!(provider.polled().is_empty());
        assert_eq!(report, ReconcileReport::default());
        assert_eq!(store.write_count("schedule").await, 0);
    }

    #[tokio::test]
    async fn test_changed_statuses_written_once() {
        let provider = WeeklyStatuses::new(&[
            ("Wildcard", "G1", GameStatus::InProgress),
            ("Wildcard", "G2", GameStatus::Scheduled),
            ("Divisional", "G3", GameStatus::Final),
        ]);
        let config = ProviderConfig::default();
        let store = InMemoryTableStore::new();
        let schedule = GameRecordStore::new("schedule", chrono_tz::America::New_York);

        let mut games = vec![
            game("G1", "Wildcard", GameStatus::Scheduled),
            game("G2", "Wildcard", GameStatus::Scheduled),
            game("G3", "Divisional", GameStatus::InProgress),
            game("G0", "Week 18", GameStatus::Final),
        ];
        let report = StatusReconciler::new(&provider, &config)
            .reconcile(&store, &schedule, &mut games)
            .await
            .unwrap();

        assert_eq!(
            provider.polled(),
            vec!["Divisional".to_string(), "Wildcard".to_string()]
        );
        assert_eq!(report.games_changed, 2);
        assert!(report.written);
        assert_eq!(games[0].status, GameStatus::InProgress);
        assert_eq!(games[2].status, GameStatus::Final);
        assert_eq!(store.write_count("schedule").await, 1);
        assert_eq!(store.rows("schedule").await.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_week_does_not_abort_others() {
        // "Divisional" has no scripted answer, so its poll fails
        let provider = WeeklyStatuses::new(&[("Wildcard", "G1", GameStatus::Final)]);
        let config = ProviderConfig::default();

        let mut games = vec![
            game("G1", "Wildcard", GameStatus::InProgress),
            game("G3", "Divisional", GameStatus::Scheduled),
            game("G9", "Preseason", GameStatus::Scheduled),
        ];
        let report = StatusReconciler::new(&provider, &config).refresh(&mut games).await;

        assert_eq!(report.weeks_polled, 2);
        assert_eq!(report.weeks_failed, 1);
        assert_eq!(report.weeks_unmapped, 1);
        assert_eq!(report.games_changed, 1);
        assert_eq!(games[0].status, GameStatus::Final);
        assert_eq!(games[1].status, GameStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_unchanged_statuses_skip_write() {
        let provider = WeeklyStatuses::new(&[("Wildcard", "G1", GameStatus::Scheduled)]);
        let config = ProviderConfig::default();
        let store = InMemoryTableStore::new();
        let schedule = GameRecordStore::new("schedule", chrono_tz::America::New_York);

        let mut games = vec![game("G1", "Wildcard", GameStatus::Scheduled)];
        let report = StatusReconciler::new(&provider, &config)
            .reconcile(&store, &schedule, &mut games)
            .await
            .unwrap();

        assert_eq!(report.weeks_polled, 1);
        assert!(!report.written);
        assert_eq!(store.write_count("schedule").await, 0);
    }
}
