use crate::config::RetryConfig;
use crate::error::ProviderError;
use crate::models::{FetchTarget, ScoreRecord, StatLine};
use crate::provider::{text_field, StatsProvider};
use crate::retry::run_with_retry;
use crate::window::ActiveGames;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{error, info, warn};

/// Why a provider response was discarded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The response carried no game identifier
    MissingGameId,
    /// The returned game is not one of the week's active games
    ForeignGame(String),
}

/// Result of fetching one target
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(ScoreRecord),
    Rejected(Rejection),
    /// The provider had nothing for this player
    Empty,
    /// Retries exhausted or the provider refused the request
    Failed(ProviderError),
}

/// Fantasy points and stat line extracted from one game entry
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStats {
    pub game_id: Option<String>,
    pub fantasy_points: f64,
    pub stats: StatLine,
    /// Values that were present but unreadable and counted as zero
    pub malformed: Vec<String>,
}

fn number_value(value: &Value) -> Option<Option<f64>> {
    match value {
        Value::Null => Some(None),
        Value::Number(n) => Some(n.as_f64()),
        Value::String(s) if s.trim().is_empty() => Some(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some),
        _ => None,
    }
}

struct StatReader<'a> {
    item: &'a Value,
    malformed: Vec<String>,
}

impl StatReader<'_> {
    fn flag(&mut self, path: String) {
        if !self.malformed.contains(&path) {
            self.malformed.push(path);
        }
    }

    /// Numeric field of `section` (or of the entry itself). Missing is zero;
    /// unreadable is zero and remembered.
    fn number(&mut self, section: Option<&str>, field: &str) -> f64 {
        let container = match section {
            Some(name) => match self.item.get(name) {
                Some(v) if v.is_object() => v,
                None | Some(Value::Null) => return 0.0,
                Some(_) => {
                    self.flag(name.to_string());
                    return 0.0;
                }
            },
            None => self.item,
        };

        let Some(raw) = container.get(field) else {
            return 0.0;
        };

        match number_value(raw) {
            Some(value) => value.unwrap_or(0.0),
            None => {
                self.flag(field_path(section, field));
                0.0
            }
        }
    }

    /// Whole-number field; a fractional value is truncated and remembered
    fn count(&mut self, section: Option<&str>, field: &str) -> i64 {
        let value = self.number(section, field);
        if value.fract() != 0.0 {
            self.flag(field_path(section, field));
        }
        value.trunc() as i64
    }
}

fn field_path(section: Option<&str>, field: &str) -> String {
    section.map_or_else(|| field.to_string(), |s| format!("{s}.{field}"))
}

/// Pull fantasy points and the raw stat breakdown out of a player game entry
pub fn parse_player_stats(item: &Value) -> ParsedStats {
    let mut reader = StatReader {
        item,
        malformed: Vec::new(),
    };

    let fantasy_points = reader.number(None, "fantasyPoints");
    let stats = StatLine {
        pass_yards: reader.count(Some("Passing"), "passYds"),
        pass_td: reader.count(Some("Passing"), "passTD"),
        pass_int: reader.count(Some("Passing"), "int"),
        rush_yards: reader.count(Some("Rushing"), "rushYds"),
        rush_td: reader.count(Some("Rushing"), "rushTD"),
        rec_yards: reader.count(Some("Receiving"), "recYds"),
        rec_td: reader.count(Some("Receiving"), "recTD"),
        receptions: reader.count(Some("Receiving"), "receptions"),
        targets: reader.count(Some("Receiving"), "targets"),
        fumbles: reader.count(None, "fumbles"),
    };

    ParsedStats {
        game_id: text_field(item, "gameID").filter(|id| !id.is_empty()),
        fantasy_points,
        stats,
        malformed: reader.malformed,
    }
}

/// Fetches player stats one call at a time, spaced by a minimum delay
pub struct ScoreFetcher<'a> {
    provider: &'a dyn StatsProvider,
    active: &'a ActiveGames,
    retry: &'a RetryConfig,
    call_delay: Duration,
    last_call: Option<Instant>,
}

impl<'a> ScoreFetcher<'a> {
    pub fn new(
        provider: &'a dyn StatsProvider,
        active: &'a ActiveGames,
        retry: &'a RetryConfig,
        call_delay: Duration,
    ) -> Self {
        Self {
            provider,
            active,
            retry,
            call_delay,
            last_call: None,
        }
    }

    /// Wait until `call_delay` has passed since the previous call returned
    async fn pace(&self) {
        if let Some(last) = self.last_call {
            sleep_until(last + self.call_delay).await;
        }
    }

    /// Fetch, parse and validate the stats for one target
    pub async fn fetch(&mut self, target: &FetchTarget, now: DateTime<Utc>) -> FetchOutcome {
        info!(
            player = %target.player_name,
            player_id = %target.player_id,
            week = %target.week,
            "Fetching stats"
        );

        self.pace().await;
        let provider = self.provider;
        let response =
            run_with_retry(|| provider.player_game_stats(&target.player_id), self.retry).await;
        self.last_call = Some(Instant::now());

        let item = match response {
            Ok(Some(item)) => item,
            Ok(None) => {
                warn!(player = %target.player_name, "No stats returned");
                return FetchOutcome::Empty;
            }
            Err(e) => {
                error!(
                    player = %target.player_name,
                    error = %e,
                    "Stats request failed, skipping player"
                );
                return FetchOutcome::Failed(e);
            }
        };

        let parsed = parse_player_stats(&item);
        for field in &parsed.malformed {
            warn!(
                player = %target.player_name,
                field = %field,
                "Malformed stat value, using its whole part or 0"
            );
        }

        let Some(game_id) = parsed.game_id else {
            warn!(player = %target.player_name, "No gameID in response, discarding");
            return FetchOutcome::Rejected(Rejection::MissingGameId);
        };

        if !self.active.is_valid_game(&target.week, &game_id) {
            warn!(
                player = %target.player_name,
                week = %target.week,
                game_id = %game_id,
                "Returned game is not an active game of this week, discarding"
            );
            return FetchOutcome::Rejected(Rejection::ForeignGame(game_id));
        }

        let Some(status) = self.active.status_of(&game_id).cloned() else {
            return FetchOutcome::Rejected(Rejection::ForeignGame(game_id));
        };

        info!(
            player = %target.player_name,
            game_id = %game_id,
            points = parsed.fantasy_points,
            "Fetched stats"
        );

        FetchOutcome::Fetched(ScoreRecord {
            player_id: target.player_id.clone(),
            player_name: target.player_name.clone(),
            game_id,
            week: target.week.clone(),
            status,
            fantasy_points: parsed.fantasy_points,
            stats: parsed.stats,
            last_updated: now,
        })
    }
}
