use crate::config::WindowConfig;
use crate::models::{Game, GameStatus};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Games eligible for stats fetching at a given instant, with the lookups
/// the planner and fetcher need
#[derive(Debug, Clone, Default)]
pub struct ActiveGames {
    games: Vec<Game>,
    /// (week, team) -> status of that team's game
    team_status: HashMap<(String, String), GameStatus>,
    /// week -> game IDs
    game_ids: HashMap<String, HashSet<String>>,
    /// game ID -> status
    status_by_game: HashMap<String, GameStatus>,
}

/// In-progress and final games are always active; scheduled games only
/// inside [kickoff - lead, kickoff + trail]
pub fn is_active(game: &Game, now: DateTime<Utc>, window: &WindowConfig) -> bool {
    match game.status {
        GameStatus::InProgress | GameStatus::Final => true,
        GameStatus::Scheduled => {
            let opens = game.kickoff - Duration::minutes(window.lead_minutes);
            let closes = game.kickoff + Duration::minutes(window.trail_minutes);
            opens <= now && now <= closes
        }
        GameStatus::Other(_) => false,
    }
}

impl ActiveGames {
    pub fn select(games: &[Game], now: DateTime<Utc>, window: &WindowConfig) -> Self {
        let mut active = Self::default();

        for game in games.iter().filter(|g| is_active(g, now, window)) {
            for team in [&game.home_team, &game.away_team] {
                if !team.is_empty() {
                    active
                        .team_status
                        .insert((game.week.clone(), team.to_uppercase()), game.status.clone());
                }
            }
            active
                .game_ids
                .entry(game.week.clone())
                .or_default()
                .insert(game.game_id.clone());
            active.status_by_game.insert(game.game_id.clone(), game.status.clone());
            active.games.push(game.clone());
        }

        active
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Distinct weeks with at least one active game
    pub fn weeks(&self) -> BTreeSet<String> {
        self.game_ids.keys().cloned().collect()
    }

    /// The active week matching `label` case-insensitively, as spelled in the schedule
    pub fn canonical_week(&self, label: &str) -> Option<&str> {
        let label = label.trim();
        self.game_ids.keys().find(|w| w.eq_ignore_ascii_case(label)).map(String::as_str)
    }

    pub fn team_status(&self, week: &str, team: &str) -> Option<&GameStatus> {
        self.team_status.get(&(week.to_string(), team.to_uppercase()))
    }

    /// Whether `game_id` is one of the active games of `week`
    pub fn is_valid_game(&self, week: &str, game_id: &str) -> bool {
        self.game_ids.get(week).is_some_and(|ids| ids.contains(game_id))
    }

    pub fn status_of(&self, game_id: &str) -> Option<&GameStatus> {
        self.status_by_game.get(game_id)
    }
}
