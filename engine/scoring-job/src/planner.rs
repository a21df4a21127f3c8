use crate::models::{FetchTarget, Pick, ScoreRecord};
use crate::window::ActiveGames;
use persistence::KeyedTable;
use player_registry::PlayerRegistry;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// Why candidates were dropped while planning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanStats {
    pub unresolved: usize,
    pub not_started: usize,
    pub already_final: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FetchPlan {
    /// Sorted by (week, player name), unique by (player ID, week)
    pub targets: Vec<FetchTarget>,
    pub stats: PlanStats,
}

/// Decides which (player, week) pairs need a stats call this run
pub struct FetchPlanner<'a> {
    registry: &'a PlayerRegistry,
    active: &'a ActiveGames,
    scores: &'a KeyedTable<ScoreRecord>,
}

impl<'a> FetchPlanner<'a> {
    pub fn new(
        registry: &'a PlayerRegistry,
        active: &'a ActiveGames,
        scores: &'a KeyedTable<ScoreRecord>,
    ) -> Self {
        Self {
            registry,
            active,
            scores,
        }
    }

    /// Weeks to plan for: the override if given, else the weeks of active games
    fn target_weeks(&self, week_override: Option<&str>) -> BTreeSet<String> {
        match week_override {
            Some(label) => {
                let week = self.active.canonical_week(label).unwrap_or(label.trim());
                info!(week = %week, "Using week override");
                BTreeSet::from([week.to_string()])
            }
            None => self.active.weeks(),
        }
    }

    pub fn plan(&self, picks: &[Pick], week_override: Option<&str>) -> FetchPlan {
        let mut plan = FetchPlan::default();

        let weeks = self.target_weeks(week_override);
        if weeks.is_empty() {
            info!("No active game weeks found");
            return plan;
        }

        // week -> distinct picked names
        let mut picked: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for pick in picks {
            let pick_week = pick.week.trim();
            if let Some(week) = weeks.iter().find(|w| w.eq_ignore_ascii_case(pick_week)) {
                picked.entry(week.as_str()).or_default().extend(pick.players());
            }
        }

        let mut seen: HashSet<(String, String)> = HashSet::new();

        for (week, names) in picked {
            for name in names {
                let player = match self.registry.resolve(name) {
                    Ok(player) => player,
                    Err(e) => {
                        warn!(player = %name, week = %week, "{e}");
                        plan.stats.unresolved += 1;
                        continue;
                    }
                };

                if self.active.team_status(week, &player.team).is_none() {
                    debug!(
                        player = %player.name,
                        team = %player.team,
                        week = %week,
                        "Team has no active game"
                    );
                    plan.stats.not_started += 1;
                    continue;
                }

                let key = (player.player_id.clone(), week.to_string());
                if self.scores.get(&key).is_some_and(ScoreRecord::is_final) {
                    plan.stats.already_final += 1;
                    continue;
                }

                if !seen.insert(key) {
                    plan.stats.duplicates += 1;
                    continue;
                }

                plan.targets.push(FetchTarget {
                    player_id: player.player_id.clone(),
                    player_name: player.name.clone(),
                    week: week.to_string(),
                });
            }
        }

        plan.targets
            .sort_by(|a, b| (&a.week, &a.player_name).cmp(&(&b.week, &b.player_name)));

        if plan.stats.not_started > 0 {
            info!(
                count = plan.stats.not_started,
                "Skipped players whose games haven't started"
            );
        }
        if plan.stats.already_final > 0 {
            info!(
                count = plan.stats.already_final,
                "Skipped players with final scores recorded"
            );
        }
        if plan.stats.duplicates > 0 {
            warn!(
                count = plan.stats.duplicates,
                "Removed duplicate player-week combinations"
            );
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowConfig;
    use crate::models::{Game, GameStatus, StatLine};
    use chrono::{DateTime, TimeZone, Utc};
    use player_registry::Player;

    fn game(id: &str, week: &str, home: &str, away: &str, status: GameStatus) -> Game {
        Game {
            game_id: id.to_string(),
            week: week.to_string(),
            kickoff: Utc.with_ymd_and_hms(2026, 1, 10, 21, 25, 0).unwrap(),
            game_time: "2026-01-10T16:25:00".to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            status,
        }
    }

    fn pick(user: &str, week: &str, qb: &str, rb1: &str) -> Pick {
        let slot = |name: &str| (!name.is_empty()).then(|| name.to_string());
        Pick {
            user: user.to_string(),
            week: week.to_string(),
            slots: [slot(qb), slot(rb1), None, None, None, None],
        }
    }

    fn score(player_id: &str, week: &str, status: GameStatus) -> ScoreRecord {
        ScoreRecord {
            player_id: player_id.to_string(),
            player_name: "x".to_string(),
            game_id: "G1".to_string(),
            week: week.to_string(),
            status,
            fantasy_points: 10.0,
            stats: StatLine::default(),
            last_updated: Utc.with_ymd_and_hms(2026, 1, 10, 23, 0, 0).unwrap(),
        }
    }

    fn registry() -> PlayerRegistry {
        PlayerRegistry::from_players(&[
            Player::new("Caleb Williams", "P1", "CHI"),
            Player::new("Jordan Love", "P2", "GB"),
            Player::new("Josh Allen", "P3", "BUF"),
        ])
    }

    fn window() -> WindowConfig {
        WindowConfig::default()
    }

    fn kickoff_minus_5() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 21, 20, 0).unwrap()
    }

    #[test]
    fn test_same_player_two_users_one_target() {
        let games = vec![game("G1", "Wildcard", "CHI", "GB", GameStatus::Scheduled)];
        let active = ActiveGames::select(&games, kickoff_minus_5(), &window());
        let scores = KeyedTable::from_records("scores", vec![]);
        let registry = registry();

        let picks = vec![
            pick("alice", "Wildcard", "Caleb Williams", "Jordan Love"),
            pick("bob", "wildcard", "Caleb Williams", ""),
        ];
        let plan = FetchPlanner::new(&registry, &active, &scores).plan(&picks, None);

        let ids: Vec<&str> = plan.targets.iter().map(|t| t.player_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
        assert!(plan.targets.iter().all(|t| t.week == "Wildcard"));
    }

    #[test]
    fn test_final_scores_are_never_replanned() {
        let games = vec![game("G1", "Wildcard", "CHI", "GB", GameStatus::Final)];
        let active = ActiveGames::select(&games, kickoff_minus_5(), &window());
        let scores = KeyedTable::from_records(
            "scores",
            vec![
                score("P1", "Wildcard", GameStatus::Final),
                score("P2", "Wildcard", GameStatus::InProgress),
            ],
        );
        let registry = registry();

        let picks = vec![pick("carol", "Wildcard", "Caleb Williams", "Jordan Love")];
        let plan = FetchPlanner::new(&registry, &active, &scores).plan(&picks, None);

        assert_eq!(plan.targets.len(), 1);
        assert_eq!(plan.targets[0].player_id, "P2");
        assert_eq!(plan.stats.already_final, 1);
    }

    #[test]
    fn test_inactive_team_and_unknown_names_dropped() {
        let games = vec![game("G1", "Wildcard", "CHI", "GB", GameStatus::InProgress)];
        let active = ActiveGames::select(&games, kickoff_minus_5(), &window());
        let scores = KeyedTable::from_records("scores", vec![]);
        let registry = registry();

        let picks = vec![
            pick("dan", "Wildcard", "Josh Allen", "Nobody Known"),
            pick("erin", "Divisional", "Caleb Williams", ""),
        ];
        let plan = FetchPlanner::new(&registry, &active, &scores).plan(&picks, None);

        assert!(plan.targets.is_empty());
        assert_eq!(plan.stats.not_started, 1);
        assert_eq!(plan.stats.unresolved, 1);
    }

    #[test]
    fn test_week_override_still_requires_active_team() {
        let games = vec![
            game("G1", "Wildcard", "CHI", "GB", GameStatus::Final),
            game("G5", "Divisional", "BUF", "DEN", GameStatus::InProgress),
        ];
        let active = ActiveGames::select(&games, kickoff_minus_5(), &window());
        let scores = KeyedTable::from_records("scores", vec![]);
        let registry = registry();

        let picks = vec![
            pick("fay", "Wildcard", "Caleb Williams", ""),
            pick("fay", "Divisional", "Josh Allen", ""),
        ];
        let plan =
            FetchPlanner::new(&registry, &active, &scores).plan(&picks, Some("WILDCARD"));

        assert_eq!(plan.targets.len(), 1);
        assert_eq!(plan.targets[0].player_id, "P1");
        assert_eq!(plan.targets[0].week, "Wildcard");
    }

    #[test]
    fn test_no_active_weeks_yields_empty_plan() {
        let active = ActiveGames::default();
        let scores = KeyedTable::from_records("scores", vec![]);
        let registry = registry();

        let plan = FetchPlanner::new(&registry, &active, &scores)
            .plan(&[pick("gus", "Wildcard", "Caleb Williams", "")], None);

        assert!(plan.targets.is_empty());
        assert_eq!(plan.stats, PlanStats::default());
    }
}
