use crate::types::{Player, PlayerLookupError, ResolvedPlayer};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Player Registry - resolves pick names to provider IDs and teams
///
/// Built fresh from the Players table at the start of each run. Names match
/// exactly after trimming, with a case-insensitive fallback.
pub struct PlayerRegistry {
    /// Map from exact player name to entry
    players_by_name: HashMap<String, ResolvedPlayer>,

    /// Map from lower-cased name to exact name
    names_by_folded: HashMap<String, String>,

    /// Names present in the table without a provider ID
    unresolved: HashSet<String>,
}

impl PlayerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            players_by_name: HashMap::new(),
            names_by_folded: HashMap::new(),
            unresolved: HashSet::new(),
        }
    }

    /// Build the registry from the Players reference table.
    ///
    /// A name that appears more than once resolves to its last row.
    pub fn from_players(players: &[Player]) -> Self {
        let mut registry = Self::new();

        for player in players {
            let name = player.name.trim().to_string();
            let seen = registry.players_by_name.remove(&name).is_some()
                | registry.unresolved.remove(&name);
            if seen {
                warn!(player = %name, "Duplicate player name in reference table, keeping last");
            }
            registry
                .names_by_folded
                .insert(name.to_lowercase(), name.clone());

            match player
                .player_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
            {
                Some(player_id) => {
                    let resolved = ResolvedPlayer {
                        name: name.clone(),
                        player_id: player_id.to_string(),
                        team: player.team.clone(),
                    };
                    registry.players_by_name.insert(name, resolved);
                }
                None => {
                    debug!(player = %name, "Player has no provider ID");
                    registry.unresolved.insert(name);
                }
            }
        }

        registry
    }

    /// Resolve a pick name to its provider ID and team
    pub fn resolve(&self, name: &str) -> Result<&ResolvedPlayer, PlayerLookupError> {
        let name = name.trim();

        if let Some(player) = self.players_by_name.get(name) {
            return Ok(player);
        }

        let exact = self.names_by_folded.get(&name.to_lowercase());
        if let Some(player) = exact.and_then(|exact| self.players_by_name.get(exact)) {
            return Ok(player);
        }

        let unresolved = self.unresolved.contains(name)
            || exact.is_some_and(|e| self.unresolved.contains(e));
        if unresolved {
            Err(PlayerLookupError::MissingPlayerId(name.to_string()))
        } else {
            Err(PlayerLookupError::PlayerNotFound(name.to_string()))
        }
    }

    /// Number of players with a provider ID
    pub fn player_count(&self) -> usize {
        self.players_by_name.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.players_by_name.is_empty()
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
