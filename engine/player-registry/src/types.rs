use persistence::{row_from_pairs, Row, RowReader, TableRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the Players reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, the key picks refer to (e.g., "Lamar Jackson")
    pub name: String,

    /// Provider player identifier; `None` when the import could not match one
    pub player_id: Option<String>,

    /// Team abbreviation, upper-cased (e.g., "BAL", "BUF")
    pub team: String,
}

impl Player {
    pub fn new(
        name: impl Into<String>,
        player_id: impl Into<String>,
        team: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            player_id: Some(player_id.into()),
            team: team.into().trim().to_uppercase(),
        }
    }
}

impl TableRecord for Player {
    fn from_row(row: &RowReader<'_>) -> persistence::Result<Self> {
        Ok(Self {
            name: row.required("playerName")?,
            player_id: row.optional("playerID"),
            team: row.text("team")?.to_uppercase(),
        })
    }

    fn to_row(&self) -> Row {
        row_from_pairs([
            ("playerName", self.name.clone()),
            ("playerID", self.player_id.clone().unwrap_or_default()),
            ("team", self.team.clone()),
        ])
    }
}

/// A player that can be fetched from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlayer {
    pub name: String,
    pub player_id: String,
    pub team: String,
}

/// Errors that can occur during player lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerLookupError {
    /// Name not present in the reference table
    PlayerNotFound(String),

    /// Name present but without a provider ID
    MissingPlayerId(String),
}

impl fmt::Display for PlayerLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerLookupError::PlayerNotFound(name) => {
                write!(f, "Player '{name}' not found in registry")
            }
            PlayerLookupError::MissingPlayerId(name) => {
                write!(f, "Player '{name}' has no provider ID")
            }
        }
    }
}

impl std::error::Error for PlayerLookupError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_from_row_normalizes_team() {
        let row = row_from_pairs([
            ("playerName", "Josh Allen"),
            ("playerID", "3918298"),
            ("team", " buf "),
        ]);
        let player = Player::from_row(&RowReader::new("players", 0, &row)).unwrap();

        assert_eq!(player, Player::new("Josh Allen", "3918298", "BUF"));
    }

    #[test]
    fn test_player_without_id_is_kept_unresolved() {
        let row = row_from_pairs([("playerName", "Rookie"), ("playerID", "nan"), ("team", "KC")]);
        let player = Player::from_row(&RowReader::new("players", 3, &row)).unwrap();

        assert_eq!(player.player_id, None);
    }

    #[test]
    fn test_player_missing_column_is_schema_error() {
        let row = row_from_pairs([("playerName", "Josh Allen"), ("playerID", "1")]);
        assert!(Player::from_row(&RowReader::new("players", 0, &row)).is_err());
    }
}
