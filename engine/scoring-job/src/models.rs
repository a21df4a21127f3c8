use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use persistence::{row_from_pairs, KeyedRecord, Row, RowReader, TableRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a game: scheduled -> in_progress -> final
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Final,
    /// Unrecognized upstream status, kept lower-cased
    Other(String),
}

impl GameStatus {
    /// Normalize a status string as returned by the provider
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim() {
            "Scheduled" => Self::Scheduled,
            "In Progress" | "In-Progress" => Self::InProgress,
            "Final" | "Completed" => Self::Final,
            other => Self::parse_stored(other),
        }
    }

    /// Parse a status string as written to the Schedule/Scores tables
    pub fn parse_stored(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        match lowered.as_str() {
            "scheduled" => Self::Scheduled,
            "in_progress" => Self::InProgress,
            "final" => Self::Final,
            _ => Self::Other(lowered),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Final => "final",
            Self::Other(s) => s.as_str(),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the Schedule table
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub game_id: String,
    pub week: String,
    /// Kickoff as an instant
    pub kickoff: DateTime<Utc>,
    /// Kickoff exactly as stored, written back unchanged
    pub game_time: String,
    pub home_team: String,
    pub away_team: String,
    pub status: GameStatus,
}

impl Game {
    /// Decode a schedule row. Naive kickoff times are read in `tz`.
    pub fn from_row_in(row: &RowReader<'_>, tz: Tz) -> persistence::Result<Self> {
        let game_time = row.required("gameTime")?;
        let kickoff = parse_kickoff(&game_time, tz).ok_or_else(|| {
            row.error("gameTime", format!("unrecognized timestamp '{game_time}'"))
        })?;

        Ok(Self {
            game_id: row.required("gameID")?,
            week: row.required("gameWeek")?,
            kickoff,
            game_time,
            home_team: row.text("homeTeam")?.to_uppercase(),
            away_team: row.text("awayTeam")?.to_uppercase(),
            status: GameStatus::parse_stored(&row.required("gameStatus")?),
        })
    }

    pub fn to_row(&self) -> Row {
        row_from_pairs([
            ("gameID", self.game_id.clone()),
            ("gameWeek", self.week.clone()),
            ("gameTime", self.game_time.clone()),
            ("homeTeam", self.home_team.clone()),
            ("awayTeam", self.away_team.clone()),
            ("gameStatus", self.status.as_str().to_string()),
        ])
    }
}

const NAIVE_KICKOFF_FORMATS: [&str; 3] =
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse an RFC 3339 timestamp, or a naive local timestamp interpreted in `tz`
pub fn parse_kickoff(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_KICKOFF_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Lineup slot columns of the Picks table
pub const PICK_SLOTS: [&str; 6] = ["QB", "RB1", "RB2", "WR1", "WR2", "TE"];

/// One user's lineup for one week
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub user: String,
    pub week: String,
    pub slots: [Option<String>; 6],
}

impl Pick {
    /// Non-empty player names across the six slots
    pub fn players(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|slot| slot.as_deref())
    }
}

impl TableRecord for Pick {
    fn from_row(row: &RowReader<'_>) -> persistence::Result<Self> {
        Ok(Self {
            user: row.text("User Name")?,
            week: row.text("Week")?,
            slots: PICK_SLOTS.map(|slot| row.optional(slot)),
        })
    }

    fn to_row(&self) -> Row {
        let mut row = row_from_pairs([
            ("User Name", self.user.clone()),
            ("Week", self.week.clone()),
        ]);
        for (slot, player) in PICK_SLOTS.iter().zip(&self.slots) {
            row.insert(slot.to_string(), player.clone().unwrap_or_default());
        }
        row
    }
}

/// Raw stat breakdown for one player in one game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatLine {
    pub pass_yards: i64,
    pub pass_td: i64,
    pub pass_int: i64,
    pub rush_yards: i64,
    pub rush_td: i64,
    pub rec_yards: i64,
    pub rec_td: i64,
    pub receptions: i64,
    pub targets: i64,
    pub fumbles: i64,
}

/// A player's captured score for one week, keyed by (player ID, week)
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub player_id: String,
    pub player_name: String,
    pub game_id: String,
    pub week: String,
    /// Game status when this score was captured; `final` is terminal
    pub status: GameStatus,
    pub fantasy_points: f64,
    pub stats: StatLine,
    pub last_updated: DateTime<Utc>,
}

impl ScoreRecord {
    pub fn is_final(&self) -> bool {
        self.status.is_final()
    }
}

/// Stat cells are whole numbers; older rows may carry a trailing ".0"
fn parse_count(row: &RowReader<'_>, column: &str) -> persistence::Result<i64> {
    let value: f64 = row.parse(column)?;
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(row.error(column, format!("expected a whole number, got {value}")));
    }
    Ok(value as i64)
}

impl TableRecord for ScoreRecord {
    fn from_row(row: &RowReader<'_>) -> persistence::Result<Self> {
        let last_updated_raw = row.required("lastUpdated")?;
        let last_updated = DateTime::parse_from_rfc3339(&last_updated_raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                row.error(
                    "lastUpdated",
                    format!("cannot parse '{last_updated_raw}': {e}"),
                )
            })?;

        Ok(Self {
            player_id: row.required("playerID")?,
            player_name: row.text("playerName")?,
            game_id: row.text("gameID")?,
            week: row.required("gameWeek")?,
            status: GameStatus::parse_stored(&row.text("gameStatus")?),
            fantasy_points: row.parse("fantasyPoints")?,
            stats: StatLine {
                pass_yards: parse_count(row, "passYards")?,
                pass_td: parse_count(row, "passTD")?,
                pass_int: parse_count(row, "passInt")?,
                rush_yards: parse_count(row, "rushYards")?,
                rush_td: parse_count(row, "rushTD")?,
                rec_yards: parse_count(row, "recYards")?,
                rec_td: parse_count(row, "recTD")?,
                receptions: parse_count(row, "receptions")?,
                targets: parse_count(row, "targets")?,
                fumbles: parse_count(row, "fumbles")?,
            },
            last_updated,
        })
    }

    fn to_row(&self) -> Row {
        let s = &self.stats;
        row_from_pairs([
            ("playerID", self.player_id.clone()),
            ("playerName", self.player_name.clone()),
            ("gameID", self.game_id.clone()),
            ("gameWeek", self.week.clone()),
            ("gameStatus", self.status.as_str().to_string()),
            ("fantasyPoints", self.fantasy_points.to_string()),
            ("passYards", s.pass_yards.to_string()),
            ("passTD", s.pass_td.to_string()),
            ("passInt", s.pass_int.to_string()),
            ("rushYards", s.rush_yards.to_string()),
            ("rushTD", s.rush_td.to_string()),
            ("recYards", s.rec_yards.to_string()),
            ("recTD", s.rec_td.to_string()),
            ("receptions", s.receptions.to_string()),
            ("targets", s.targets.to_string()),
            ("fumbles", s.fumbles.to_string()),
            (
                "lastUpdated",
                self.last_updated.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
        ])
    }
}

impl KeyedRecord for ScoreRecord {
    type Key = (String, String);

    fn key(&self) -> Self::Key {
        (self.player_id.clone(), self.week.clone())
    }

    fn same_content(&self, other: &Self) -> bool {
        self.player_id == other.player_id
            && self.player_name == other.player_name
            && self.game_id == other.game_id
            && self.week == other.week
            && self.status == other.status
            && self.fantasy_points == other.fantasy_points
            && self.stats == other.stats
    }
}

/// A (player, week) pair selected for a provider stats call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FetchTarget {
    pub player_id: String,
    pub player_name: String,
    pub week: String,
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub weeks_polled: usize,
    pub games_changed: usize,
    pub active_games: usize,
    pub targets: usize,
    pub fetched: usize,
    pub rejected: usize,
    pub empty: usize,
    pub failed: usize,
    pub scores_inserted: usize,
    pub scores_updated: usize,
    pub scores_written: bool,
}
