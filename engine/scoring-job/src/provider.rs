//! Tank01 NFL API client (RapidAPI)

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::models::GameStatus;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const GAMES_FOR_WEEK_ENDPOINT: &str = "getNFLGamesForWeek";
pub const GAMES_FOR_PLAYER_ENDPOINT: &str = "getNFLGamesForPlayer";

/// Fantasy scoring rules sent with every player stats request
pub const SCORING_RULES: &[(&str, &str)] = &[
    ("passYards", ".04"),
    ("passTD", "4"),
    ("passInterceptions", "-2"),
    ("pointsPerReception", "0"),
    ("rushYards", ".1"),
    ("rushTD", "6"),
    ("fumbles", "-2"),
    ("receivingYards", ".1"),
    ("receivingTD", "6"),
    ("targets", "0"),
    ("defTD", "6"),
    ("xpMade", "1"),
    ("xpMissed", "-1"),
    ("fgMade", "3"),
    ("fgMissed", "-3"),
    ("twoPointConversions", "2"),
];

/// Parameters for a "games for week" query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekQuery {
    pub label: String,
    pub week: u32,
    pub season_type: String,
    pub season: u32,
}

/// A game as reported by the provider's weekly listing
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderGame {
    pub game_id: String,
    pub status: GameStatus,
}

/// Upstream source of game statuses and player stats
#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// All games of one week with their current status
    async fn games_for_week(&self, query: &WeekQuery) -> Result<Vec<ProviderGame>, ProviderError>;

    /// The player's most recent game with stats and fantasy points, or `None`
    /// when the provider has nothing for this player
    async fn player_game_stats(&self, player_id: &str) -> Result<Option<Value>, ProviderError>;
}

/// Check the `{statusCode, body}` envelope and return the body
pub fn unwrap_envelope(endpoint: &str, envelope: Value) -> Result<Value, ProviderError> {
    let status_code = match envelope.get("statusCode") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    match status_code {
        Some(200) => Ok(envelope.get("body").cloned().unwrap_or(Value::Null)),
        Some(code) => Err(ProviderError::Rejected {
            endpoint: endpoint.to_string(),
            status_code: code,
        }),
        None => Err(ProviderError::Decode {
            endpoint: endpoint.to_string(),
            message: "response has no statusCode".to_string(),
        }),
    }
}

/// Game entries of a body that is either a list or an object keyed by game id
fn body_items(body: &Value) -> Vec<&Value> {
    match body {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) if map.contains_key("gameID") => vec![body],
        Value::Object(map) => map.values().filter(|v| v.is_object()).collect(),
        _ => Vec::new(),
    }
}

/// The first game entry of a player stats body
pub fn first_game(body: &Value) -> Option<Value> {
    body_items(body).into_iter().next().cloned()
}

/// Read a string-or-number field as text
pub fn text_field(item: &Value, field: &str) -> Option<String> {
    match item.get(field)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode a weekly games listing
pub fn parse_week_games(body: &Value) -> Vec<ProviderGame> {
    body_items(body)
        .into_iter()
        .filter_map(|item| {
            let game_id = text_field(item, "gameID").filter(|id| !id.is_empty())?;
            let status =
                text_field(item, "gameStatus").unwrap_or_else(|| "Scheduled".to_string());
            Some(ProviderGame {
                game_id,
                status: GameStatus::from_provider(&status),
            })
        })
        .collect()
}

/// HTTP client for the Tank01 NFL API
pub struct Tank01Client {
    client: Client,
    base_url: String,
    host: String,
    api_key: String,
    games_per_request: u32,
}

impl Tank01Client {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            host: config.host.clone(),
            api_key: config.api_key.clone(),
            games_per_request: config.games_per_request,
        })
    }

    async fn get_body(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ProviderError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(endpoint, "Calling provider");

        let response = self
            .client
            .get(&url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.host)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let envelope: Value = serde_json::from_str(&text).map_err(|e| ProviderError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        unwrap_envelope(endpoint, envelope)
    }
}

#[async_trait]
impl StatsProvider for Tank01Client {
    async fn games_for_week(
        &self,
        query: &WeekQuery,
    ) -> Result<Vec<ProviderGame>, ProviderError> {
        let params = [
            ("week", query.week.to_string()),
            ("seasonType", query.season_type.clone()),
            ("season", query.season.to_string()),
        ];

        let body = self.get_body(GAMES_FOR_WEEK_ENDPOINT, &params).await?;
        Ok(parse_week_games(&body))
    }

    async fn player_game_stats(
        &self,
        player_id: &str,
    ) -> Result<Option<Value>, ProviderError> {
        let mut params: Vec<(&str, String)> = vec![
            ("playerID", player_id.to_string()),
            ("numberOfGames", self.games_per_request.to_string()),
            ("fantasyPoints", "true".to_string()),
            ("itemFormat", "list".to_string()),
        ];
        params.extend(SCORING_RULES.iter().map(|(k, v)| (*k, v.to_string())));

        let body = self.get_body(GAMES_FOR_PLAYER_ENDPOINT, &params).await?;
        Ok(first_game(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_status_codes() {
        let body = unwrap_envelope("e", json!({"statusCode": 200, "body": [1]})).unwrap();
        assert_eq!(body, json!([1]));

        let as_text = unwrap_envelope("e", json!({"statusCode": "200", "body": []})).unwrap();
        assert_eq!(as_text, json!([]));

        let rejected =
            unwrap_envelope("e", json!({"statusCode": 429, "error": "quota"})).unwrap_err();
        assert!(matches!(
            rejected,
            ProviderError::Rejected {
                status_code: 429,
                ..
            }
        ));
        assert!(!rejected.is_retryable());

        assert!(matches!(
            unwrap_envelope("e", json!({"body": []})),
            Err(ProviderError::Decode { .. })
        ));
    }

    #[test]
    fn test_first_game_list_or_map() {
        let list = json!([{"gameID": "G1"}, {"gameID": "G2"}]);
        assert_eq!(first_game(&list).unwrap()["gameID"], "G1");

        let keyed = json!({"G7": {"gameID": "G7", "fantasyPoints": "4.2"}});
        assert_eq!(first_game(&keyed).unwrap()["gameID"], "G7");

        let single = json!({"gameID": "G9"});
        assert_eq!(first_game(&single).unwrap()["gameID"], "G9");

        assert!(first_game(&json!([])).is_none());
        assert!(first_game(&Value::Null).is_none());
    }

    #[test]
    fn test_parse_week_games_normalizes_status() {
        let body = json!([
            {"gameID": "20260110_GB@CHI", "gameStatus": "In Progress"},
            {"gameID": "20260110_LAR@CAR", "gameStatus": "Completed"},
            {"gameID": "20260111_BUF@JAX"},
            {"gameStatus": "Final"}
        ]);

        let games = parse_week_games(&body);
        assert_eq!(games.len(), 3);
        assert_eq!(games[0].status, GameStatus::InProgress);
        assert_eq!(games[1].status, GameStatus::Final);
        assert_eq!(games[2].status, GameStatus::Scheduled);
    }

    #[test]
    fn test_text_field_accepts_numbers() {
        let item = json!({"gameID": 20260110, "team": " CHI "});
        assert_eq!(text_field(&item, "gameID").unwrap(), "20260110");
        assert_eq!(text_field(&item, "team").unwrap(), "CHI");
        assert!(text_field(&item, "missing").is_none());
    }
}
