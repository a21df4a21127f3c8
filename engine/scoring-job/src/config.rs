//! Job configuration: defaults, then the secrets file, then the environment

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use persistence::{PersistenceConfig, StorageBackend};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Secrets file used when neither `--secrets` nor `SCORING_SECRETS_PATH` is given
pub const DEFAULT_SECRETS_PATH: &str = ".secrets/secrets.toml";

/// Configuration for one scoring run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Upstream stats provider
    pub provider: ProviderConfig,

    /// Table store
    pub storage: PersistenceConfig,

    /// Table names inside the store
    pub tables: TableNames,

    /// Retry policy for player stats calls
    pub retry: RetryConfig,

    /// Active window around kickoff
    pub window: WindowConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Zone that naive schedule kickoff times are written in
    pub schedule_timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// RapidAPI key; required
    pub api_key: String,

    /// RapidAPI host, sent as `X-RapidAPI-Host`
    pub host: String,

    /// Base URL; defaults to `https://{host}`
    pub base_url: Option<String>,

    /// Season year sent with week queries
    pub season: u32,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Minimum gap between consecutive player stats calls
    pub call_delay_ms: u64,

    /// Most recent games requested per player
    pub games_per_request: u32,

    /// Week label -> provider query parameters
    pub weeks: BTreeMap<String, WeekParams>,
}

/// Provider query parameters for one week label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekParams {
    pub week: u32,
    /// `reg` or `post`
    pub season_type: String,
}

impl WeekParams {
    fn new(week: u32, season_type: &str) -> Self {
        Self {
            week,
            season_type: season_type.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableNames {
    pub schedule: String,
    pub players: String,
    pub picks: String,
    pub scores: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub initial_delay_ms: u64,

    /// Backoff multiplier
    pub backoff_multiplier: f64,

    /// Upper bound for a single delay
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Minutes before kickoff a scheduled game becomes active
    pub lead_minutes: i64,

    /// Minutes after kickoff a scheduled game stays active
    pub trail_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, json, compact)
    pub format: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let weeks = [
            ("Week 17", WeekParams::new(17, "reg")),
            ("Week 18", WeekParams::new(18, "reg")),
            ("Wildcard", WeekParams::new(1, "post")),
            ("Divisional", WeekParams::new(2, "post")),
            ("Conference", WeekParams::new(3, "post")),
            ("Super Bowl", WeekParams::new(4, "post")),
        ]
        .into_iter()
        .map(|(label, params)| (label.to_string(), params))
        .collect();

        Self {
            api_key: String::new(),
            host: "tank01-nfl-live-in-game-real-time-statistics-nfl.p.rapidapi.com".to_string(),
            base_url: None,
            season: 2025,
            timeout_secs: 30,
            call_delay_ms: 1000,
            games_per_request: 1,
            weeks,
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            schedule: "schedule".to_string(),
            players: "players".to_string(),
            picks: "picks".to_string(),
            scores: "scores".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lead_minutes: 15,
            trail_minutes: 240,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ProviderConfig {
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.host))
    }

    /// Provider query parameters for a week label
    pub fn week_params(&self, label: &str) -> Option<&WeekParams> {
        self.weeks.get(label)
    }
}

/// Layout of the secrets TOML file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SecretsFile {
    rapidapi: RapidApiSecrets,
    storage: StorageSecrets,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RapidApiSecrets {
    key: Option<String>,
    host: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StorageSecrets {
    backend: Option<StorageBackend>,
    data_dir: Option<PathBuf>,
    database_url: Option<String>,
}

impl JobConfig {
    /// Load configuration for a run.
    ///
    /// An explicitly named secrets file must exist; the default one is optional.
    pub fn load(secrets_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = secrets_path.map(Path::to_path_buf).or_else(|| {
            std::env::var("SCORING_SECRETS_PATH")
                .ok()
                .map(PathBuf::from)
        });

        match explicit {
            Some(path) => config.apply_secrets_file(&path)?,
            None => {
                let path = Path::new(DEFAULT_SECRETS_PATH);
                if path.exists() {
                    config.apply_secrets_file(path)?;
                } else {
                    tracing::debug!(
                        path = %path.display(),
                        "No secrets file, using environment only"
                    );
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    fn apply_secrets_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read secrets file: {}", path.display()))?;
        self.apply_secrets(&contents)
            .with_context(|| format!("Invalid secrets file: {}", path.display()))
    }

    /// Merge a secrets TOML document into this configuration
    pub fn apply_secrets(&mut self, contents: &str) -> Result<()> {
        let secrets: SecretsFile = toml::from_str(contents)?;

        if let Some(key) = secrets.rapidapi.key {
            self.provider.api_key = key;
        }
        if let Some(host) = secrets.rapidapi.host {
            self.provider.host = host;
        }
        if let Some(backend) = secrets.storage.backend {
            self.storage.backend = backend;
        }
        if let Some(data_dir) = secrets.storage.data_dir {
            self.storage.data_dir = data_dir;
        }
        if secrets.storage.database_url.is_some() {
            self.storage.database_url = secrets.storage.database_url;
        }

        Ok(())
    }

    /// Override values from environment variables, looked up through `var`
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var("RAPIDAPI_KEY") {
            self.provider.api_key = key;
        }

        if let Some(host) = var("RAPIDAPI_HOST") {
            self.provider.host = host;
        }

        if let Some(season) = var("SCORING_SEASON") {
            self.provider.season = season
                .parse()
                .with_context(|| format!("Invalid SCORING_SEASON: {season}"))?;
        }

        if let Some(backend) = var("SCORING_STORAGE") {
            self.storage.backend = backend.parse().map_err(|e: String| anyhow!(e))?;
        }

        if let Some(data_dir) = var("SCORING_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Some(url) = var("DATABASE_URL") {
            self.storage.database_url = Some(url);
        }

        if let Some(level) = var("SCORING_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = var("SCORING_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Some(delay) = var("SCORING_CALL_DELAY_MS") {
            self.provider.call_delay_ms = delay
                .parse()
                .with_context(|| format!("Invalid SCORING_CALL_DELAY_MS: {delay}"))?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.provider.api_key.trim().is_empty() {
            return Err(anyhow!(
                "RapidAPI key is not configured (set RAPIDAPI_KEY or [rapidapi] key)"
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be at least 1"));
        }

        self.storage.validate().map_err(|e| anyhow!(e))?;
        self.timezone()?;

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(anyhow!("Invalid log level: {}", self.logging.level)),
        }

        match self.logging.format.as_str() {
            "json" | "pretty" | "compact" => {}
            _ => return Err(anyhow!("Invalid log format: {}", self.logging.format)),
        }

        Ok(())
    }

    /// Parsed schedule timezone
    pub fn timezone(&self) -> Result<Tz> {
        self.schedule_timezone.parse::<Tz>().map_err(|e| {
            anyhow!(
                "Invalid schedule timezone '{}': {e}",
                self.schedule_timezone
            )
        })
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            storage: PersistenceConfig::default(),
            tables: TableNames::default(),
            retry: RetryConfig::default(),
            window: WindowConfig::default(),
            logging: LoggingConfig::default(),
            schedule_timezone: "America/New_York".to_string(),
        }
    }
}
