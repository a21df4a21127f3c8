//! Playoff Scoring Job
//!
//! Reconciles weekly lineup picks against live player stats from the Tank01
//! NFL API and keeps a per-player, per-week Scores table up to date.
//!
//! One run is a single sequential pass:
//!
//! 1. **StatusReconciler** refreshes game statuses for weeks that are not final
//! 2. **ActiveGames** selects games that are live, final, or near kickoff
//! 3. **FetchPlanner** turns picks into deduplicated (player, week) targets
//! 4. **ScoreFetcher** calls the provider with retry, pacing and game validation
//! 5. **ScoreMerger** upserts results and writes the Scores table once

pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod merger;
pub mod models;
pub mod pipeline;
pub mod planner;
pub mod provider;
pub mod reconciler;
pub mod retry;
pub mod schedule;
pub mod window;

pub use cli::Cli;
pub use config::JobConfig;
pub use error::{JobError, ProviderError, Result};
pub use logging::initialize_logging;
pub use models::*;
pub use pipeline::ScoringJob;
pub use provider::{StatsProvider, Tank01Client};
