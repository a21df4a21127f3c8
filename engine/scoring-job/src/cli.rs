//! Command line arguments for the `scoring-job` binary

use clap::Parser;
use std::path::PathBuf;

/// Fetch live player stats for picked players and update the Scores table
#[derive(Debug, Parser)]
#[command(name = "scoring-job")]
#[command(about = "Reconcile playoff picks against live NFL player stats")]
pub struct Cli {
    /// Fetch scores for this week label (e.g. "Wildcard") instead of the active weeks
    #[arg(long)]
    pub week: Option<String>,

    /// Path to the secrets TOML file
    #[arg(long)]
    pub secrets: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::parse_from([
            "scoring-job",
            "--week",
            "Super Bowl",
            "--secrets",
            "/etc/scoring/secrets.toml",
        ]);
        assert_eq!(cli.week.as_deref(), Some("Super Bowl"));
        assert_eq!(cli.secrets, Some(PathBuf::from("/etc/scoring/secrets.toml")));

        let bare = Cli::parse_from(["scoring-job"]);
        assert!(bare.week.is_none());
        assert!(bare.secrets.is_none());
    }
}
