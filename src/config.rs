//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

use crate::{engine::CatchUpPolicy, state::Durations};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "focus-day")]
#[command(about = "A crash-tolerant focus/break day timer served over a local HTTP API")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Snapshot file [default: <local data dir>/focus-day/state.json]
    #[arg(short, long)]
    pub state_file: Option<PathBuf>,

    /// Focus interval length in minutes
    #[arg(long, default_value = "25")]
    pub focus_minutes: u64,

    /// Short break length in minutes
    #[arg(long, default_value = "5")]
    pub short_break_minutes: u64,

    /// Long break length in minutes
    #[arg(long, default_value = "30")]
    pub long_break_minutes: u64,

    /// Completions to replay when restoring after a long gap
    #[arg(long, value_enum, default_value_t = CatchUpPolicy::Single)]
    pub catch_up: CatchUpPolicy,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn durations(&self) -> Durations {
        Durations::from_minutes(
            self.focus_minutes,
            self.short_break_minutes,
            self.long_break_minutes,
        )
    }

    /// Resolved snapshot path
    pub fn state_path(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("focus-day")
                .join("state.json")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["focus-day"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.durations(), Durations::from_minutes(25, 5, 30));
        assert_eq!(config.catch_up, CatchUpPolicy::Single);
        assert_eq!(config.log_level(), "info");
        assert!(config.state_path().ends_with("focus-day/state.json"));
    }

    #[test]
    fn overrides() {
        let config = Config::try_parse_from([
            "focus-day",
            "--focus-minutes",
            "50",
            "--catch-up",
            "cascade",
            "--state-file",
            "/tmp/day.json",
            "-v",
        ])
        .unwrap();
        assert_eq!(config.durations().focus_seconds, 3000);
        assert_eq!(config.catch_up, CatchUpPolicy::Cascade);
        assert_eq!(config.state_path(), PathBuf::from("/tmp/day.json"));
        assert_eq!(config.log_level(), "debug");
    }
}
