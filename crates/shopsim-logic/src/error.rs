//! Error types for the `shopsim-logic` crate.
//!
//! Business-rule failures (a declined lot, a missed installment, a negative
//! balance) are not errors; they travel in the [`DaySummary`]. These types
//! cover contract violations and I/O around the engine.
//!
//! [`DaySummary`]: crate::engine::DaySummary

use crate::config::ConfigIssue;

/// Errors raised by the day engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `advance` was called after the last configured day.
    #[error("simulation already finished: day {day} of {horizon}")]
    HorizonReached {
        /// Day the state is on.
        day: u32,
        /// Configured last day.
        horizon: u32,
    },

    /// The configuration failed validation.
    #[error("invalid configuration: {}", join_issues(.0))]
    InvalidConfig(Vec<ConfigIssue>),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {}", join_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

/// Errors that can occur during save/load.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_message() {
        let e = EngineError::HorizonReached {
            day: 100,
            horizon: 100,
        };
        assert_eq!(e.to_string(), "simulation already finished: day 100 of 100");
    }

    #[test]
    fn test_invalid_config_lists_issues() {
        let e = EngineError::InvalidConfig(vec![
            ConfigIssue::ZeroHorizon,
            ConfigIssue::ZeroRegenerationPeriod,
        ]);
        let msg = e.to_string();
        assert!(msg.contains("horizon_days"));
        assert!(msg.contains("regeneration_period"));
    }
}
