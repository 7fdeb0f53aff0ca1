//! Log output configuration from the environment.

use std::fmt;
use std::str::FromStr;

pub const LOG_FORMAT_VAR: &str = "MENUGATE_LOG_FORMAT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Raw value of `MENUGATE_LOG_FORMAT` when it named no known format.
    /// Reported once the subscriber is up.
    pub unrecognized_format: Option<String>,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(LOG_FORMAT_VAR).filter(|v| !v.trim().is_empty()) {
            None => Self::default(),
            Some(raw) => match raw.parse() {
                Ok(format) => Self { format, unrecognized_format: None },
                Err(_) => Self { format: LogFormat::Json, unrecognized_format: Some(raw) },
            },
        }
    }
}
