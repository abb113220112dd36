use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a record, ordered from least to most severe.
///
/// `Fatal` and `Panic` are ordinary levels for filtering purposes; the
/// process-terminating side effect lives in the logging calls, not here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
}

impl Level {
    /// Normalize a configured level name. Matching is case-insensitive and
    /// anything unrecognized becomes [`Level::Info`].
    pub fn parse(level: &str) -> Level {
        match level.to_ascii_lowercase().as_str() {
            "trace" => Level::Trace,
            "debug" => Level::Debug,
            "info" => Level::Info,
            "warn" => Level::Warn,
            "error" => Level::Error,
            "fatal" => Level::Fatal,
            "panic" => Level::Panic,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Panic => "panic",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        if level == tracing::Level::TRACE {
            Level::Trace
        } else if level == tracing::Level::DEBUG {
            Level::Debug
        } else if level == tracing::Level::INFO {
            Level::Info
        } else if level == tracing::Level::WARN {
            Level::Warn
        } else {
            Level::Error
        }
    }
}
