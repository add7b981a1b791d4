use std::fmt;

/// A configuration failure. Every variant here is fatal per the error
/// taxonomy: a binary that can't load its configuration has no safe
/// degraded mode and should log and exit rather than run half-configured.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable was absent.
    Missing(String),
    /// An environment variable was present but didn't parse.
    Invalid { var: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "config: required environment variable {var} is not set"),
            ConfigError::Invalid { var, reason } => write!(f, "config: environment variable {var} is invalid: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}
