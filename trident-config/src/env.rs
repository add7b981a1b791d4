//! Small `envconfig`-style helpers: a required variable's absence is
//! fatal, an optional one falls back to a default, never to a silent
//! empty string.

use std::str::FromStr;

use crate::error::ConfigError;

pub fn require(var: &str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::Missing(var.to_string()))
}

pub fn optional(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

pub fn require_parsed<T: FromStr>(var: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    let raw = require(var)?;
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

pub fn optional_parsed<T: FromStr>(var: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: var.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
