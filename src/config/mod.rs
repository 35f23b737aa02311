//! Configuration loaded from the environment

pub mod app;
pub mod database;
pub mod mail;
pub mod storage;

pub use app::*;
pub use database::*;
pub use mail::*;
pub use storage::*;

use std::env;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("{0} must be set in production")]
    MissingInProduction(&'static str),
}

/// Read `key` from the environment, falling back to `default` when unset.
/// A value that is set but does not parse is an error rather than silently defaulted.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

pub(crate) fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
