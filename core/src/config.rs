//! Runtime configuration read from the environment.
//!
//! Every key has a default; a blank value counts as unset.

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::info;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_LIST_RETRIES: &str = "1";
pub const DEFAULT_SESSION_FILE: &str = ".todo-session.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub list_retries: u32,
    pub session_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `load` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_url: try_load(&lookup, "TODO_API_URL", DEFAULT_API_URL)?,
            list_retries: try_load(&lookup, "TODO_LIST_RETRIES", DEFAULT_LIST_RETRIES)?,
            session_file: try_load(&lookup, "TODO_SESSION_FILE", DEFAULT_SESSION_FILE)?,
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let value = lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        });

    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.clone(),
        reason: e.to_string(),
    })
}
