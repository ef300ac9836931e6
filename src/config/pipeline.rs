//! Loader, reference pool and pipeline configuration structures.

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "ASSET_PIPELINE_";

/// Resource loader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Number of load agents to create.
    pub agent_count: usize,
    /// Maximum waiting tasks before rejection.
    pub max_waiting_tasks: usize,
    /// Priority used when a request does not give one.
    pub default_priority: i32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            agent_count: num_cpus::get().clamp(1, 4),
            max_waiting_tasks: 1024,
            default_priority: 0,
        }
    }
}

impl LoaderConfig {
    /// Validate loader configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.agent_count == 0 {
            return Err("agent_count must be greater than 0".into());
        }
        if self.max_waiting_tasks == 0 {
            return Err("max_waiting_tasks must be greater than 0".into());
        }
        Ok(())
    }
}

/// Reference pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencePoolConfig {
    /// Track checked-out instances and reject double or foreign releases.
    pub strict_check: bool,
}

impl Default for ReferencePoolConfig {
    fn default() -> Self {
        Self { strict_check: true }
    }
}

/// Root pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Loader settings.
    pub loader: LoaderConfig,
    /// Reference pool settings.
    pub reference_pool: ReferencePoolConfig,
}

impl PipelineConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.loader
            .validate()
            .map_err(|e| format!("loader invalid: {e}"))
    }

    /// Parse pipeline configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by `ASSET_PIPELINE_*` variables, after loading `.env`.
    pub fn from_env() -> Result<Self, String> {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();
        cfg.apply_env(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// I/O failure, malformed JSON or invalid values, with the path as context.
    pub fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config {}", path.display()))?;
        Self::from_json_str(&raw)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("loading pipeline config {}", path.display()))
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        if let Some(value) = get("AGENT_COUNT") {
            self.loader.agent_count = parse_var("AGENT_COUNT", &value)?;
        }
        if let Some(value) = get("MAX_WAITING_TASKS") {
            self.loader.max_waiting_tasks = parse_var("MAX_WAITING_TASKS", &value)?;
        }
        if let Some(value) = get("DEFAULT_PRIORITY") {
            self.loader.default_priority = parse_var("DEFAULT_PRIORITY", &value)?;
        }
        if let Some(value) = get("STRICT_CHECK") {
            self.reference_pool.strict_check = parse_var("STRICT_CHECK", &value)?;
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{ENV_PREFIX}{name}={value:?}: {e}"))
}
