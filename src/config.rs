//! Run configuration.
//!
//! Loads the optional JSON config, fills defaults, and validates it before any
//! case is executed.
use crate::runner::ResumeToken;
use crate::sandbox::Sandbox;
use crate::script::DriverOverrides;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const SKIP_ENV_VAR: &str = "INLINE_ORACLE_SKIP";
const CONFIG_DIR_NAME: &str = "inline-oracle";
const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_TIMEOUT_SECONDS: f64 = 60.0;
const DEFAULT_SHELL: &str = "bash";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub schema_version: u32,
    /// Per-case wall-clock limit; `0` disables it.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_compiler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cxx_compiler: Option<String>,
    #[serde(default = "default_shell")]
    pub shell: String,
}

fn default_timeout_seconds() -> f64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            c_compiler: None,
            cxx_compiler: None,
            shell: default_shell(),
        }
    }
}

impl RunConfig {
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_seconds <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(self.timeout_seconds).ok()
    }

    pub fn drivers(&self) -> DriverOverrides {
        DriverOverrides {
            c_compiler: self.c_compiler.clone(),
            cxx_compiler: self.cxx_compiler.clone(),
        }
    }

    pub fn sandbox(&self) -> Sandbox {
        Sandbox::new(self.shell.clone(), self.timeout())
    }
}

/// Default config location under the user's config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn load_config(path: &Path) -> Result<RunConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: RunConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config).with_context(|| format!("validate config {}", path.display()))?;
    Ok(config)
}

/// An explicit path must exist; the default location is optional.
pub fn resolve_config(explicit: Option<&Path>) -> Result<RunConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            tracing::debug!(path = %path.display(), "using default config");
            load_config(&path)
        }
        _ => Ok(RunConfig::default()),
    }
}

pub fn validate_config(config: &RunConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if !config.timeout_seconds.is_finite() || config.timeout_seconds < 0.0 {
        return Err(anyhow!(
            "timeout_seconds must be a non-negative number (got {})",
            config.timeout_seconds
        ));
    }
    if config.shell.trim().is_empty() {
        return Err(anyhow!("shell must be non-empty"));
    }
    for (label, value) in [
        ("c_compiler", &config.c_compiler),
        ("cxx_compiler", &config.cxx_compiler),
    ] {
        if value.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(anyhow!("{label} must be non-empty when set"));
        }
    }
    Ok(())
}

/// `--skip` wins over the environment; an empty variable counts as unset.
pub fn resolve_resume_token(
    cli: Option<&str>,
    env_value: Option<&str>,
) -> Result<Option<ResumeToken>> {
    let (raw, source) = match (cli, env_value) {
        (Some(raw), _) => (raw, "--skip"),
        (None, Some(raw)) if !raw.trim().is_empty() => (raw, SKIP_ENV_VAR),
        _ => return Ok(None),
    };
    let token = raw
        .trim()
        .parse::<ResumeToken>()
        .with_context(|| format!("parse resume token from {source}"))?;
    Ok(Some(token))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
