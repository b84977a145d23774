//! TOML configuration for detector parameters and logging.
//!
//! Every section is optional; missing keys fall back to compiled-in
//! defaults. Lookup order for the file itself is an explicit path, the
//! `LOGSPIKE_CONFIG` environment variable, `./logspike.toml`, and finally
//! the defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::DEFAULT_FILTER_QUANTILE;
use crate::detect::DEFAULT_Z_THRESHOLD;
use crate::DetectorSettings;

pub const CONFIG_ENV_VAR: &str = "LOGSPIKE_CONFIG";
pub const LOCAL_CONFIG_FILE: &str = "logspike.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogspikeConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LogspikeConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Resolve configuration. An explicit `path` must load; the env var and
    /// local file are best-effort and fall through to the next candidate.
    ///
    /// Nothing is logged here because this runs before the subscriber is
    /// installed. Call [`ResolvedConfig::log_outcome`] once tracing is up.
    pub fn resolve(path: Option<&Path>) -> Result<ResolvedConfig> {
        Self::resolve_from(
            path,
            std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
            Path::new(LOCAL_CONFIG_FILE),
        )
    }

    fn resolve_from(
        path: Option<&Path>,
        env_path: Option<PathBuf>,
        local: &Path,
    ) -> Result<ResolvedConfig> {
        if let Some(path) = path {
            return Ok(ResolvedConfig {
                config: Self::load(path)?,
                origin: ConfigOrigin::Explicit(path.to_path_buf()),
                fallbacks: Vec::new(),
            });
        }

        let mut fallbacks = Vec::new();

        if let Some(env_path) = env_path {
            match Self::load(&env_path) {
                Ok(config) => {
                    return Ok(ResolvedConfig {
                        config,
                        origin: ConfigOrigin::EnvVar(env_path),
                        fallbacks,
                    })
                }
                Err(e) => fallbacks.push(ConfigFallback {
                    origin: ConfigOrigin::EnvVar(env_path),
                    error: format!("{e:#}"),
                }),
            }
        }

        if local.exists() {
            match Self::load(local) {
                Ok(config) => {
                    return Ok(ResolvedConfig {
                        config,
                        origin: ConfigOrigin::LocalFile(local.to_path_buf()),
                        fallbacks,
                    })
                }
                Err(e) => fallbacks.push(ConfigFallback {
                    origin: ConfigOrigin::LocalFile(local.to_path_buf()),
                    error: format!("{e:#}"),
                }),
            }
        }

        Ok(ResolvedConfig {
            config: Self::default(),
            origin: ConfigOrigin::Defaults,
            fallbacks,
        })
    }
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Explicit(PathBuf),
    EnvVar(PathBuf),
    LocalFile(PathBuf),
    Defaults,
}

/// A best-effort candidate that existed but failed to load.
#[derive(Debug, Clone)]
pub struct ConfigFallback {
    pub origin: ConfigOrigin,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: LogspikeConfig,
    pub origin: ConfigOrigin,
    pub fallbacks: Vec<ConfigFallback>,
}

impl ResolvedConfig {
    /// Report how the configuration was resolved, including every candidate
    /// that was skipped.
    pub fn log_outcome(&self) {
        for fallback in &self.fallbacks {
            match &fallback.origin {
                ConfigOrigin::EnvVar(path) => warn!(
                    path = %path.display(),
                    error = %fallback.error,
                    "LOGSPIKE_CONFIG set but file could not be loaded, trying fallback"
                ),
                ConfigOrigin::LocalFile(path) => warn!(
                    path = %path.display(),
                    error = %fallback.error,
                    "local config file exists but could not be loaded, using defaults"
                ),
                ConfigOrigin::Explicit(_) | ConfigOrigin::Defaults => {}
            }
        }

        match &self.origin {
            ConfigOrigin::Explicit(path)
            | ConfigOrigin::EnvVar(path)
            | ConfigOrigin::LocalFile(path) => {
                info!(path = %path.display(), "loaded configuration")
            }
            ConfigOrigin::Defaults => debug!("no config file loaded, using compiled-in defaults"),
        }
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// A second is anomalous when its z-score is strictly above this.
    pub z_threshold: f64,
    /// Quantile of first-pass residuals at which points leave the baseline fit.
    pub filter_quantile: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            z_threshold: DEFAULT_Z_THRESHOLD,
            filter_quantile: DEFAULT_FILTER_QUANTILE,
        }
    }
}

impl From<&DetectorConfig> for DetectorSettings {
    fn from(cfg: &DetectorConfig) -> Self {
        Self {
            z_threshold: cfg.z_threshold,
            filter_quantile: cfg.filter_quantile,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Emit JSON lines instead of human-readable log output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
