//! Explorer configuration
//!
//! Loaded from a TOML file, then overridden by `CROPCAST_*` environment
//! variables. Relative paths in a file resolve against the file's directory
//! first and the working directory second.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{CoreError, Result};
use crate::features::EmptyHistory;
use crate::validation::DEFAULT_HORIZON_YEARS;

pub const ENV_DATA_PATH: &str = "CROPCAST_DATA_PATH";
pub const ENV_MODEL_PATH: &str = "CROPCAST_MODEL_PATH";
pub const ENV_MODEL_HASH: &str = "CROPCAST_MODEL_HASH";
pub const ENV_HORIZON_YEARS: &str = "CROPCAST_HORIZON_YEARS";
pub const ENV_EMPTY_HISTORY: &str = "CROPCAST_EMPTY_HISTORY";
pub const ENV_LOG_LEVEL: &str = "CROPCAST_LOG_LEVEL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub prediction: PredictionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Cleaned yield CSV
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Canonical JSON GBDT artifact
    pub path: PathBuf,
    /// BLAKE3 hex of the artifact; verified at load when set
    pub expected_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// How many years past the last observation may be predicted
    pub horizon_years: i32,
    pub empty_history: EmptyHistory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/crop_yield_cleaned.csv"),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/yield_gbdt.json"),
            expected_hash: None,
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            horizon_years: DEFAULT_HORIZON_YEARS,
            empty_history: EmptyHistory::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ExplorerConfig {
    /// Defaults, then the optional file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| {
            CoreError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;

        config.data.path = resolve_path(path, &config.data.path);
        config.model.path = resolve_path(path, &config.model.path);
        Ok(config)
    }

    /// Apply `CROPCAST_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_DATA_PATH) {
            self.data.path = PathBuf::from(val);
        }
        if let Some(val) = lookup(ENV_MODEL_PATH) {
            self.model.path = PathBuf::from(val);
        }
        if let Some(val) = lookup(ENV_MODEL_HASH) {
            let val = val.trim().to_string();
            self.model.expected_hash = (!val.is_empty()).then_some(val);
        }
        if let Some(val) = lookup(ENV_HORIZON_YEARS) {
            self.prediction.horizon_years = val.trim().parse().map_err(|_| {
                CoreError::Config(format!("{ENV_HORIZON_YEARS} must be an integer, got {val:?}"))
            })?;
        }
        if let Some(val) = lookup(ENV_EMPTY_HISTORY) {
            self.prediction.empty_history = val.parse().map_err(CoreError::Config)?;
        }
        if let Some(val) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = val;
        }
        debug!(config = ?self, "Configuration after overrides");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.prediction.horizon_years < 1 {
            return Err(CoreError::Config(format!(
                "prediction.horizon_years must be at least 1, got {}",
                self.prediction.horizon_years
            )));
        }
        if let Some(hash) = &self.model.expected_hash {
            if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(CoreError::Config(format!(
                    "model.expected_hash must be 64 hex characters, got {hash:?}"
                )));
            }
        }
        Ok(())
    }
}

fn resolve_path(config_path: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        return target.to_path_buf();
    }

    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let candidate = base.join(target);
    if candidate.exists() {
        return candidate;
    }

    let cwd_candidate = env::current_dir()
        .map(|cwd| cwd.join(target))
        .unwrap_or_else(|_| target.to_path_buf());
    if cwd_candidate.exists() {
        return cwd_candidate;
    }

    target.to_path_buf()
}
