//! Configuration loading and the store factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use curricle_core::engine::EngineConfig;
use curricle_core::progress::RolePolicies;
use curricle_core::traits::CourseStore;

use crate::memory::MemoryStore;
use crate::rest::RestStore;

/// Configuration for the backing store.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Memory,
    Rest {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Memory => f.debug_struct("Memory").finish(),
            StoreConfig::Rest {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Rest")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory
    }
}

/// Top-level curricle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurricleConfig {
    /// Backing store.
    #[serde(default)]
    pub store: StoreConfig,
    /// Pass threshold for exams that do not set their own.
    #[serde(default = "default_passing_threshold")]
    pub default_passing_threshold: f64,
    /// Per-role curriculum entry positions.
    #[serde(default)]
    pub roles: RolePolicies,
    /// Max concurrent per-learner reads during roster assembly.
    #[serde(default = "default_parallelism")]
    pub roster_parallelism: usize,
    /// Curriculum TOML path.
    #[serde(default = "default_curriculum_path")]
    pub curriculum: PathBuf,
    /// Exam bank TOML path.
    #[serde(default = "default_exam_bank_path")]
    pub exam_bank: PathBuf,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_passing_threshold() -> f64 {
    50.0
}
fn default_parallelism() -> usize {
    8
}
fn default_curriculum_path() -> PathBuf {
    PathBuf::from("curriculum.toml")
}
fn default_exam_bank_path() -> PathBuf {
    PathBuf::from("exams.toml")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./curricle-out")
}

impl Default for CurricleConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            default_passing_threshold: default_passing_threshold(),
            roles: RolePolicies::default(),
            roster_parallelism: default_parallelism(),
            curriculum: default_curriculum_path(),
            exam_bank: default_exam_bank_path(),
            output_dir: default_output_dir(),
        }
    }
}

impl CurricleConfig {
    /// The engine configuration this file describes.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_passing_threshold: self.default_passing_threshold,
            role_policies: self.roles.clone(),
            roster_parallelism: self.roster_parallelism,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a store config.
fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Memory => StoreConfig::Memory,
        StoreConfig::Rest { api_key, base_url } => StoreConfig::Rest {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `curricle.toml` in the current directory
/// 2. `~/.config/curricle/config.toml`
///
/// Environment variable override: `CURRICLE_API_KEY`.
pub fn load_config() -> Result<CurricleConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<CurricleConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("curricle.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<CurricleConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => CurricleConfig::default(),
    };

    // Apply env var override
    if let Ok(key) = std::env::var("CURRICLE_API_KEY") {
        if let StoreConfig::Rest { api_key, .. } = &mut config.store {
            *api_key = key;
        }
    }

    config.store = resolve_store_config(&config.store);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("curricle"))
}

/// Create a store instance from its configuration.
pub fn create_store(config: &StoreConfig) -> Result<Box<dyn CourseStore>> {
    match config {
        StoreConfig::Memory => Ok(Box::new(MemoryStore::new())),
        StoreConfig::Rest { api_key, base_url } => {
            Ok(Box::new(RestStore::new(api_key, base_url.clone())))
        }
    }
}
