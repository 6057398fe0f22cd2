//! # warden-config
//!
//! Layered configuration loading for Warden using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`WARDEN_*` prefix, `__` as separator)
//! 2. `NVIDIA_API_KEY`, mapped onto `model.api_key`
//! 3. Project-level `.warden/config.toml`
//! 4. User-level `~/.config/warden/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `WARDEN_MODEL__API_KEY` -> `model.api_key`,
//! `WARDEN_DATABASE__PATH` -> `database.path`, etc. The `__` (double
//! underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use warden_config::WardenConfig;
//!
//! let config = WardenConfig::load_with_dotenv().expect("config");
//!
//! if config.model.is_configured() {
//!     println!("Model: {}", config.model.model);
//! }
//! ```

mod analysis;
mod database;
mod error;
mod model;
mod validation;

pub use analysis::AnalysisConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use model::ModelConfig;
pub use validation::ValidationConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Provider-specific key accepted as a fallback for `model.api_key`.
const NVIDIA_API_KEY: &str = "NVIDIA_API_KEY";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl WardenConfig {
    /// Extract and validate the layered configuration. Leaves the process
    /// environment untouched.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.model.validate()?;
        Ok(config)
    }

    /// Load `.env` into the process environment, then [`Self::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed or a value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_project_dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".warden/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Provider key fallback
        figment = figment.merge(
            Env::raw()
                .only(&[NVIDIA_API_KEY])
                .map(|_| "model.api_key".into()),
        );

        // Layer 4: Environment variables (highest priority)
        figment.merge(Env::prefixed("WARDEN_").split("__"))
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("warden").join("config.toml"))
    }

    /// Load the first `.env` found in the current directory or one of its
    /// ancestors, stopping at the directory that holds `.warden/`.
    fn load_project_dotenv() {
        let Ok(mut dir) = std::env::current_dir() else {
            return;
        };
        loop {
            let env_path = dir.join(".env");
            if env_path.is_file() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            if dir.join(".warden").is_dir() || !dir.pop() {
                return;
            }
        }
    }
}
