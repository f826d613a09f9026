//! Configuration types deserialized from `strand.toml`.

use crate::error::ConfigError;
use serde::Deserialize;

/// The top-level project configuration.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,
}

/// Core metadata required in every `strand.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Path to the design JSON produced by the parser front-end.
    pub design: String,
    /// The top module to elaborate.
    pub top: String,
}

/// Build settings.
#[derive(Debug, Deserialize)]
pub struct BuildConfig {
    /// Optimisation level: 0 (let the compiler pick its default policy),
    /// 2, or 4.
    #[serde(default)]
    pub opt_level: u8,
    /// Output directory for the wasm binary and signal map.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            opt_level: 0,
            out_dir: default_out_dir(),
        }
    }
}

fn default_out_dir() -> String {
    "build".to_string()
}

impl ProjectConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.build.opt_level, 0 | 2 | 4) {
            return Err(ConfigError::Validation(format!(
                "opt_level must be 0, 2, or 4, got {}",
                self.build.opt_level
            )));
        }
        if self.project.top.is_empty() {
            return Err(ConfigError::Validation(
                "project.top must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
