//! Project configuration loaded from `strand.toml`.
//!
//! A strand project ties together a design (the parser collaborator's
//! JSON output), a top module, and build settings:
//!
//! ```toml
//! [project]
//! name = "hack8"
//! design = "design.json"
//! top = "computer"
//!
//! [build]
//! opt_level = 4
//! out_dir = "build"
//! ```

#![warn(missing_docs)]

mod error;
mod types;

pub use error::ConfigError;
pub use types::{BuildConfig, ProjectConfig, ProjectMeta};

use std::path::Path;

/// The default configuration file name.
pub const CONFIG_FILE: &str = "strand.toml";

/// Loads and validates a configuration file.
pub fn load(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

/// Parses and validates configuration text.
pub fn parse(text: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
