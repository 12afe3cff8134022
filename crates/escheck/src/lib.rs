//! escheck library - Check JavaScript reference documentation against the
//! ECMAScript specification
//!
//! This library exposes the checker for testing and embedding: load a
//! [`context::RunContext`] over a content checkout and a catalog, then
//! [`rules::run`] the enabled rules and render the [`output::Reports`].

pub mod adjust;
pub mod config;
pub mod context;
pub mod front_matter;
pub mod names;
pub mod output;
pub mod page;
pub mod rules;

use config::Config;
use eyre::{Result, WrapErr};
use std::path::Path;

/// Load the YAML config file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        eyre::bail!(
            "Config file not found at {}\n\n\
             Create a config file listing the rules to run:\n\n\
             rules:\n  \
                 heading: true\n  \
                 class-members: true\n  \
                 syntax-section: true\n\
             exclude:\n  \
                 - \"**/intl/**\"",
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = facet_yaml::from_str(&content)
        .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
