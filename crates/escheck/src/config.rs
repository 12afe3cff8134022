//! Configuration schema for escheck
//!
//! Config lives at `config.yml` in the working directory unless `-c` is given.

use eyre::{Result, WrapErr};
use facet::Facet;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashMap;

/// Root configuration for escheck
#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    /// Rule name to enabled flag. Rules missing from the map do not run.
    #[facet(default)]
    pub rules: HashMap<String, bool>,

    /// Glob patterns (relative to the content root) of pages to skip
    #[facet(default)]
    pub exclude: Vec<String>,
}

impl Config {
    /// A config with every known rule turned on.
    pub fn all_enabled() -> Self {
        Self {
            rules: crate::rules::all()
                .iter()
                .map(|rule| (rule.name().to_string(), true))
                .collect(),
            exclude: Vec::new(),
        }
    }

    pub fn is_enabled(&self, rule: &str) -> bool {
        self.rules.get(rule).copied().unwrap_or(false)
    }

    /// Compile the exclude patterns.
    pub fn exclude_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob = Glob::new(pattern)
                .wrap_err_with(|| format!("Invalid exclude pattern '{}'", pattern))?;
            builder.add(glob);
        }
        builder.build().wrap_err("Failed to compile exclude patterns")
    }
}
