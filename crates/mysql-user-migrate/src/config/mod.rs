//! Configuration loading, merging and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a file. `.yaml`/`.yml` files are parsed as YAML,
    /// everything else as JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply CLI overrides; any value given on the command line wins.
    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(source) = overrides.source.filter(|s| !s.is_empty()) {
            self.source = source;
        }
        if !overrides.targets.is_empty() {
            self.targets = overrides.targets;
        }
        if !overrides.include.is_empty() {
            self.include = overrides.include;
        }
        if !overrides.exclude.is_empty() {
            self.exclude = overrides.exclude;
        }
        if let Some(v) = overrides.dry_run {
            self.dry_run = v;
        }
        if let Some(v) = overrides.drop_missing {
            self.drop_missing = v;
        }
        if let Some(v) = overrides.force_overwrite {
            self.force_overwrite = v;
        }
        if let Some(path) = overrides.report_path {
            self.report_path = Some(path);
        }
        if let Some(v) = overrides.concurrency {
            self.concurrency = v;
        }
        if let Some(v) = overrides.verbose {
            self.verbose = v;
        }
        if let Some(v) = overrides.connect_timeout_secs {
            self.connect_timeout_secs = v;
        }
        self
    }

    /// Fill an empty source/target list from the environment.
    ///
    /// `SOURCE_DSN` provides the source. Targets come from `TARGET_DSN` (a single
    /// target) or else `TARGET_DSN_LIST` (comma separated), only when none are
    /// configured.
    pub fn apply_env_defaults<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.source.is_empty() {
            if let Some(v) = env("SOURCE_DSN").filter(|v| !v.is_empty()) {
                self.source = v;
            }
        }

        if self.targets.is_empty() {
            if let Some(v) = env("TARGET_DSN").filter(|v| !v.is_empty()) {
                self.targets.push(TargetConfig::new("target-1", v));
            } else if let Some(list) = env("TARGET_DSN_LIST") {
                for (idx, raw) in list.split(',').map(str::trim).enumerate() {
                    if raw.is_empty() {
                        continue;
                    }
                    self.targets
                        .push(TargetConfig::new(env_target_name(idx, raw), raw));
                }
            }
        }

        if self.concurrency == 0 {
            self.concurrency = 1;
        }
    }

    /// Validate the configuration, normalizing concurrency to at least 1.
    pub fn validate(&mut self) -> Result<()> {
        validation::validate(self)
    }
}

/// Name a target from the text after its first `@`, or the DSN itself when it
/// carries no credentials. `target-<n>` only for an empty DSN.
fn env_target_name(idx: usize, dsn: &str) -> String {
    let name = match dsn.split_once('@') {
        Some((_, host)) if !host.is_empty() => host,
        _ => dsn,
    };
    if name.is_empty() {
        format!("target-{}", idx + 1)
    } else {
        name.to_string()
    }
}
