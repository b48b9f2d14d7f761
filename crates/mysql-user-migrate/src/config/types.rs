//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::redact_dsn;

/// Root configuration structure, as loaded from YAML/JSON and merged with CLI flags.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source server DSN.
    #[serde(default)]
    pub source: String,

    /// Target servers.
    #[serde(default)]
    pub targets: Vec<TargetConfig>,

    /// Identity patterns to include (`user` or `user@host`, `%`/`*` wildcards).
    #[serde(default)]
    pub include: Vec<String>,

    /// Identity patterns to exclude. Exclusion always wins.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Plan only; never modify targets.
    #[serde(default)]
    pub dry_run: bool,

    /// Drop existing target accounts before recreating them.
    #[serde(default)]
    pub drop_missing: bool,

    /// Force drop/recreate of existing target accounts.
    #[serde(default)]
    pub force_overwrite: bool,

    /// Where to write the JSON report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,

    /// Number of targets migrated at the same time (0 is treated as 1).
    #[serde(default)]
    pub concurrency: usize,

    /// Verbose logging.
    #[serde(default)]
    pub verbose: bool,

    /// Connect + ping deadline per server, in seconds (default: 5).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: String::new(),
            targets: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            dry_run: false,
            drop_missing: false,
            force_overwrite: false,
            report_path: None,
            concurrency: 1,
            verbose: false,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Config {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("source", &redact_dsn(&self.source))
            .field("targets", &self.targets)
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("dry_run", &self.dry_run)
            .field("drop_missing", &self.drop_missing)
            .field("force_overwrite", &self.force_overwrite)
            .field("report_path", &self.report_path)
            .field("concurrency", &self.concurrency)
            .field("verbose", &self.verbose)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// A destination server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Name used in logs and the report.
    #[serde(default)]
    pub name: String,

    /// Connection string.
    pub dsn: String,
}

impl TargetConfig {
    pub fn new(name: impl Into<String>, dsn: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dsn: dsn.into(),
        }
    }

    /// Configured name, or the redacted DSN when no name was given.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            redact_dsn(&self.dsn)
        } else {
            self.name.clone()
        }
    }

    /// Parse a CLI `--target` value: `name=dsn` or a bare DSN named `target-<n>`.
    ///
    /// The `name=` prefix is only recognized when it contains none of `:/@?`,
    /// so DSNs carrying `key=value` options are kept whole.
    pub fn parse_cli(raw: &str, position: usize) -> Self {
        if let Some((name, dsn)) = raw.split_once('=') {
            let name = name.trim();
            if !name.is_empty() && !name.contains(|c: char| matches!(c, ':' | '/' | '@' | '?')) {
                return Self::new(name, dsn.trim());
            }
        }
        Self::new(format!("target-{}", position), raw.trim())
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("name", &self.name)
            .field("dsn", &redact_dsn(&self.dsn))
            .finish()
    }
}

/// Values supplied on the command line. Unset values leave the file config alone.
#[derive(Clone, Default)]
pub struct ConfigOverrides {
    pub source: Option<String>,
    pub targets: Vec<TargetConfig>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub dry_run: Option<bool>,
    pub drop_missing: Option<bool>,
    pub force_overwrite: Option<bool>,
    pub report_path: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub verbose: Option<bool>,
    pub connect_timeout_secs: Option<u64>,
}

// Default value functions for serde
fn default_connect_timeout_secs() -> u64 {
    5
}
