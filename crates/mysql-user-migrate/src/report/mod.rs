//! Migration report: per-user, per-target and run-level outcomes.

use std::fmt;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome of reconciling one account on one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Changes were applied.
    Applied,
    /// Dry run: changes would have been applied.
    Planned,
    /// Nothing was done for this account.
    Skipped,
    /// Reconciliation failed.
    Error,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Applied => "applied",
            UserStatus::Planned => "planned",
            UserStatus::Skipped => "skipped",
            UserStatus::Error => "error",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result for a single `user@host` on a single target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOutcome {
    pub user: String,
    pub host: String,
    pub status: UserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UserOutcome {
    pub fn new(user: impl Into<String>, host: impl Into<String>, status: UserStatus) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            status,
            error: None,
        }
    }

    pub fn failed(
        user: impl Into<String>,
        host: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(user, host, UserStatus::Error)
        }
    }
}

/// Summary of the run against one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub target: String,
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub users: Vec<UserOutcome>,
    /// Set when the target as a whole could not be processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: i64,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TargetOutcome {
    /// Start an empty outcome at the current time.
    pub fn begin(target: impl Into<String>, dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            target: target.into(),
            applied: 0,
            skipped: 0,
            failed: 0,
            users: Vec::new(),
            error: None,
            duration_ms: 0,
            dry_run,
            started_at: now,
            finished_at: now,
        }
    }

    /// Count a user outcome and append it.
    pub fn record(&mut self, outcome: UserOutcome) {
        match outcome.status {
            UserStatus::Applied | UserStatus::Planned => self.applied += 1,
            UserStatus::Skipped => self.skipped += 1,
            UserStatus::Error => self.failed += 1,
        }
        self.users.push(outcome);
    }

    /// Mark the whole target failed; `unattempted` users count as failures.
    pub fn abort(&mut self, error: impl Into<String>, unattempted: usize) {
        self.error = Some(error.into());
        self.failed += unattempted;
    }

    /// Stamp the finish time and derive the duration.
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
        self.duration_ms = (self.finished_at - self.started_at).num_milliseconds();
    }
}

/// Report for a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Source DSN, redacted.
    pub source: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub targets: Vec<TargetOutcome>,
    pub total_failed: usize,
    pub total_users: usize,
}

impl Report {
    /// Assemble a report from target outcomes, summing the totals.
    ///
    /// `total_users` counts reconciled user rows, so a target that never
    /// connected adds nothing to it while still adding to `total_failed`.
    pub fn assemble(
        source: String,
        dry_run: bool,
        started_at: DateTime<Utc>,
        targets: Vec<TargetOutcome>,
    ) -> Self {
        let total_failed = targets.iter().map(|t| t.failed).sum();
        let total_users = targets.iter().map(|t| t.users.len()).sum();
        Self {
            source,
            dry_run,
            started_at,
            finished_at: Utc::now(),
            targets,
            total_failed,
            total_users,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.total_failed > 0
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON form to `path`.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Render the human-readable summary.
    pub fn render<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "{}", self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Migration report (dry-run={})", self.dry_run)?;
        writeln!(f, "Source: {}", self.source)?;
        writeln!(
            f,
            "Targets: {} | Duration: {}ms",
            self.targets.len(),
            self.duration_ms()
        )?;
        for t in &self.targets {
            writeln!(
                f,
                "- {} | applied={} skipped={} failed={} | duration={}ms",
                t.target, t.applied, t.skipped, t.failed, t.duration_ms
            )?;
            if t.users.is_empty() {
                if let Some(ref err) = t.error {
                    writeln!(f, "  error: {}", err)?;
                    continue;
                }
            }
            for u in &t.users {
                match u.error {
                    Some(ref err) => {
                        writeln!(f, "  {}@{} -> {} ({})", u.user, u.host, u.status, err)?
                    }
                    None => writeln!(f, "  {}@{} -> {}", u.user, u.host, u.status)?,
                }
            }
            if !t.users.is_empty() {
                if let Some(ref err) = t.error {
                    writeln!(f, "  error: {}", err)?;
                }
            }
        }
        Ok(())
    }
}
