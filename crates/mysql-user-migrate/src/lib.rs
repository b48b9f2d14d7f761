//! # mysql-user-migrate
//!
//! Copies MySQL user accounts and their privileges from one source server to
//! one or more target servers.
//!
//! - **Filtered inventory** using `user@host` include/exclude globs
//! - **Idempotent reconciliation** with dry-run, keep-existing and overwrite policies
//! - **Parallel targets** bounded by a configurable concurrency limit
//! - **Failure isolation** per user and per target, aggregated into a [`Report`]
//! - **Credential redaction** of every DSN that reaches logs or reports
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql_user_migrate::{Config, Orchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::load("config.yaml")?;
//!     config.validate()?;
//!     let report = Orchestrator::new(config).run(CancellationToken::new()).await?;
//!     print!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod inventory;
pub mod orchestrator;
pub mod reconcile;
pub mod report;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use crate::config::{Config, ConfigOverrides, TargetConfig};
pub use crate::core::{
    matches_identity, redact_dsn, should_include, AccountSource, AccountTarget, Connector,
    IdentityFilter, ReconcilePolicy, UserRecord,
};
pub use crate::drivers::MysqlConnector;
pub use crate::error::{MigrateError, Result};
pub use crate::inventory::load_inventory;
pub use crate::orchestrator::{run_target, EndpointHealth, HealthCheckResult, Orchestrator};
pub use crate::reconcile::reconcile_user;
pub use crate::report::{Report, TargetOutcome, UserOutcome, UserStatus};
