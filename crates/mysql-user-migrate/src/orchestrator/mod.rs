//! Migration orchestrator - main workflow coordinator.
//!
//! Connects to the source once, loads the filtered inventory, then fans target
//! workers out under a semaphore so at most `concurrency` targets are connected
//! at the same time. Workers return their outcomes; only the orchestrator
//! aggregates them into the [`Report`].

mod worker;

pub use worker::run_target;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::core::{redact_dsn, Connector, IdentityFilter, ReconcilePolicy, UserRecord};
use crate::drivers::mysql::MysqlConnector;
use crate::error::{MigrateError, Result};
use crate::inventory::load_inventory;
use crate::report::{Report, TargetOutcome};
use worker::cancellable;

/// Migration orchestrator.
pub struct Orchestrator<C: Connector = MysqlConnector> {
    config: Config,
    connector: Arc<C>,
}

/// Connectivity of one endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointHealth {
    /// `source` or the target's display name.
    pub name: String,
    pub connected: bool,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of [`Orchestrator::health_check`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub endpoints: Vec<EndpointHealth>,
    pub healthy: bool,
}

impl Orchestrator<MysqlConnector> {
    /// Create an orchestrator talking to MySQL servers.
    pub fn new(config: Config) -> Self {
        Self::with_connector(config, MysqlConnector::new())
    }
}

impl<C: Connector> Orchestrator<C> {
    /// Create an orchestrator with a custom connector.
    pub fn with_connector(config: Config, connector: C) -> Self {
        Self {
            config,
            connector: Arc::new(connector),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn policy(&self) -> ReconcilePolicy {
        ReconcilePolicy {
            dry_run: self.config.dry_run,
            drop_missing: self.config.drop_missing,
            force_overwrite: self.config.force_overwrite,
        }
    }

    /// Run the migration.
    ///
    /// Fails only when the source cannot be reached, the inventory cannot be
    /// loaded (or is empty), or `cancel` fires before targets are dispatched.
    /// Target and user failures are reported in the returned [`Report`].
    pub async fn run(&self, cancel: CancellationToken) -> Result<Report> {
        let started_at = Utc::now();
        let source_name = redact_dsn(&self.config.source);
        let policy = self.policy();
        let timeout = self.config.connect_timeout();

        info!("Connecting to source {}", source_name);
        let mut source = cancellable(&cancel, self.connector.connect(&self.config.source, timeout))
            .await?;

        let filter = IdentityFilter::new(self.config.include.clone(), self.config.exclude.clone());
        let loaded = cancellable(&cancel, load_inventory(&mut source, &filter)).await;
        self.connector.disconnect(source).await;
        let users: Arc<[UserRecord]> = loaded?.into();

        let concurrency = self.config.concurrency.max(1);
        info!(
            "Migrating {} accounts to {} targets (concurrency={}, dry_run={})",
            users.len(),
            self.config.targets.len(),
            concurrency,
            policy.dry_run
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut handles: Vec<(String, Option<JoinHandle<TargetOutcome>>)> = Vec::new();

        for target in &self.config.targets {
            let name = target.display_name();

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                handles.push((name, None));
                continue;
            };

            let connector = self.connector.clone();
            let users = users.clone();
            let target = target.clone();
            let cancel = cancel.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                run_target(&*connector, &target, &users, &policy, timeout, &cancel).await
            });
            handles.push((name, Some(handle)));
        }

        // Awaiting in configuration order keeps the report stable regardless of
        // which target finished first.
        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = match handle {
                Some(handle) => match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("{}: worker panicked - {}", name, e);
                        self.unstarted(name, format!("worker panicked: {}", e), users.len())
                    }
                },
                None => self.unstarted(name, MigrateError::Cancelled.to_string(), users.len()),
            };
            outcomes.push(outcome);
        }

        let report = Report::assemble(source_name, policy.dry_run, started_at, outcomes);
        info!(
            "Migration finished: {} targets, {} users, {} failed in {}ms",
            report.targets.len(),
            report.total_users,
            report.total_failed,
            report.duration_ms()
        );
        Ok(report)
    }

    fn unstarted(&self, name: String, error: String, users: usize) -> TargetOutcome {
        let mut outcome = TargetOutcome::begin(name, self.config.dry_run);
        outcome.abort(error, users);
        outcome.finish();
        outcome
    }

    /// Connect to the source and every target and report latency.
    pub async fn health_check(&self) -> HealthCheckResult {
        let timeout = self.config.connect_timeout();
        let mut endpoints = Vec::with_capacity(self.config.targets.len() + 1);

        let probes = std::iter::once(("source".to_string(), self.config.source.as_str())).chain(
            self.config
                .targets
                .iter()
                .map(|t| (t.display_name(), t.dsn.as_str())),
        );

        for (name, dsn) in probes {
            let start = Instant::now();
            let result = self.connector.connect(dsn, timeout).await;
            let latency_ms = start.elapsed().as_millis() as u64;
            let error = match result {
                Ok(session) => {
                    self.connector.disconnect(session).await;
                    None
                }
                Err(e) => Some(e.to_string()),
            };
            endpoints.push(EndpointHealth {
                name,
                connected: error.is_none(),
                latency_ms,
                error,
            });
        }

        let healthy = endpoints.iter().all(|e| e.connected);
        HealthCheckResult { endpoints, healthy }
    }
}
