//! Target worker: reconciles the whole inventory against one target.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::TargetConfig;
use crate::core::{Connector, ReconcilePolicy, UserRecord};
use crate::error::{MigrateError, Result};
use crate::reconcile::reconcile_user;
use crate::report::TargetOutcome;

/// Race a network operation against cancellation.
pub(crate) async fn cancellable<F, T>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(MigrateError::Cancelled),
        res = fut => res,
    }
}

/// Reconcile every user against one target, strictly in inventory order.
///
/// Never fails: a connection failure or cancellation is recorded on the
/// returned outcome and every user that was not reconciled counts as failed.
pub async fn run_target<C: Connector>(
    connector: &C,
    target: &TargetConfig,
    users: &[UserRecord],
    policy: &ReconcilePolicy,
    connect_timeout: Duration,
    cancel: &CancellationToken,
) -> TargetOutcome {
    let mut outcome = TargetOutcome::begin(target.display_name(), policy.dry_run);

    let connected = cancellable(cancel, connector.connect(&target.dsn, connect_timeout)).await;
    let mut session = match connected {
        Ok(session) => session,
        Err(e) => {
            warn!("{}: {}", outcome.target, e);
            let message = match e {
                MigrateError::Cancelled => e.to_string(),
                other => format!("connect target: {}", other),
            };
            outcome.abort(message, users.len());
            outcome.finish();
            return outcome;
        }
    };

    info!("{}: reconciling {} accounts", outcome.target, users.len());
    for (idx, user) in users.iter().enumerate() {
        match cancellable(cancel, reconcile_user(&mut session, user, policy)).await {
            Ok(user_outcome) => outcome.record(user_outcome),
            Err(e) => {
                warn!("{}: stopped at {}: {}", outcome.target, user.identity(), e);
                outcome.abort(e.to_string(), users.len() - idx);
                break;
            }
        }
    }

    connector.disconnect(session).await;
    outcome.finish();

    info!(
        "{}: applied={} skipped={} failed={} in {}ms",
        outcome.target, outcome.applied, outcome.skipped, outcome.failed, outcome.duration_ms
    );
    outcome
}
