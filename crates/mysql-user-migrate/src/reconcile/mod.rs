//! Per-account reconciliation against one target.

use tracing::{debug, warn};

use crate::core::{AccountTarget, ReconcilePolicy, UserRecord};
use crate::error::{MigrateError, Result};
use crate::report::{UserOutcome, UserStatus};

/// Bring one target account in line with its source record.
///
/// Failures are confined to the returned outcome. The only error propagated is
/// [`MigrateError::Cancelled`], so the caller can stop the whole target.
pub async fn reconcile_user<T>(
    target: &mut T,
    record: &UserRecord,
    policy: &ReconcilePolicy,
) -> Result<UserOutcome>
where
    T: AccountTarget + ?Sized,
{
    match apply(target, record, policy).await {
        Ok(status) => Ok(UserOutcome::new(&record.user, &record.host, status)),
        Err(MigrateError::Cancelled) => Err(MigrateError::Cancelled),
        Err(e) => {
            warn!("{}: {}", record.identity(), e);
            Ok(UserOutcome::failed(&record.user, &record.host, e.to_string()))
        }
    }
}

async fn apply<T>(
    target: &mut T,
    record: &UserRecord,
    policy: &ReconcilePolicy,
) -> Result<UserStatus>
where
    T: AccountTarget + ?Sized,
{
    let identity = record.identity();

    let mut exists = target
        .account_exists(&record.user, &record.host)
        .await
        .map_err(|e| wrap(e, "check exists"))?;

    if policy.dry_run {
        debug!(
            "{}: planned (exists={}, replace={})",
            identity,
            exists,
            policy.replaces_existing()
        );
        return Ok(UserStatus::Planned);
    }

    if exists && policy.replaces_existing() {
        debug!("{}: dropping existing account", identity);
        target
            .drop_account(&record.user, &record.host)
            .await
            .map_err(|e| wrap(e, format!("drop {}", identity)))?;
        exists = false;
    }

    if !exists {
        debug!("{}: creating account", identity);
        target
            .create_account(record)
            .await
            .map_err(|e| wrap(e, format!("create {}", identity)))?;
    }

    // Grant text can embed credential hashes, so failures name its position only.
    for (idx, grant) in record.grants.iter().enumerate() {
        target
            .apply_grant(grant)
            .await
            .map_err(|e| wrap(e, format!("grant {} #{}", identity, idx + 1)))?;
    }

    debug!("{}: applied {} grants", identity, record.grants.len());
    Ok(UserStatus::Applied)
}

/// Attach context to a failure, leaving cancellation untouched.
fn wrap(err: MigrateError, context: impl Into<String>) -> MigrateError {
    match err {
        MigrateError::Cancelled => MigrateError::Cancelled,
        other => MigrateError::query(other, context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeServer, Mutation};

    fn record(user: &str, host: &str, grants: &[&str]) -> UserRecord {
        let mut r = UserRecord::new(user, host);
        r.auth_plugin = "mysql_native_password".into();
        r.auth_secret = b"*HASH".to_vec();
        r.grants = grants.iter().map(|g| g.to_string()).collect();
        r
    }

    fn policy(dry_run: bool, drop_missing: bool, force_overwrite: bool) -> ReconcilePolicy {
        ReconcilePolicy {
            dry_run,
            drop_missing,
            force_overwrite,
        }
    }

    #[tokio::test]
    async fn test_dry_run_never_mutates() {
        let user = record("app", "%", &["GRANT SELECT ON *.* TO `app`@`%`"]);
        for exists in [false, true] {
            for (drop_missing, force) in
                [(false, false), (true, false), (false, true), (true, true)]
            {
                let server = FakeServer::new();
                if exists {
                    server.seed_target_account("app", "%");
                }
                let mut session = server.session();

                let p = policy(true, drop_missing, force);
                let outcome = reconcile_user(&mut session, &user, &p).await.unwrap();

                assert_eq!(outcome.status, UserStatus::Planned);
                assert!(outcome.error.is_none());
                assert!(server.mutations().is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_creates_missing_account_and_grants_in_order() {
        let server = FakeServer::new();
        let mut session = server.session();
        let user = record(
            "app",
            "%",
            &["GRANT USAGE ON *.* TO `app`@`%`", "GRANT SELECT ON `db`.* TO `app`@`%`"],
        );

        let outcome = reconcile_user(&mut session, &user, &policy(false, false, false))
            .await
            .unwrap();

        assert_eq!(outcome.status, UserStatus::Applied);
        assert_eq!(
            server.mutations(),
            vec![
                Mutation::Create("app@%".into()),
                Mutation::Grant("GRANT USAGE ON *.* TO `app`@`%`".into()),
                Mutation::Grant("GRANT SELECT ON `db`.* TO `app`@`%`".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_existing_account_kept_without_overwrite() {
        let server = FakeServer::new();
        server.seed_target_account("app", "%");
        let mut session = server.session();
        let user = record("app", "%", &["GRANT USAGE ON *.* TO `app`@`%`"]);

        let outcome = reconcile_user(&mut session, &user, &policy(false, false, false))
            .await
            .unwrap();

        assert_eq!(outcome.status, UserStatus::Applied);
        assert_eq!(
            server.mutations(),
            vec![Mutation::Grant("GRANT USAGE ON *.* TO `app`@`%`".into())]
        );
    }

    #[tokio::test]
    async fn test_force_overwrite_drops_then_creates() {
        for (drop_missing, force) in [(true, false), (false, true)] {
            let server = FakeServer::new();
            server.seed_target_account("app", "%");
            let mut session = server.session();
            let user = record("app", "%", &[]);

            let p = policy(false, drop_missing, force);
            let outcome = reconcile_user(&mut session, &user, &p).await.unwrap();

            assert_eq!(outcome.status, UserStatus::Applied);
            assert_eq!(
                server.mutations(),
                vec![Mutation::Drop("app@%".into()), Mutation::Create("app@%".into())]
            );
        }
    }

    #[tokio::test]
    async fn test_reconcile_twice_is_idempotent() {
        let server = FakeServer::new();
        let mut session = server.session();
        let user = record("app", "%", &["GRANT SELECT ON `db`.* TO `app`@`%`"]);
        let p = policy(false, false, false);

        let first = reconcile_user(&mut session, &user, &p).await.unwrap();
        let second = reconcile_user(&mut session, &user, &p).await.unwrap();

        assert_eq!(first.status, UserStatus::Applied);
        assert_eq!(second.status, UserStatus::Applied);
        assert!(server.target_has_account("app", "%"));
    }

    #[tokio::test]
    async fn test_grant_failure_stops_remaining_grants() {
        let server = FakeServer::new().failing_grant("GRANT SUPER ON *.* TO `app`@`%`");
        let mut session = server.session();
        let user = record(
            "app",
            "%",
            &[
                "GRANT USAGE ON *.* TO `app`@`%`",
                "GRANT SUPER ON *.* TO `app`@`%`",
                "GRANT SELECT ON `db`.* TO `app`@`%`",
            ],
        );

        let outcome = reconcile_user(&mut session, &user, &policy(false, false, false))
            .await
            .unwrap();

        assert_eq!(outcome.status, UserStatus::Error);
        let error = outcome.error.unwrap();
        assert!(error.contains("grant app@% #2"), "{}", error);
        assert!(!error.contains("GRANT SUPER"), "{}", error);
        assert_eq!(
            server.mutations(),
            vec![
                Mutation::Create("app@%".into()),
                Mutation::Grant("GRANT USAGE ON *.* TO `app`@`%`".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_grant_error_omits_credential_text() {
        let grant = "GRANT USAGE ON *.* TO 'app'@'%' IDENTIFIED BY PASSWORD '*0123SECRETHASH'";
        let server = FakeServer::new().failing_grant(grant);
        let mut session = server.session();
        let user = record("app", "%", &[grant]);

        let outcome = reconcile_user(&mut session, &user, &policy(false, false, false))
            .await
            .unwrap();

        let error = outcome.error.unwrap();
        assert!(error.starts_with("grant app@% #1"), "{}", error);
        assert!(!error.contains("SECRETHASH"), "{}", error);
        assert!(!error.contains("IDENTIFIED"), "{}", error);
    }

    #[tokio::test]
    async fn test_exists_failure_is_user_error() {
        let server = FakeServer::new().failing_exists("app@%");
        let mut session = server.session();
        let user = record("app", "%", &["GRANT USAGE ON *.* TO `app`@`%`"]);

        let outcome = reconcile_user(&mut session, &user, &policy(false, false, false))
            .await
            .unwrap();

        assert_eq!(outcome.status, UserStatus::Error);
        assert!(outcome.error.unwrap().starts_with("check exists"));
        assert!(server.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_skips_grants() {
        let server = FakeServer::new().failing_create("app@%");
        let mut session = server.session();
        let user = record("app", "%", &["GRANT USAGE ON *.* TO `app`@`%`"]);

        let outcome = reconcile_user(&mut session, &user, &policy(false, false, false))
            .await
            .unwrap();

        assert_eq!(outcome.status, UserStatus::Error);
        assert!(outcome.error.unwrap().starts_with("create app@%"));
        assert!(server.mutations().is_empty());
        assert!(!server.target_has_account("app", "%"));
    }

    #[tokio::test]
    async fn test_drop_failure_keeps_existing_account() {
        let server = FakeServer::new().failing_drop("app@%");
        server.seed_target_account("app", "%");
        let mut session = server.session();
        let user = record("app", "%", &["GRANT USAGE ON *.* TO `app`@`%`"]);

        let outcome = reconcile_user(&mut session, &user, &policy(false, false, true))
            .await
            .unwrap();

        assert_eq!(outcome.status, UserStatus::Error);
        assert!(outcome.error.unwrap().starts_with("drop app@%"));
        assert!(server.mutations().is_empty());
        assert!(server.target_has_account("app", "%"));
    }
}
