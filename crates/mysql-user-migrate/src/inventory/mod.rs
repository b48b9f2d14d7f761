//! Source account inventory.
//!
//! Reads every account from the source once, filters it through the identity
//! patterns, and fetches grants only for the accounts that survive the filter.

use tracing::{debug, info};

use crate::core::{AccountSource, IdentityFilter, UserRecord};
use crate::error::{MigrateError, Result};

/// Load the filtered account inventory from a source session.
///
/// Fails with [`MigrateError::NoMatchingAccounts`] when the filters leave
/// nothing, since an empty inventory almost always means a mistyped pattern.
/// Any query failure aborts the load; no partial inventory is returned.
pub async fn load_inventory<S>(source: &mut S, filter: &IdentityFilter) -> Result<Vec<UserRecord>>
where
    S: AccountSource + ?Sized,
{
    let accounts = source.list_accounts().await?;
    debug!("Source reports {} accounts", accounts.len());

    let mut users = Vec::new();
    for account in accounts {
        if !filter.admits(&account.user, &account.host) {
            debug!("Skipping {}@{} (filtered)", account.user, account.host);
            continue;
        }

        let grants = source
            .show_grants(&account.user, &account.host)
            .await
            .map_err(|e| match e {
                MigrateError::Cancelled => MigrateError::Cancelled,
                other => MigrateError::inventory(
                    format!("{}@{}", account.user, account.host),
                    other,
                ),
            })?;

        users.push(UserRecord {
            user: account.user,
            host: account.host,
            auth_plugin: account.auth_plugin,
            auth_secret: account.auth_secret,
            grants,
        });
    }

    if users.is_empty() {
        return Err(MigrateError::NoMatchingAccounts);
    }

    info!("Loaded {} accounts from source", users.len());
    Ok(users)
}
