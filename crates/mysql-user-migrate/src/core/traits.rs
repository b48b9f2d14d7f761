//! Core traits for account migration.
//!
//! The engine only needs a handful of operation shapes from a server:
//!
//! - [`AccountSource`]: enumerate accounts and read each account's grants
//! - [`AccountTarget`]: existence check, idempotent create/drop, statement execution
//! - [`Connector`]: open a health-checked session from a DSN
//!
//! Any server exposing these shapes can take part in a migration; the MySQL
//! implementation lives in `drivers::mysql`.

use std::time::Duration;

use async_trait::async_trait;

use super::account::UserRecord;
use crate::error::Result;

/// One row of the source account enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRow {
    pub user: String,
    pub host: String,
    pub auth_plugin: String,
    pub auth_secret: Vec<u8>,
}

/// Read accounts and grants from a source server.
#[async_trait]
pub trait AccountSource: Send {
    /// List every account known to the server.
    async fn list_accounts(&mut self) -> Result<Vec<AccountRow>>;

    /// Grant statements for one account, in the server's reporting order.
    async fn show_grants(&mut self, user: &str, host: &str) -> Result<Vec<String>>;
}

/// Apply account state to a target server.
#[async_trait]
pub trait AccountTarget: Send {
    /// Check whether `user@host` exists.
    async fn account_exists(&mut self, user: &str, host: &str) -> Result<bool>;

    /// Create the account with the record's plugin and credential material.
    ///
    /// Must succeed when the account already exists.
    async fn create_account(&mut self, record: &UserRecord) -> Result<()>;

    /// Drop the account. Must succeed when the account is already absent.
    async fn drop_account(&mut self, user: &str, host: &str) -> Result<()>;

    /// Execute an opaque privilege statement.
    async fn apply_grant(&mut self, statement: &str) -> Result<()>;
}

/// Opens sessions to source and target servers.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Session: AccountSource + AccountTarget + Send + 'static;

    /// Connect and health-check within `timeout`.
    async fn connect(&self, dsn: &str, timeout: Duration) -> Result<Self::Session>;

    /// Close a session, releasing its connection.
    async fn disconnect(&self, session: Self::Session);
}
