//! Core abstractions for account migration.
//!
//! - [`account`]: account records and reconciliation policy
//! - [`identity`]: `user@host` glob matching for include/exclude filters
//! - [`dsn`]: password redaction for connection strings
//! - [`identifier`]: literal escaping for account-management statements
//! - [`traits`]: the source/target/connector seams implemented by drivers
//!
//! Nothing here talks to a server directly; drivers implement the traits and the
//! engine modules (`inventory`, `reconcile`, `orchestrator`) consume them, which
//! lets the engine be exercised against in-memory fakes.

pub mod account;
pub mod dsn;
pub mod identifier;
pub mod identity;
pub mod traits;

pub use account::{ReconcilePolicy, UserRecord};
pub use dsn::{redact_dsn, MASK};
pub use identifier::{escape_literal, quote_account, quote_literal, secret_literal};
pub use identity::{matches_identity, should_include, IdentityFilter};
pub use traits::{AccountRow, AccountSource, AccountTarget, Connector};
