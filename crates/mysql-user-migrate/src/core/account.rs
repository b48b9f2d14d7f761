//! Account records loaded from the source and the policy applied to them.

use std::fmt;

/// A source account with its credential material and grants.
///
/// Loaded once from the source and then shared read-only by every target worker.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user: String,
    pub host: String,
    /// Authentication plugin name (may be empty on old servers).
    pub auth_plugin: String,
    /// Opaque credential material, copied verbatim.
    pub auth_secret: Vec<u8>,
    /// Grant statements in the order the source reported them.
    pub grants: Vec<String>,
}

impl UserRecord {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            auth_plugin: String::new(),
            auth_secret: Vec::new(),
            grants: Vec::new(),
        }
    }

    /// `user@host`, unquoted, for logs and error messages.
    pub fn identity(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

// Hand-written so credential material never reaches logs.
impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("user", &self.user)
            .field("host", &self.host)
            .field("auth_plugin", &self.auth_plugin)
            .field("auth_secret", &"[REDACTED]")
            .field("grants", &self.grants)
            .finish()
    }
}

/// How a target account is reconciled toward its source record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Report what would happen without touching the target.
    pub dry_run: bool,
    /// Drop an existing target account before recreating it, clearing grants
    /// the source no longer has.
    pub drop_missing: bool,
    /// Drop and recreate existing accounts.
    pub force_overwrite: bool,
}

impl ReconcilePolicy {
    /// True when an existing target account must be dropped first.
    pub fn replaces_existing(&self) -> bool {
        self.drop_missing || self.force_overwrite
    }
}
