//! MySQL account-management statement builders.

use crate::core::{quote_account, quote_literal, secret_literal, UserRecord};

/// Enumerates every account with its plugin and credential material.
pub const LIST_ACCOUNTS_SQL: &str =
    "SELECT user, host, plugin, authentication_string FROM mysql.user";

/// Parameterized existence check (`user`, `host`).
pub const ACCOUNT_EXISTS_SQL: &str =
    "SELECT COUNT(*) FROM mysql.user WHERE user = ? AND host = ?";

/// Server error raised by `CREATE USER` for an account that already exists
/// (ER_CANNOT_USER).
pub const ER_CANNOT_USER: u16 = 1396;

/// `SHOW GRANTS` does not accept placeholders, so the account is spliced in escaped.
pub fn show_grants_sql(user: &str, host: &str) -> String {
    format!("SHOW GRANTS FOR {}", quote_account(user, host))
}

/// Idempotent `CREATE USER` carrying the source's plugin and credential material.
pub fn create_user_sql(record: &UserRecord) -> String {
    let mut sql = format!(
        "CREATE USER IF NOT EXISTS {}",
        quote_account(&record.user, &record.host)
    );
    if record.auth_secret.is_empty() {
        return sql;
    }
    if record.auth_plugin.is_empty() {
        sql.push_str(" IDENTIFIED BY PASSWORD ");
    } else {
        sql.push_str(" IDENTIFIED WITH ");
        sql.push_str(&quote_literal(&record.auth_plugin));
        sql.push_str(" AS ");
    }
    sql.push_str(&secret_literal(&record.auth_secret));
    sql
}

/// Idempotent `DROP USER`.
pub fn drop_user_sql(user: &str, host: &str) -> String {
    format!("DROP USER IF EXISTS {}", quote_account(user, host))
}
