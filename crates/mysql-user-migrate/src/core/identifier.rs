//! Literal escaping for account-management statements.
//!
//! MySQL does not accept placeholders in `CREATE USER`, `DROP USER` or
//! `SHOW GRANTS`, so account names and credential material have to be spliced
//! into the statement text. Values are never rejected (account names may
//! legitimately contain quotes); instead backslashes and single quotes are
//! escaped before the value is wrapped in single quotes.

/// Escape a value for use inside a single-quoted MySQL string literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "''")
}

/// Quote a value as a single-quoted string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_literal(value))
}

/// Render an account as `'user'@'host'`.
pub fn quote_account(user: &str, host: &str) -> String {
    format!("{}@{}", quote_literal(user), quote_literal(host))
}

/// Render credential material as a SQL literal.
///
/// Printable UTF-8 is emitted as a quoted string; anything else (binary
/// `caching_sha2_password` hashes, for instance) as a hex literal so the bytes
/// are copied verbatim.
pub fn secret_literal(secret: &[u8]) -> String {
    match std::str::from_utf8(secret) {
        Ok(text) if !text.chars().any(char::is_control) => quote_literal(text),
        _ => format!("0x{}", hex::encode(secret)),
    }
}
