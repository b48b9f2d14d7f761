//! Glob matching of `user@host` account identities.
//!
//! Patterns take the form `userGlob` or `userGlob@hostGlob`. Both `%` (the MySQL
//! wildcard) and `*` are accepted and normalized to `*`; runs of wildcards collapse
//! to a single one. A pattern without `@` (or with an empty host part) matches any
//! host. Matching is case-insensitive and fails closed: an empty pattern never
//! matches anything.

use wildmatch::WildMatch;

/// Replace `%` with `*` and collapse consecutive `*`.
fn normalize_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        let ch = if ch == '%' { '*' } else { ch };
        if ch == '*' && out.ends_with('*') {
            continue;
        }
        out.push(ch);
    }
    out
}

fn match_glob(value: &str, pattern: &str) -> bool {
    let pattern = normalize_glob(pattern);
    if pattern.is_empty() {
        return false;
    }
    if pattern == "*" {
        return true;
    }
    WildMatch::new(&pattern).matches(value)
}

/// Check whether `user@host` matches a single identity pattern.
pub fn matches_identity(user: &str, host: &str, pattern: &str) -> bool {
    let pattern = pattern.trim().to_lowercase();
    if pattern.is_empty() {
        return false;
    }

    let (user_pat, host_pat) = match pattern.split_once('@') {
        Some((u, h)) => (u, h),
        None => (pattern.as_str(), ""),
    };

    if !match_glob(&user.to_lowercase(), user_pat) {
        return false;
    }
    if host_pat.is_empty() {
        return true;
    }
    match_glob(&host.to_lowercase(), host_pat)
}

/// Decide whether an account passes the include/exclude filters.
///
/// Any exclude match rejects the account. Otherwise an empty include list admits
/// everything, and a non-empty one requires at least one match.
pub fn should_include(user: &str, host: &str, include: &[String], exclude: &[String]) -> bool {
    if exclude.iter().any(|p| matches_identity(user, host, p)) {
        return false;
    }
    include.is_empty() || include.iter().any(|p| matches_identity(user, host, p))
}

/// Include/exclude pattern lists bundled together.
#[derive(Debug, Clone, Default)]
pub struct IdentityFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl IdentityFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    pub fn admits(&self, user: &str, host: &str) -> bool {
        should_include(user, host, &self.include, &self.exclude)
    }
}
