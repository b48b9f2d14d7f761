//! In-memory servers for exercising the engine without MySQL.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::{redact_dsn, AccountRow, AccountSource, AccountTarget, Connector, UserRecord};
use crate::error::{MigrateError, Result};

/// A mutating call observed by a fake server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(String),
    Drop(String),
    Grant(String),
}

#[derive(Default)]
struct State {
    accounts: Vec<AccountRow>,
    grants: HashMap<(String, String), Vec<String>>,
    failing_lookups: HashSet<(String, String)>,
    grant_lookups: Vec<String>,
    target_accounts: HashSet<(String, String)>,
    failing_grants: HashSet<String>,
    failing_exists: HashSet<String>,
    failing_creates: HashSet<String>,
    failing_drops: HashSet<String>,
    grant_delays: HashMap<String, Duration>,
    cancel_on_grant: Option<(String, CancellationToken)>,
    mutations: Vec<Mutation>,
}

/// One fake server acting as source, target, or both.
#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<State>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_account(self, user: &str, host: &str, grants: &[&str]) -> Self {
        {
            let mut state = self.state();
            state.accounts.push(AccountRow {
                user: user.to_string(),
                host: host.to_string(),
                auth_plugin: "mysql_native_password".to_string(),
                auth_secret: b"*HASH".to_vec(),
            });
            state.grants.insert(
                (user.to_string(), host.to_string()),
                grants.iter().map(|g| g.to_string()).collect(),
            );
        }
        self
    }

    pub fn failing_grant_lookup(self, user: &str, host: &str) -> Self {
        self.state()
            .failing_lookups
            .insert((user.to_string(), host.to_string()));
        self
    }

    pub fn failing_grant(self, statement: &str) -> Self {
        self.state().failing_grants.insert(statement.to_string());
        self
    }

    /// Existence checks for `user@host` fail.
    pub fn failing_exists(self, identity: &str) -> Self {
        self.state().failing_exists.insert(identity.to_string());
        self
    }

    /// `CREATE USER` for `user@host` fails.
    pub fn failing_create(self, identity: &str) -> Self {
        self.state().failing_creates.insert(identity.to_string());
        self
    }

    /// `DROP USER` for `user@host` fails.
    pub fn failing_drop(self, identity: &str) -> Self {
        self.state().failing_drops.insert(identity.to_string());
        self
    }

    /// Hold `statement` for `delay` before applying it.
    pub fn with_grant_delay(self, statement: &str, delay: Duration) -> Self {
        self.state()
            .grant_delays
            .insert(statement.to_string(), delay);
        self
    }

    /// Cancel `token` right after `statement` has been applied.
    pub fn cancel_on_grant(self, statement: &str, token: CancellationToken) -> Self {
        self.state().cancel_on_grant = Some((statement.to_string(), token));
        self
    }

    pub fn seed_target_account(&self, user: &str, host: &str) {
        self.state()
            .target_accounts
            .insert((user.to_string(), host.to_string()));
    }

    pub fn target_has_account(&self, user: &str, host: &str) -> bool {
        self.state()
            .target_accounts
            .contains(&(user.to_string(), host.to_string()))
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state().mutations.clone()
    }

    pub fn grant_lookups(&self) -> Vec<String> {
        self.state().grant_lookups.clone()
    }

    pub fn session(&self) -> FakeSession {
        FakeSession {
            server: self.clone(),
            _guard: None,
        }
    }
}

/// Decrements the open-session counter when a session goes away.
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct FakeSession {
    server: FakeServer,
    _guard: Option<ActiveGuard>,
}

#[async_trait]
impl AccountSource for FakeSession {
    async fn list_accounts(&mut self) -> Result<Vec<AccountRow>> {
        Ok(self.server.state().accounts.clone())
    }

    async fn show_grants(&mut self, user: &str, host: &str) -> Result<Vec<String>> {
        let mut state = self.server.state();
        let key = (user.to_string(), host.to_string());
        if state.failing_lookups.contains(&key) {
            return Err(MigrateError::query("There is no such grant defined", "show grants"));
        }
        state.grant_lookups.push(format!("{}@{}", user, host));
        Ok(state.grants.get(&key).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl AccountTarget for FakeSession {
    async fn account_exists(&mut self, user: &str, host: &str) -> Result<bool> {
        let identity = format!("{}@{}", user, host);
        if self.server.state().failing_exists.contains(&identity) {
            return Err(MigrateError::query("Lost connection", "checking account existence"));
        }
        Ok(self.server.target_has_account(user, host))
    }

    async fn create_account(&mut self, record: &UserRecord) -> Result<()> {
        let mut state = self.server.state();
        if state.failing_creates.contains(&record.identity()) {
            return Err(MigrateError::query("Operation CREATE USER failed", "create user"));
        }
        state
            .target_accounts
            .insert((record.user.clone(), record.host.clone()));
        state.mutations.push(Mutation::Create(record.identity()));
        Ok(())
    }

    async fn drop_account(&mut self, user: &str, host: &str) -> Result<()> {
        let mut state = self.server.state();
        if state.failing_drops.contains(&format!("{}@{}", user, host)) {
            return Err(MigrateError::query("Operation DROP USER failed", "drop user"));
        }
        state
            .target_accounts
            .remove(&(user.to_string(), host.to_string()));
        state.mutations.push(Mutation::Drop(format!("{}@{}", user, host)));
        Ok(())
    }

    async fn apply_grant(&mut self, statement: &str) -> Result<()> {
        let delay = self.server.state().grant_delays.get(statement).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.server.state();
        if state.failing_grants.contains(statement) {
            return Err(MigrateError::query("Access denied", "exec"));
        }
        state.mutations.push(Mutation::Grant(statement.to_string()));
        if let Some((ref trigger, ref token)) = state.cancel_on_grant {
            if trigger == statement {
                token.cancel();
            }
        }
        Ok(())
    }
}

/// Routes DSNs to fake servers and tracks how many sessions are open at once.
#[derive(Default)]
pub struct FakeConnector {
    servers: HashMap<String, FakeServer>,
    connect_delay: HashMap<String, Duration>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    connects: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, dsn: &str, server: FakeServer) -> Self {
        self.servers.insert(dsn.to_string(), server);
        self
    }

    pub fn with_connect_delay(mut self, dsn: &str, delay: Duration) -> Self {
        self.connect_delay.insert(dsn.to_string(), delay);
        self
    }

    /// Highest number of sessions that were open simultaneously.
    pub fn peak_sessions(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn open_sessions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn connect_attempts(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, dsn: &str, timeout: Duration) -> Result<FakeSession> {
        self.connects.lock().unwrap().push(dsn.to_string());
        if let Some(delay) = self.connect_delay.get(dsn) {
            if *delay > timeout {
                tokio::time::sleep(timeout).await;
                return Err(MigrateError::Timeout(format!("connecting to {}", redact_dsn(dsn))));
            }
            tokio::time::sleep(*delay).await;
        }
        let server = self
            .servers
            .get(dsn)
            .cloned()
            .ok_or_else(|| MigrateError::connection(redact_dsn(dsn), "connection refused"))?;

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        Ok(FakeSession {
            server,
            _guard: Some(ActiveGuard(self.active.clone())),
        })
    }

    async fn disconnect(&self, session: FakeSession) {
        drop(session);
    }
}
