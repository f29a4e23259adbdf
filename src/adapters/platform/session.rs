//! Session persistence for OAuth credentials
//!
//! Credentials are keyed by the auth flow that produced them. Only the three
//! flows the platform offers are recognized; lookups and stores under any
//! other key are silently ignored.

use crate::config::SecretString;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

/// OAuth flow a set of credentials belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthKind {
    Server,
    Client,
    Password,
}

impl FromStr for AuthKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "server" => Ok(AuthKind::Server),
            "client" => Ok(AuthKind::Client),
            "password" => Ok(AuthKind::Password),
            other => Err(format!("unknown auth kind '{other}'")),
        }
    }
}

/// Tokens returned by the OAuth endpoint
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_in: Option<u64>,
}

/// Where credentials survive between client instances
pub trait SessionStore: Send + Sync {
    /// Credentials stored for `auth_kind`, if any
    fn get(&self, auth_kind: &str) -> Option<Credentials>;

    /// Store credentials for `auth_kind`
    fn set(&self, credentials: Credentials, auth_kind: &str);
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<AuthKind, Credentials>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, auth_kind: &str) -> Option<Credentials> {
        let kind = AuthKind::from_str(auth_kind).ok()?;
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(&kind).cloned()
    }

    fn set(&self, credentials: Credentials, auth_kind: &str) {
        let Ok(kind) = AuthKind::from_str(auth_kind) else {
            tracing::debug!(auth_kind, "Ignoring credentials for unknown auth kind");
            return;
        };
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(kind, credentials);
    }
}
