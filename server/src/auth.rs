//! Account registry and live-session directory
//!
//! One lock guards both the credential store and the authenticated-session
//! directory, so registration, login, and logout are atomic with respect to
//! each other. Callers only ever see the outcome enums, never partial state.
//!
//! Accounts are in-memory only and live for the process lifetime; passwords
//! are stored and compared as plain text.

use crate::session::Session;
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    Accepted,
    AlreadyExists,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    InvalidCredentials,
}

#[derive(Default)]
struct Directory {
    /// username -> password
    accounts: HashMap<String, String>,
    /// username -> the session currently bound to it. A later login for the
    /// same username overwrites the previous binding.
    online: HashMap<String, Arc<Session>>,
}

/// Owned-state registry for accounts and logged-in sessions.
#[derive(Default)]
pub struct AuthRegistry {
    directory: RwLock<Directory>,
}

impl AuthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account unless the username is taken. No password policy.
    pub async fn register(&self, username: &str, password: &str) -> RegisterOutcome {
        let mut directory = self.directory.write().await;
        if directory.accounts.contains_key(username) {
            return RegisterOutcome::AlreadyExists;
        }
        directory
            .accounts
            .insert(username.to_string(), password.to_string());
        info!("Registered account {}", username);
        RegisterOutcome::Accepted
    }

    /// Checks credentials and, on success, binds the session into the
    /// directory and marks its bound username. Failure changes nothing.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        session: &Arc<Session>,
    ) -> LoginOutcome {
        let mut directory = self.directory.write().await;
        let valid = directory.accounts.get(username).map(String::as_str) == Some(password);
        if !valid {
            return LoginOutcome::InvalidCredentials;
        }
        directory
            .online
            .insert(username.to_string(), Arc::clone(session));
        session.bind_username(username).await;
        info!("User {} logged in (session {})", username, session.id());
        LoginOutcome::Success
    }

    /// Removes the username from the directory. Idempotent.
    pub async fn logout(&self, username: &str) {
        let mut directory = self.directory.write().await;
        if directory.online.remove(username).is_some() {
            info!("User {} logged out", username);
        }
    }

    /// Disconnect cleanup: removes the binding only while it still points at
    /// the given session, so a newer login for the same username survives a
    /// stale connection's teardown.
    pub async fn logout_session(&self, username: &str, session_id: u64) {
        let mut directory = self.directory.write().await;
        if directory.online.get(username).map(|s| s.id()) == Some(session_id) {
            directory.online.remove(username);
            info!("User {} logged out (session {} closed)", username, session_id);
        }
    }

    /// Point-in-time view of every logged-in user and their cumulative
    /// score, username-sorted. Reads only; never blocks round progress.
    pub async fn snapshot(&self) -> Vec<(String, f64)> {
        let directory = self.directory.read().await;
        let mut entries = Vec::with_capacity(directory.online.len());
        for (username, session) in directory.online.iter() {
            entries.push((username.clone(), session.total_score().await));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
