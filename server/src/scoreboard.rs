//! Scoreboard reporting over the live-session directory

use crate::auth::AuthRegistry;
use shared::scoreboard_report;
use std::sync::Arc;

/// Stateless query service: snapshots every logged-in user's cumulative
/// score and formats the report. Best-effort point-in-time view; concurrent
/// score updates are not locked out.
pub struct Scoreboard {
    auth: Arc<AuthRegistry>,
}

impl Scoreboard {
    pub fn new(auth: Arc<AuthRegistry>) -> Self {
        Self { auth }
    }

    pub async fn render(&self) -> String {
        scoreboard_report(&self.auth.snapshot().await)
    }
}
