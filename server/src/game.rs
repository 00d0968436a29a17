//! Timed game-round state machine
//!
//! One [`GameRound`] task runs per matched group, on an explicit one-second
//! tick interval. Each word goes through Announcing (settle delay before the
//! reveal), Active (countdown, polling the members' answer flags), and
//! Resolved, looping until the per-game word limit or until any member's
//! exit flag aborts the round. The round never waits on client input
//! directly; members' flags are read at tick boundaries only.

use crate::session::Session;
use crate::words::WordList;
use log::{debug, error, info};
use shared::{
    new_word_line, time_remaining_line, DASHBOARD_LINE, DEFAULT_GROUP_SIZE,
    DEFAULT_TIME_LIMIT_SECS, DEFAULT_WORDS_PER_GAME, GAME_OVER_LINE, SETTLE_DELAY_SECS,
    WORD_MISSED_LINE,
};
use std::sync::Arc;
use tokio::time::{interval, Duration, Instant, Interval, MissedTickBehavior};

/// Tunable game parameters, defaulting to the classic rules.
#[derive(Debug, Clone, Copy)]
pub struct GameConfig {
    pub group_size: usize,
    pub words_per_game: u32,
    pub time_limit_secs: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            words_per_game: DEFAULT_WORDS_PER_GAME,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
        }
    }
}

/// How one word challenge ended.
#[derive(Debug, PartialEq, Eq)]
enum WordOutcome {
    /// A member typed the word before the countdown ran out.
    Solved,
    /// The countdown reached zero with no correct answer.
    TimedOut,
    /// A member requested exit; the round stops here.
    Aborted,
}

/// One game run for one matched group. Owns the group for its lifetime.
pub struct GameRound {
    group: Vec<Arc<Session>>,
    words: Arc<WordList>,
    config: GameConfig,
}

impl GameRound {
    pub fn new(group: Vec<Arc<Session>>, words: Arc<WordList>, config: GameConfig) -> Self {
        Self {
            group,
            words,
            config,
        }
    }

    /// Drives the round to completion. Best-effort background task: failures
    /// end this round only, never the server.
    pub async fn run(self) {
        if self.words.is_empty() {
            error!(
                "Refusing to start a round for {} player(s): word list is empty",
                self.group.len()
            );
            return;
        }
        info!("Round started with {} player(s)", self.group.len());

        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it.
        ticker.tick().await;

        let mut aborted = false;
        let mut words_played = 0;
        while words_played < self.config.words_per_game {
            if !self.settle(&mut ticker).await {
                aborted = true;
                break;
            }
            let Some(word) = self.words.pick() else { break };
            let word = word.to_string();
            if self.play_word(&word, &mut ticker).await == WordOutcome::Aborted {
                aborted = true;
                break;
            }
            words_played += 1;
        }
        self.finish(aborted).await;
    }

    /// Announcing: holds the settle delay before the next reveal, watching
    /// for exit requests at each tick. Returns false to abort.
    async fn settle(&self, ticker: &mut Interval) -> bool {
        for _ in 0..SETTLE_DELAY_SECS {
            ticker.tick().await;
            if self.exit_requested() {
                return false;
            }
        }
        true
    }

    /// Active + Resolved: publishes the word, counts down one broadcast per
    /// tick, and resolves on the first correct answer or on timeout.
    async fn play_word(&self, word: &str, ticker: &mut Interval) -> WordOutcome {
        let issued_at = Instant::now();
        for member in &self.group {
            // State first, reveal second: a guess racing the reveal must
            // find the word already set.
            member.begin_word(word, issued_at).await;
            member.send(new_word_line(word));
        }

        let mut outcome = WordOutcome::TimedOut;
        let mut remaining = self.config.time_limit_secs;
        while remaining > 0 {
            if self.exit_requested() {
                return WordOutcome::Aborted;
            }
            self.broadcast(&time_remaining_line(remaining));
            ticker.tick().await;
            remaining -= 1;
            if self.any_answered().await {
                outcome = WordOutcome::Solved;
                break;
            }
        }
        debug!("Word '{}' resolved: {:?}", word, outcome);

        // Resolved: whoever did not answer is told the word was missed,
        // and nobody keeps a stale current word.
        for member in &self.group {
            if !member.answered_correctly().await {
                member.send(WORD_MISSED_LINE);
            }
            member.clear_word().await;
        }
        outcome
    }

    /// Final cleanup for both the normal and the aborted path. Members that
    /// asked to exit get the dashboard notice and their flag back, so they
    /// can rejoin matchmaking; the rest just see the round end.
    async fn finish(&self, aborted: bool) {
        if !aborted {
            self.broadcast(GAME_OVER_LINE);
        }
        for member in &self.group {
            member.clear_word().await;
            if member.take_exit_request() {
                member.send(DASHBOARD_LINE);
            }
        }
        info!(
            "Round over for {} player(s){}",
            self.group.len(),
            if aborted { " (aborted)" } else { "" }
        );
    }

    fn exit_requested(&self) -> bool {
        self.group.iter().any(|member| member.exit_requested())
    }

    async fn any_answered(&self) -> bool {
        for member in &self.group {
            if member.answered_correctly().await {
                return true;
            }
        }
        false
    }

    fn broadcast(&self, line: &str) {
        for member in &self.group {
            member.send(line);
        }
    }
}
