//! Matchmaking queue and group formation
//!
//! Sessions that ask to play wait here in FIFO order. Enqueueing, the
//! queue-size broadcast, and the group-size threshold check happen under one
//! lock acquisition, so two concurrent joins can never both claim the same
//! group members. The threshold is only evaluated at enqueue time; there is
//! no background sweep, and removal never triggers a match.

use crate::game::{GameConfig, GameRound};
use crate::session::Session;
use crate::words::WordList;
use log::info;
use shared::{waiting_list_size_line, QUEUE_JOINED_LINE};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// The session was already waiting; the queue is unchanged.
    AlreadyQueued,
}

pub struct Matchmaker {
    queue: Mutex<VecDeque<Arc<Session>>>,
    words: Arc<WordList>,
    config: GameConfig,
}

impl Matchmaker {
    pub fn new(words: Arc<WordList>, config: GameConfig) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            words,
            config,
        }
    }

    /// Appends the session, tells every waiting session the new queue size,
    /// confirms to the joiner, and forms a group once the threshold is met.
    pub async fn enqueue(&self, session: &Arc<Session>) -> EnqueueOutcome {
        let mut queue = self.queue.lock().await;
        if queue.iter().any(|queued| queued.id() == session.id()) {
            return EnqueueOutcome::AlreadyQueued;
        }
        queue.push_back(Arc::clone(session));

        let update = waiting_list_size_line(queue.len());
        for queued in queue.iter() {
            queued.send(update.clone());
        }
        session.send(QUEUE_JOINED_LINE);

        if queue.len() >= self.config.group_size {
            let group: Vec<Arc<Session>> = queue.drain(..self.config.group_size).collect();
            info!("Matched a group of {}, starting a round", group.len());
            let round = GameRound::new(group, Arc::clone(&self.words), self.config);
            tokio::spawn(round.run());
        }
        EnqueueOutcome::Queued
    }

    /// Drops a session from the queue if present (disconnect cleanup).
    pub async fn remove(&self, session: &Session) -> bool {
        let mut queue = self.queue.lock().await;
        let before = queue.len();
        queue.retain(|queued| queued.id() != session.id());
        queue.len() != before
    }

    pub async fn waiting(&self) -> usize {
        self.queue.lock().await.len()
    }
}
