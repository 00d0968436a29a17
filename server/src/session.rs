//! Per-connection session state and command dispatch
//!
//! Each accepted connection owns one [`Session`]. The session's mutable
//! fields are written by exactly two parties: the connection's own task (on
//! command dispatch) and the game round driving its group. Everything they
//! share sits behind the session's lock, except the exit flag, which is an
//! atomic cancellation token the round reads at tick boundaries.

use crate::auth::{AuthRegistry, LoginOutcome, RegisterOutcome};
use crate::matchmaker::{EnqueueOutcome, Matchmaker};
use crate::scoreboard::Scoreboard;
use log::debug;
use shared::{
    login_success_line, parse_command, time_taken_line, word_score, word_score_line, Command,
    ALREADY_QUEUED_LINE, DASHBOARD_LINE, INCORRECT_GUESS_LINE, INVALID_CREDENTIALS_LINE,
    INVALID_LOGIN_LINE, INVALID_REGISTER_LINE, LOGIN_REQUIRED_LINE, LOGOUT_OK_LINE,
    NOT_LOGGED_IN_LINE, REGISTRATION_OK_LINE, USERNAME_TAKEN_LINE,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// The shared services a session dispatches into.
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<AuthRegistry>,
    pub matchmaker: Arc<Matchmaker>,
    pub scoreboard: Arc<Scoreboard>,
}

/// Fields guarded by the session lock.
#[derive(Debug, Default)]
struct PlayerState {
    username: Option<String>,
    current_word: Option<String>,
    word_issued_at: Option<Instant>,
    answered_correctly: bool,
    total_score: f64,
}

/// One live connection's state, shared as `Arc<Session>` between the
/// connection task, the registries, and at most one game round.
pub struct Session {
    id: u64,
    outbound: mpsc::UnboundedSender<String>,
    state: Mutex<PlayerState>,
    exit_requested: AtomicBool,
}

/// Result of matching a guessed line against the session's current word.
#[derive(Debug, PartialEq)]
pub enum GuessOutcome {
    Correct { elapsed_secs: u64, score: f64 },
    Incorrect,
}

impl Session {
    /// Creates a session writing its outbound lines into the given channel.
    /// The connection's writer task drains the other end.
    pub fn new(outbound: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            outbound,
            state: Mutex::new(PlayerState::default()),
            exit_requested: AtomicBool::new(false),
        }
    }

    /// Process-unique session identity, used for queue dedup and for the
    /// directory to tell stale bindings from live ones.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Queues one line for delivery. A closed connection drops the line;
    /// a game round may outlive its members' sockets.
    pub fn send(&self, line: impl Into<String>) {
        if self.outbound.send(line.into()).is_err() {
            debug!("Session {}: discarding line for closed connection", self.id);
        }
    }

    pub async fn username(&self) -> Option<String> {
        self.state.lock().await.username.clone()
    }

    pub async fn bind_username(&self, username: &str) {
        self.state.lock().await.username = Some(username.to_string());
    }

    /// Clears the bound username and the per-word answer flag, returning the
    /// previous binding. None means the session was not logged in.
    pub async fn unbind_username(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        state.answered_correctly = false;
        state.username.take()
    }

    /// Called by the round when a word goes live for this session.
    pub async fn begin_word(&self, word: &str, issued_at: Instant) {
        let mut state = self.state.lock().await;
        state.current_word = Some(word.to_string());
        state.word_issued_at = Some(issued_at);
        state.answered_correctly = false;
    }

    /// Called by the round when the word is resolved or the round ends.
    pub async fn clear_word(&self) {
        let mut state = self.state.lock().await;
        state.current_word = None;
        state.word_issued_at = None;
    }

    pub async fn answered_correctly(&self) -> bool {
        self.state.lock().await.answered_correctly
    }

    pub async fn current_word(&self) -> Option<String> {
        self.state.lock().await.current_word.clone()
    }

    pub async fn total_score(&self) -> f64 {
        self.state.lock().await.total_score
    }

    pub async fn reset_score(&self) {
        self.state.lock().await.total_score = 0.0;
    }

    /// Raises the cancellation flag read by the round at tick boundaries.
    pub fn request_exit(&self) {
        self.exit_requested.store(true, Ordering::Release);
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::Acquire)
    }

    /// Consumes the exit request, so the session can rejoin matchmaking.
    pub fn take_exit_request(&self) -> bool {
        self.exit_requested.swap(false, Ordering::AcqRel)
    }

    /// Matches a guessed line against the current word. An exact match marks
    /// the answer, accumulates the score, and retires the word; anything else
    /// leaves the state untouched.
    pub async fn try_guess(&self, guess: &str, now: Instant) -> GuessOutcome {
        let mut state = self.state.lock().await;
        if state.current_word.as_deref() != Some(guess) {
            return GuessOutcome::Incorrect;
        }
        let Some(issued_at) = state.word_issued_at else {
            return GuessOutcome::Incorrect;
        };
        let elapsed = now.duration_since(issued_at);
        let score = word_score(elapsed);
        state.answered_correctly = true;
        state.total_score += score;
        state.current_word = None;
        state.word_issued_at = None;
        GuessOutcome::Correct {
            elapsed_secs: elapsed.as_secs(),
            score,
        }
    }
}

/// Dispatches one inbound line against the shared services.
pub async fn handle_line(session: &Arc<Session>, services: &Services, line: &str) {
    match parse_command(line) {
        Command::Register { username, password } => {
            match services.auth.register(&username, &password).await {
                RegisterOutcome::Accepted => session.send(REGISTRATION_OK_LINE),
                RegisterOutcome::AlreadyExists => session.send(USERNAME_TAKEN_LINE),
            }
        }
        Command::MalformedRegister => session.send(INVALID_REGISTER_LINE),
        Command::Login { username, password } => {
            match services.auth.authenticate(&username, &password, session).await {
                LoginOutcome::Success => session.send(login_success_line(&username)),
                LoginOutcome::InvalidCredentials => session.send(INVALID_CREDENTIALS_LINE),
            }
        }
        Command::MalformedLogin => session.send(INVALID_LOGIN_LINE),
        Command::Logout => match session.unbind_username().await {
            Some(username) => {
                services.auth.logout(&username).await;
                session.send(LOGOUT_OK_LINE);
            }
            None => session.send(NOT_LOGGED_IN_LINE),
        },
        Command::Join => {
            if session.username().await.is_some() {
                match services.matchmaker.enqueue(session).await {
                    // The matchmaker messages the queue itself.
                    EnqueueOutcome::Queued => {}
                    EnqueueOutcome::AlreadyQueued => session.send(ALREADY_QUEUED_LINE),
                }
            } else {
                session.send(LOGIN_REQUIRED_LINE);
            }
        }
        Command::Scoreboard => {
            let report = services.scoreboard.render().await;
            session.send(report);
        }
        Command::Exit => {
            session.request_exit();
            session.reset_score().await;
            session.send(DASHBOARD_LINE);
        }
        Command::Guess(guess) => match session.try_guess(&guess, Instant::now()).await {
            GuessOutcome::Correct {
                elapsed_secs,
                score,
            } => {
                session.send(time_taken_line(elapsed_secs));
                session.send(word_score_line(score));
            }
            GuessOutcome::Incorrect => session.send(INCORRECT_GUESS_LINE),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::words::WordList;
    use assert_approx_eq::assert_approx_eq;
    use tokio::time::Duration;

    fn test_session() -> (Arc<Session>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Session::new(tx)), rx)
    }

    fn test_services() -> Services {
        let auth = Arc::new(AuthRegistry::new());
        Services {
            scoreboard: Arc::new(Scoreboard::new(Arc::clone(&auth))),
            matchmaker: Arc::new(Matchmaker::new(
                Arc::new(WordList::from_words(vec!["ferris".to_string()])),
                GameConfig {
                    group_size: 64, // never reached, no round spawns mid-test
                    ..GameConfig::default()
                },
            )),
            auth,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_session_ids_are_unique() {
        let (a, _rx_a) = test_session();
        let (b, _rx_b) = test_session();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_registration_scenario() {
        let services = test_services();
        let (session, mut rx) = test_session();

        handle_line(&session, &services, "REGISTER alice p1").await;
        handle_line(&session, &services, "REGISTER alice p1").await;

        assert_eq!(
            drain(&mut rx),
            vec![
                "Registration successful. Please login.",
                "Username already exists. Please try again.",
            ]
        );
    }

    #[tokio::test]
    async fn test_login_scenario() {
        let services = test_services();
        let (session, mut rx) = test_session();

        handle_line(&session, &services, "REGISTER alice p1").await;
        handle_line(&session, &services, "LOGIN alice wrong").await;
        handle_line(&session, &services, "LOGIN alice p1").await;

        let lines = drain(&mut rx);
        assert_eq!(lines[1], "Invalid username or password. Please try again.");
        assert_eq!(lines[2], "Login successful. Welcome alice!");
        assert_eq!(session.username().await.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_malformed_register_and_login() {
        let services = test_services();
        let (session, mut rx) = test_session();

        handle_line(&session, &services, "REGISTER alice").await;
        handle_line(&session, &services, "LOGIN alice p1 extra").await;

        assert_eq!(
            drain(&mut rx),
            vec!["Invalid registration command.", "Invalid login command."]
        );
    }

    #[tokio::test]
    async fn test_logout_when_not_logged_in() {
        let services = test_services();
        let (session, mut rx) = test_session();

        handle_line(&session, &services, "LOGOUT").await;

        assert_eq!(drain(&mut rx), vec!["You are not logged in."]);
    }

    #[tokio::test]
    async fn test_logout_unbinds_and_clears_answer_flag() {
        let services = test_services();
        let (session, mut rx) = test_session();

        handle_line(&session, &services, "REGISTER alice p1").await;
        handle_line(&session, &services, "LOGIN alice p1").await;
        session.begin_word("crab", Instant::now()).await;
        session.try_guess("crab", Instant::now()).await;
        assert!(session.answered_correctly().await);

        handle_line(&session, &services, "LOGOUT").await;

        assert_eq!(session.username().await, None);
        assert!(!session.answered_correctly().await);
        assert_eq!(
            drain(&mut rx).last().map(String::as_str),
            Some("Logout successful. Please login or register.")
        );
    }

    #[tokio::test]
    async fn test_join_requires_login() {
        let services = test_services();
        let (session, mut rx) = test_session();

        handle_line(&session, &services, "JOIN").await;

        assert_eq!(
            drain(&mut rx),
            vec!["You must be logged in to join the game."]
        );
    }

    #[tokio::test]
    async fn test_duplicate_join_is_reported() {
        let services = test_services();
        let (session, mut rx) = test_session();

        handle_line(&session, &services, "REGISTER alice p1").await;
        handle_line(&session, &services, "LOGIN alice p1").await;
        handle_line(&session, &services, "JOIN").await;
        handle_line(&session, &services, "JOIN").await;

        assert_eq!(
            drain(&mut rx).last().map(String::as_str),
            Some("You are already in the waiting list.")
        );
    }

    #[tokio::test]
    async fn test_exit_sets_flag_and_resets_score() {
        let services = test_services();
        let (session, mut rx) = test_session();

        session.begin_word("crab", Instant::now()).await;
        session.try_guess("crab", Instant::now()).await;
        assert!(session.total_score().await > 0.0);

        handle_line(&session, &services, "EXIT").await;

        assert!(session.exit_requested());
        assert_approx_eq!(session.total_score().await, 0.0);
        assert_eq!(drain(&mut rx), vec!["Exiting game. Welcome to dashboard."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_correct_guess_scores_and_replies() {
        let services = test_services();
        let (session, mut rx) = test_session();

        session.begin_word("ferris", Instant::now()).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        handle_line(&session, &services, "ferris").await;

        assert_eq!(
            drain(&mut rx),
            vec![
                "Correct! Time taken: 5 s.",
                "Correct! Your score for this word: 2.5",
            ]
        );
        assert_approx_eq!(session.total_score().await, 2.5);
        assert_eq!(session.current_word().await, None);
        assert!(session.answered_correctly().await);
    }

    #[tokio::test]
    async fn test_incorrect_guess_leaves_state_unchanged() {
        let services = test_services();
        let (session, mut rx) = test_session();

        session.begin_word("ferris", Instant::now()).await;
        handle_line(&session, &services, "ferriss").await;

        assert_eq!(drain(&mut rx), vec!["Incorrect word. Try again."]);
        assert_eq!(session.current_word().await.as_deref(), Some("ferris"));
        assert!(!session.answered_correctly().await);
        assert_approx_eq!(session.total_score().await, 0.0);
    }

    #[tokio::test]
    async fn test_guess_without_a_round_is_incorrect() {
        let services = test_services();
        let (session, mut rx) = test_session();

        handle_line(&session, &services, "anything").await;

        assert_eq!(drain(&mut rx), vec!["Incorrect word. Try again."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scores_accumulate_across_words() {
        let (session, _rx) = test_session();

        session.begin_word("one", Instant::now()).await;
        session.try_guess("one", Instant::now()).await;
        session.begin_word("two", Instant::now()).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        session.try_guess("two", Instant::now()).await;

        assert_approx_eq!(session.total_score().await, 5.5);
    }

    #[tokio::test]
    async fn test_take_exit_request_clears_the_flag() {
        let (session, _rx) = test_session();

        session.request_exit();
        assert!(session.take_exit_request());
        assert!(!session.exit_requested());
        assert!(!session.take_exit_request());
    }
}
