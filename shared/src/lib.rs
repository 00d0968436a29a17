//! Protocol vocabulary shared between the Typefast server and its clients.
//!
//! The wire format is newline-terminated UTF-8 text in both directions. The
//! graphical client dispatches on the literal prefixes of the server lines
//! defined here, so every constant and builder in this crate is part of the
//! compatibility contract and must stay byte-for-byte stable.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 12345;
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30;
pub const DEFAULT_GROUP_SIZE: usize = 1;
pub const DEFAULT_WORDS_PER_GAME: u32 = 5;
pub const DEFAULT_MAX_SESSIONS: usize = 10;

/// Delay between picking a word and revealing it, so clients can catch up.
pub const SETTLE_DELAY_SECS: u32 = 3;

/// Marks awarded for an instant correct answer.
pub const MAX_WORD_SCORE: f64 = 3.0;
/// One mark is deducted per this many seconds of answer time.
pub const SCORE_DECAY_SECS: f64 = 10.0;

pub const WELCOME_LINE: &str = "Welcome to Typefast! Please register or login to play.";
pub const REGISTRATION_OK_LINE: &str = "Registration successful. Please login.";
pub const USERNAME_TAKEN_LINE: &str = "Username already exists. Please try again.";
pub const INVALID_CREDENTIALS_LINE: &str = "Invalid username or password. Please try again.";
pub const INVALID_REGISTER_LINE: &str = "Invalid registration command.";
pub const INVALID_LOGIN_LINE: &str = "Invalid login command.";
pub const LOGOUT_OK_LINE: &str = "Logout successful. Please login or register.";
pub const NOT_LOGGED_IN_LINE: &str = "You are not logged in.";
pub const LOGIN_REQUIRED_LINE: &str = "You must be logged in to join the game.";
pub const QUEUE_JOINED_LINE: &str = "Added to waiting list. Waiting for other players...";
pub const ALREADY_QUEUED_LINE: &str = "You are already in the waiting list.";
pub const WORD_MISSED_LINE: &str = "Time's up! You did not type the word correctly.";
pub const GAME_OVER_LINE: &str = "Game over. Thanks for playing!";
pub const DASHBOARD_LINE: &str = "Exiting game. Welcome to dashboard.";
pub const INCORRECT_GUESS_LINE: &str = "Incorrect word. Try again.";

/// A single inbound line, decoded against the literal first token.
///
/// Anything that is not a recognized command is a word guess and carries the
/// whole raw line, because guesses are compared against the full word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register { username: String, password: String },
    Login { username: String, password: String },
    Logout,
    Join,
    Scoreboard,
    Exit,
    Guess(String),
    /// REGISTER with the wrong number of arguments.
    MalformedRegister,
    /// LOGIN with the wrong number of arguments.
    MalformedLogin,
}

/// Decodes one inbound line.
///
/// REGISTER and LOGIN require exactly two arguments; trailing arguments
/// of the bare commands are ignored.
pub fn parse_command(line: &str) -> Command {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("REGISTER") => match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(username), Some(password), None) => Command::Register {
                username: username.to_string(),
                password: password.to_string(),
            },
            _ => Command::MalformedRegister,
        },
        Some("LOGIN") => match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(username), Some(password), None) => Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            },
            _ => Command::MalformedLogin,
        },
        Some("LOGOUT") => Command::Logout,
        Some("JOIN") => Command::Join,
        Some("SCOREBOARD") => Command::Scoreboard,
        Some("EXIT") => Command::Exit,
        _ => Command::Guess(line.to_string()),
    }
}

/// Score for a correct guess: starts at the full marks and decays linearly
/// with answer time, floored at zero.
pub fn word_score(elapsed: Duration) -> f64 {
    (MAX_WORD_SCORE - elapsed.as_secs_f64() / SCORE_DECAY_SECS).max(0.0)
}

/// Renders a score the way the clients expect: always at least one decimal
/// place, so whole numbers come out as `0.0` or `3.0` rather than `0`.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.1}", score)
    } else {
        score.to_string()
    }
}

pub fn login_success_line(username: &str) -> String {
    format!("Login successful. Welcome {}!", username)
}

pub fn waiting_list_size_line(count: usize) -> String {
    format!("Players in waiting list: {}", count)
}

pub fn new_word_line(word: &str) -> String {
    format!("New word: {}", word)
}

pub fn time_remaining_line(seconds: u32) -> String {
    format!("Time remaining: {} seconds", seconds)
}

pub fn time_taken_line(seconds: u64) -> String {
    format!("Correct! Time taken: {} s.", seconds)
}

pub fn word_score_line(score: f64) -> String {
    format!("Correct! Your score for this word: {}", format_score(score))
}

/// Formats the scoreboard report. The first entry shares the `Scoreboard:`
/// line, every further entry gets its own line, and an empty directory
/// renders as the bare heading.
pub fn scoreboard_report(entries: &[(String, f64)]) -> String {
    let mut report = String::from("Scoreboard: ");
    for (username, score) in entries {
        report.push_str(username);
        report.push_str(": ");
        report.push_str(&format_score(*score));
        report.push('\n');
    }
    report.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_parse_register() {
        assert_eq!(
            parse_command("REGISTER alice p1"),
            Command::Register {
                username: "alice".to_string(),
                password: "p1".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_register_wrong_arity() {
        assert_eq!(parse_command("REGISTER alice"), Command::MalformedRegister);
        assert_eq!(
            parse_command("REGISTER alice p1 extra"),
            Command::MalformedRegister
        );
        assert_eq!(parse_command("REGISTER"), Command::MalformedRegister);
    }

    #[test]
    fn test_parse_login() {
        assert_eq!(
            parse_command("LOGIN alice p1"),
            Command::Login {
                username: "alice".to_string(),
                password: "p1".to_string(),
            }
        );
        assert_eq!(parse_command("LOGIN alice"), Command::MalformedLogin);
    }

    #[test]
    fn test_parse_bare_commands() {
        assert_eq!(parse_command("LOGOUT"), Command::Logout);
        assert_eq!(parse_command("JOIN"), Command::Join);
        assert_eq!(parse_command("SCOREBOARD"), Command::Scoreboard);
        assert_eq!(parse_command("EXIT"), Command::Exit);
    }

    #[test]
    fn test_parse_bare_commands_ignore_extra_arguments() {
        assert_eq!(parse_command("JOIN now"), Command::Join);
        assert_eq!(parse_command("LOGOUT please"), Command::Logout);
    }

    #[test]
    fn test_parse_guess_keeps_whole_line() {
        assert_eq!(
            parse_command("hello world"),
            Command::Guess("hello world".to_string())
        );
        assert_eq!(parse_command(""), Command::Guess(String::new()));
        // Commands are case-sensitive; lowercase is a guess.
        assert_eq!(parse_command("join"), Command::Guess("join".to_string()));
    }

    #[test]
    fn test_word_score_decays_linearly() {
        assert_approx_eq!(word_score(Duration::from_secs(0)), 3.0);
        assert_approx_eq!(word_score(Duration::from_secs(5)), 2.5);
        assert_approx_eq!(word_score(Duration::from_secs(10)), 2.0);
        assert_approx_eq!(word_score(Duration::from_millis(2500)), 2.75);
    }

    #[test]
    fn test_word_score_never_negative() {
        assert_approx_eq!(word_score(Duration::from_secs(30)), 0.0);
        assert_approx_eq!(word_score(Duration::from_secs(300)), 0.0);
    }

    #[test]
    fn test_word_score_monotonically_non_increasing() {
        let mut previous = f64::MAX;
        for seconds in 0..60 {
            let score = word_score(Duration::from_secs(seconds));
            assert!(score <= previous);
            assert!(score >= 0.0);
            previous = score;
        }
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(2.5), "2.5");
        assert_eq!(format_score(0.0), "0.0");
        assert_eq!(format_score(3.0), "3.0");
        assert_eq!(format_score(2.25), "2.25");
    }

    #[test]
    fn test_line_builders() {
        assert_eq!(
            login_success_line("alice"),
            "Login successful. Welcome alice!"
        );
        assert_eq!(waiting_list_size_line(2), "Players in waiting list: 2");
        assert_eq!(new_word_line("ferris"), "New word: ferris");
        assert_eq!(time_remaining_line(30), "Time remaining: 30 seconds");
        assert_eq!(time_taken_line(5), "Correct! Time taken: 5 s.");
        assert_eq!(
            word_score_line(2.5),
            "Correct! Your score for this word: 2.5"
        );
    }

    #[test]
    fn test_scoreboard_report_empty() {
        assert_eq!(scoreboard_report(&[]), "Scoreboard:");
    }

    #[test]
    fn test_scoreboard_report_single_entry_shares_heading_line() {
        let entries = vec![("alice".to_string(), 2.5)];
        assert_eq!(scoreboard_report(&entries), "Scoreboard: alice: 2.5");
    }

    #[test]
    fn test_scoreboard_report_multiple_entries() {
        let entries = vec![("alice".to_string(), 2.5), ("bob".to_string(), 0.0)];
        assert_eq!(
            scoreboard_report(&entries),
            "Scoreboard: alice: 2.5\nbob: 0.0"
        );
    }
}
