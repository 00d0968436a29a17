//! # Typefast Game Server Library
//!
//! This library implements the authoritative server for the Typefast
//! multiplayer typing game. Clients connect over TCP and speak a
//! newline-terminated text protocol: they register and log in, join a
//! matchmaking queue, race to type the words the server announces, and
//! query a live scoreboard.
//!
//! ## Architecture
//!
//! The server runs one task per connection plus one task per active game
//! round; there is no central event loop. Connection tasks block only on
//! reading their own socket. Round tasks block only on their one-second
//! tick interval and poll their members' shared answer/exit flags at tick
//! boundaries, so they never wait on client input directly.
//!
//! Shared state is owned by the service structs and only reachable through
//! their atomic operations:
//!
//! - [`auth::AuthRegistry`] — the credential store and the directory of
//!   logged-in sessions, behind a single lock.
//! - [`matchmaker::Matchmaker`] — the FIFO waiting queue; forms a group and
//!   spawns a [`game::GameRound`] the moment the queue reaches the group
//!   size.
//! - [`scoreboard::Scoreboard`] — read-only score reporting over the
//!   directory.
//!
//! ## Module Organization
//!
//! - [`network`] — TCP acceptance under a fixed-capacity session pool, plus
//!   the per-connection reader/writer tasks.
//! - [`session`] — per-connection state and the command dispatcher.
//! - [`game`] — the timed word-round state machine driving each group.
//! - [`words`] — startup loading of the word list and random selection.

pub mod auth;
pub mod game;
pub mod matchmaker;
pub mod network;
pub mod scoreboard;
pub mod session;
pub mod words;
