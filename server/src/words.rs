//! Word list loading and random selection
//!
//! The list is read once at startup from a newline-delimited file. A missing
//! or unreadable file degrades to an empty list; game rounds refuse to start
//! on an empty list, so the degenerate case stays contained here.

use log::{info, warn};
use rand::seq::SliceRandom;
use std::path::Path;

/// The pool of words a game round draws from.
///
/// Selection is uniform random with replacement; the same word can come up
/// twice in one game.
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Loads the list from a file, one word per line. Blank lines and
    /// surrounding whitespace are dropped.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let words: Vec<String> = contents
                    .lines()
                    .map(str::trim)
                    .filter(|word| !word.is_empty())
                    .map(str::to_string)
                    .collect();
                info!("Loaded {} words from {}", words.len(), path.display());
                Self { words }
            }
            Err(e) => {
                warn!("Could not read word file {}: {}", path.display(), e);
                Self { words: Vec::new() }
            }
        }
    }

    pub fn from_words(words: Vec<String>) -> Self {
        Self { words }
    }

    /// Picks a word uniformly at random, or None if the list is empty.
    pub fn pick(&self) -> Option<&str> {
        self.words
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
