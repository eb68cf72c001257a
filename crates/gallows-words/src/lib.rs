//! Dictionary loading and per-session word pools.
//!
//! The server reads one master [`WordList`] at startup (from a file
//! or standard input) and hands every session its own [`WordPool`]
//! clone, from which games draw words uniformly at random without
//! replacement.
//!
//! Input normalization: one word per line, case-folded to uppercase,
//! characters that are neither ASCII alphabetic nor space stripped,
//! lines left without a single letter skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::RngExt;
use thiserror::Error;
use tracing::debug;

/// Result type for word list operations.
pub type Result<T> = std::result::Result<T, WordsError>;

/// Errors raised while loading a dictionary.
#[derive(Debug, Error)]
pub enum WordsError {
    /// Reading the source failed.
    #[error("failed to read word list: {0}")]
    Io(#[from] std::io::Error),

    /// The source contained no usable words.
    #[error("word list is empty after normalization")]
    Empty,

    /// A normalized word does not fit the mailbox word field.
    #[error("word {word:?} is {len} bytes, limit is {max}")]
    TooLong {
        /// The offending word (truncated for display).
        word: String,
        /// Its normalized length.
        len: usize,
        /// The configured maximum.
        max: usize,
    },
}

/// The master dictionary, loaded once by the server.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Load and normalize words from any line-oriented reader.
    ///
    /// `max_len` bounds the normalized word length (the mailbox word
    /// field size); a longer word aborts the load rather than being
    /// silently truncated.
    pub fn from_reader<R: BufRead>(reader: R, max_len: usize) -> Result<Self> {
        let mut words = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let word: String = line
                .chars()
                .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
                .map(|c| c.to_ascii_uppercase())
                .collect();
            // A line without a single letter (empty or spaces only)
            // is blank, not a word.
            if !word.bytes().any(|b| b.is_ascii_alphabetic()) {
                continue;
            }
            if word.len() > max_len {
                return Err(WordsError::TooLong {
                    word: word.chars().take(16).collect(),
                    len: word.len(),
                    max: max_len,
                });
            }
            words.push(word);
        }
        if words.is_empty() {
            return Err(WordsError::Empty);
        }
        debug!(count = words.len(), "loaded word list");
        Ok(Self { words })
    }

    /// Load a dictionary from a file.
    pub fn from_path<P: AsRef<Path>>(path: P, max_len: usize) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), max_len)
    }

    /// Number of words in the dictionary.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the dictionary is empty (never true after loading).
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// A fresh pool holding a private copy of every word.
    pub fn pool(&self) -> WordPool {
        WordPool {
            words: self.words.clone(),
        }
    }
}

/// A session-private pool of not-yet-played words.
#[derive(Debug, Clone)]
pub struct WordPool {
    words: Vec<String>,
}

impl WordPool {
    /// Remove and return one word chosen uniformly at random.
    ///
    /// Returns `None` once the pool is exhausted.
    pub fn draw<R: RngExt>(&mut self, rng: &mut R) -> Option<String> {
        if self.words.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.words.len());
        Some(self.words.swap_remove(index))
    }

    /// Words still available to this session.
    pub fn remaining(&self) -> usize {
        self.words.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;
    use std::io::Cursor;

    #[test]
    fn normalizes_case_and_strips_noise() {
        let input = Cursor::new("cat\nDoG!\n  \n42\nice cream\n");
        let list = WordList::from_reader(input, 80).unwrap();
        assert_eq!(list.len(), 3);

        let mut pool = list.pool();
        let mut rng = StdRng::seed_from_u64(7);
        let mut drawn = HashSet::new();
        while let Some(word) = pool.draw(&mut rng) {
            drawn.insert(word);
        }
        assert_eq!(
            drawn,
            ["CAT", "DOG", "ICE CREAM"]
                .into_iter()
                .map(String::from)
                .collect()
        );
    }

    #[test]
    fn space_only_lines_are_skipped() {
        let input = Cursor::new("   \nCAT\n \t \n");
        let list = WordList::from_reader(input, 80).unwrap();
        assert_eq!(list.len(), 1);

        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(list.pool().draw(&mut rng).unwrap(), "CAT");
    }

    #[test]
    fn empty_input_is_an_error() {
        let input = Cursor::new("\n \n123\n");
        assert!(matches!(
            WordList::from_reader(input, 80),
            Err(WordsError::Empty)
        ));
    }

    #[test]
    fn oversized_word_aborts_load() {
        let long = "A".repeat(81);
        let input = Cursor::new(format!("CAT\n{long}\n"));
        assert!(matches!(
            WordList::from_reader(input, 80),
            Err(WordsError::TooLong { len: 81, .. })
        ));
    }

    #[test]
    fn draws_never_repeat_and_exhaust() {
        let input = Cursor::new("ONE\nTWO\nTHREE\nFOUR\n");
        let list = WordList::from_reader(input, 80).unwrap();
        let mut pool = list.pool();
        let mut rng = StdRng::seed_from_u64(42);

        let mut seen = HashSet::new();
        for remaining in (0..4).rev() {
            let word = pool.draw(&mut rng).unwrap();
            assert!(seen.insert(word), "word drawn twice");
            assert_eq!(pool.remaining(), remaining);
        }
        assert!(pool.draw(&mut rng).is_none());
    }

    #[test]
    fn pools_are_independent_per_session() {
        let list = WordList::from_reader(Cursor::new("CAT\n"), 80).unwrap();
        let mut first = list.pool();
        let second = list.pool();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(first.draw(&mut rng).is_some());
        assert_eq!(first.remaining(), 0);
        assert_eq!(second.remaining(), 1);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "alpha\nbeta\n").unwrap();

        let list = WordList::from_path(&path, 80).unwrap();
        assert_eq!(list.len(), 2);
    }
}
