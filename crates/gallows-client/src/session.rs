//! Local client state machine.
//!
//! States: `New → Open → {Won, Lost, Impossible}`, with `Won`/`Lost`
//! looping back to `New` when the player confirms another round and
//! `Impossible` terminal. All guess validation happens here, before
//! any IPC: malformed or repeated input never reaches the server.

use gallows_protocol::{GameState, Reply, UNREGISTERED};

/// Why a guess was rejected locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessRejection {
    /// The input was not exactly one character.
    NotOneCharacter,
    /// The character is not an ASCII letter.
    NotALetter,
    /// The letter was already tried this round.
    AlreadyTried,
}

impl std::fmt::Display for GuessRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::NotOneCharacter => "please enter exactly one letter",
            Self::NotALetter => "please enter a valid letter",
            Self::AlreadyTried => "you already tried that letter",
        };
        f.write_str(msg)
    }
}

/// The client's view of its own session.
#[derive(Debug)]
pub struct ClientSession {
    client_id: i32,
    status: GameState,
    error_count: u32,
    word: Vec<u8>,
    tried: Vec<u8>,
    wins: u32,
    losses: u32,
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientSession {
    /// A session that has not contacted the server yet.
    pub fn new() -> Self {
        Self {
            client_id: UNREGISTERED,
            status: GameState::New,
            error_count: 0,
            word: Vec::new(),
            tried: Vec::new(),
            wins: 0,
            losses: 0,
        }
    }

    /// Validate player input against this round's tried letters.
    ///
    /// Returns the uppercased letter to guess. Rejections are local;
    /// the caller re-prompts without touching the server.
    pub fn validate_guess(&self, input: &str) -> std::result::Result<u8, GuessRejection> {
        let trimmed = input.trim_end_matches(['\r', '\n']);
        let mut chars = trimmed.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(GuessRejection::NotOneCharacter);
        };
        if !c.is_ascii_alphabetic() {
            return Err(GuessRejection::NotALetter);
        }
        let letter = c.to_ascii_uppercase() as u8;
        if self.tried.contains(&letter) {
            return Err(GuessRejection::AlreadyTried);
        }
        Ok(letter)
    }

    /// Record a validated letter as tried this round.
    pub fn record_guess(&mut self, letter: u8) {
        self.tried.push(letter);
    }

    /// Adopt the server's reply: id on first contact, then status,
    /// error count and obscured word; tallies on a finished game.
    pub fn adopt(&mut self, reply: &Reply) {
        self.client_id = reply.client_id;
        self.status = reply.status;
        self.error_count = reply.error_count;
        self.word = reply.word.clone();
        match reply.status {
            GameState::Won => self.wins += 1,
            GameState::Lost => self.losses += 1,
            _ => {}
        }
    }

    /// Reset round-local state for the next game.
    pub fn begin_round(&mut self) {
        self.status = GameState::New;
        self.error_count = 0;
        self.tried.clear();
        self.word.clear();
    }

    /// Server-assigned id, `UNREGISTERED` before first contact.
    pub const fn client_id(&self) -> i32 {
        self.client_id
    }

    /// Current game status as last reported by the server.
    pub const fn status(&self) -> GameState {
        self.status
    }

    /// Wrong guesses in the current game.
    pub const fn error_count(&self) -> u32 {
        self.error_count
    }

    /// The obscured word as last reported by the server.
    pub fn word(&self) -> String {
        String::from_utf8_lossy(&self.word).into_owned()
    }

    /// The letters tried this round, in order.
    pub fn tried(&self) -> String {
        String::from_utf8_lossy(&self.tried).into_owned()
    }

    /// Games won over the whole session.
    pub const fn wins(&self) -> u32 {
        self.wins
    }

    /// Games lost over the whole session.
    pub const fn losses(&self) -> u32 {
        self.losses
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn reply(status: GameState, word: &[u8], errors: u32) -> Reply {
        Reply {
            client_id: 4,
            status,
            error_count: errors,
            word: word.to_vec(),
        }
    }

    #[test]
    fn validates_single_ascii_letters() {
        let session = ClientSession::new();
        assert_eq!(session.validate_guess("a\n"), Ok(b'A'));
        assert_eq!(session.validate_guess("Q"), Ok(b'Q'));
        assert_eq!(
            session.validate_guess("ab\n"),
            Err(GuessRejection::NotOneCharacter)
        );
        assert_eq!(
            session.validate_guess("\n"),
            Err(GuessRejection::NotOneCharacter)
        );
        assert_eq!(session.validate_guess("4\n"), Err(GuessRejection::NotALetter));
        assert_eq!(session.validate_guess("!\n"), Err(GuessRejection::NotALetter));
    }

    #[test]
    fn duplicate_guesses_are_rejected_locally() {
        let mut session = ClientSession::new();
        let letter = session.validate_guess("e\n").unwrap();
        session.record_guess(letter);
        assert_eq!(
            session.validate_guess("E\n"),
            Err(GuessRejection::AlreadyTried)
        );
        // A fresh round forgets the tried set.
        session.begin_round();
        assert_eq!(session.validate_guess("e\n"), Ok(b'E'));
    }

    #[test]
    fn adopt_tracks_id_and_tallies() {
        let mut session = ClientSession::new();
        assert_eq!(session.client_id(), UNREGISTERED);

        session.adopt(&reply(GameState::Open, b"___", 0));
        assert_eq!(session.client_id(), 4);
        assert_eq!(session.status(), GameState::Open);
        assert_eq!((session.wins(), session.losses()), (0, 0));

        session.adopt(&reply(GameState::Won, b"CAT", 1));
        assert_eq!((session.wins(), session.losses()), (1, 0));

        session.adopt(&reply(GameState::Lost, b"DOG", 9));
        assert_eq!((session.wins(), session.losses()), (1, 1));
        assert_eq!(session.word(), "DOG");
    }
}
