//! A single game: secret word, obscured view, guess evaluation.

use gallows_protocol::GameState;

/// Placeholder byte for a not-yet-guessed position.
pub const MASK: u8 = b'_';

/// One game of hangman, owned by exactly one session.
///
/// The obscured buffer always has the same length as the secret;
/// spaces start unmasked, every other position is unmasked exactly
/// once its letter has been guessed.
#[derive(Debug, Clone)]
pub struct Game {
    secret: String,
    obscured: Vec<u8>,
    status: GameState,
    error_count: u32,
}

impl Game {
    /// Start a game over a freshly drawn secret.
    pub fn new(secret: String) -> Self {
        let obscured = secret
            .bytes()
            .map(|b| if b == b' ' { b' ' } else { MASK })
            .collect();
        Self {
            secret,
            obscured,
            status: GameState::Open,
            error_count: 0,
        }
    }

    /// A placeholder for a session that has no game yet.
    ///
    /// Never shown to a client: the session's first request is always
    /// a new-game request, which replaces this wholesale.
    pub fn none() -> Self {
        Self {
            secret: String::new(),
            obscured: Vec::new(),
            status: GameState::New,
            error_count: 0,
        }
    }

    /// Evaluate one guessed letter.
    ///
    /// Every matching position is unmasked; a miss costs one error.
    /// Win detection runs first: a game whose non-space positions are
    /// all unmasked is `Won` regardless of anything else. A miss that
    /// pushes the error count past `max_errors` loses the game and
    /// reveals the full secret.
    ///
    /// Duplicate guesses are not rejected here; the client filters
    /// them, and recomputing the same result is harmless. Once the
    /// game left the `Open` state this is a no-op, so a `Won` game
    /// never accrues errors.
    pub fn apply_guess(&mut self, letter: u8, max_errors: u32) {
        if self.status != GameState::Open {
            return;
        }

        let mut hit = false;
        let mut won = true;
        for (position, secret_byte) in self.secret.bytes().enumerate() {
            if secret_byte == letter {
                self.obscured[position] = letter;
                hit = true;
            }
            won = won && self.obscured[position] != MASK;
        }

        if won {
            self.status = GameState::Won;
            return;
        }
        if hit {
            return;
        }

        self.error_count += 1;
        if self.error_count > max_errors {
            self.status = GameState::Lost;
            self.obscured = self.secret.clone().into_bytes();
        }
    }

    /// Force this game into the pool-exhausted state.
    pub fn mark_impossible(&mut self) {
        self.status = GameState::Impossible;
    }

    /// Current state of the game.
    pub const fn status(&self) -> GameState {
        self.status
    }

    /// Wrong guesses so far.
    pub const fn error_count(&self) -> u32 {
        self.error_count
    }

    /// The partly unmasked word as sent to the client.
    pub fn obscured(&self) -> &[u8] {
        &self.obscured
    }

    #[cfg(test)]
    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MAX: u32 = 8;

    #[test]
    fn new_game_masks_letters_not_spaces() {
        let game = Game::new("ICE CREAM".to_string());
        assert_eq!(game.obscured(), b"___ _____");
        assert_eq!(game.status(), GameState::Open);
        assert_eq!(game.error_count(), 0);
    }

    #[test]
    fn hits_unmask_all_positions() {
        let mut game = Game::new("BANANA".to_string());
        game.apply_guess(b'A', MAX);
        assert_eq!(game.obscured(), b"_A_A_A");
        assert_eq!(game.error_count(), 0);
    }

    #[test]
    fn miss_increments_error_count_only() {
        let mut game = Game::new("CAT".to_string());
        game.apply_guess(b'Z', MAX);
        assert_eq!(game.obscured(), b"___");
        assert_eq!(game.error_count(), 1);
        assert_eq!(game.status(), GameState::Open);
    }

    #[test]
    fn full_guess_sequence_wins() {
        let mut game = Game::new("CAT".to_string());
        for letter in [b'C', b'A', b'T'] {
            game.apply_guess(letter, MAX);
        }
        assert_eq!(game.status(), GameState::Won);
        assert_eq!(game.obscured(), game.secret().as_bytes());
    }

    #[test]
    fn loss_reveals_the_secret() {
        let mut game = Game::new("CAT".to_string());
        for letter in b"BDEFGHIJK" {
            game.apply_guess(*letter, MAX);
        }
        assert_eq!(game.error_count(), 9);
        assert_eq!(game.status(), GameState::Lost);
        assert_eq!(game.obscured(), b"CAT");
    }

    #[test]
    fn loss_happens_exactly_when_count_exceeds_maximum() {
        let mut game = Game::new("CAT".to_string());
        for letter in b"BDEFGHIJ" {
            game.apply_guess(*letter, MAX);
        }
        assert_eq!(game.error_count(), MAX);
        assert_eq!(game.status(), GameState::Open);
        game.apply_guess(b'K', MAX);
        assert_eq!(game.status(), GameState::Lost);
    }

    #[test]
    fn won_game_is_immune_to_further_guesses() {
        let mut game = Game::new("A".to_string());
        game.apply_guess(b'A', MAX);
        assert_eq!(game.status(), GameState::Won);

        game.apply_guess(b'Z', MAX);
        assert_eq!(game.status(), GameState::Won);
        assert_eq!(game.error_count(), 0);
    }

    #[test]
    fn winning_guess_beats_loss_detection() {
        // Last letter guessed while already at the error budget edge.
        let mut game = Game::new("AB".to_string());
        for letter in b"CDEFGHIJ" {
            game.apply_guess(*letter, MAX);
        }
        game.apply_guess(b'A', MAX);
        game.apply_guess(b'B', MAX);
        assert_eq!(game.status(), GameState::Won);
    }

    #[test]
    fn spaces_never_need_guessing() {
        let mut game = Game::new("A B".to_string());
        game.apply_guess(b'A', MAX);
        game.apply_guess(b'B', MAX);
        assert_eq!(game.status(), GameState::Won);
        assert_eq!(game.obscured(), b"A B");
    }
}
