//! Per-client sessions and the dispatch table.

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use gallows_protocol::{Reply, Request, UNREGISTERED};
use gallows_words::{WordList, WordPool};

use crate::{Game, Result, ServerError};

/// One connected client as the server sees it.
#[derive(Debug)]
pub struct Session {
    client_id: i32,
    pool: WordPool,
    games_played: u64,
    game: Game,
}

impl Session {
    fn new(client_id: i32, pool: WordPool) -> Self {
        Self {
            client_id,
            pool,
            games_played: 0,
            game: Game::none(),
        }
    }

    /// Replace the current game with one over a freshly drawn word.
    ///
    /// An exhausted pool marks the session impossible instead; no
    /// word is consumed and `games_played` stays put.
    fn new_game(&mut self, rng: &mut StdRng) {
        match self.pool.draw(rng) {
            Some(secret) => {
                self.games_played += 1;
                self.game = Game::new(secret);
            }
            None => self.game.mark_impossible(),
        }
    }

    fn reply(&self) -> Reply {
        Reply {
            client_id: self.client_id,
            status: self.game.status(),
            error_count: self.game.error_count(),
            word: self.game.obscured().to_vec(),
        }
    }

    /// Games started by this session so far.
    pub const fn games_played(&self) -> u64 {
        self.games_played
    }
}

/// Outcome of dispatching one request.
#[derive(Debug)]
pub enum Dispatch {
    /// A reply to write back into the mailbox.
    Reply(Reply),
    /// The client disconnected; there is no reply, the caller clears
    /// the terminate flag and re-opens the gate on its behalf.
    ClientGone,
}

/// The server's registry of live sessions.
///
/// Private to the server process; the dispatch loop is single
/// threaded, so no locking is involved.
pub struct SessionTable {
    sessions: HashMap<i32, Session>,
    next_id: i32,
    master: WordList,
    max_errors: u32,
    rng: StdRng,
}

impl SessionTable {
    /// A table drawing words from `master`, losing games after
    /// `max_errors` wrong guesses.
    pub fn new(master: WordList, max_errors: u32) -> Self {
        Self::with_rng(master, max_errors, StdRng::from_rng(&mut rand::rng()))
    }

    /// Deterministic variant for tests.
    pub fn with_rng(master: WordList, max_errors: u32, rng: StdRng) -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 0,
            master,
            max_errors,
            rng,
        }
    }

    /// Resolve a request to its session and apply it.
    ///
    /// An unregistered id creates a session with a fresh id and a
    /// private copy of the master word list. An id with no session is
    /// a protocol violation and fatal.
    pub fn dispatch(&mut self, request: &Request) -> Result<Dispatch> {
        match request {
            Request::Disconnect { client_id } => {
                if self.sessions.remove(client_id).is_none() {
                    return Err(ServerError::UnknownClient(*client_id));
                }
                info!(client_id, live = self.sessions.len(), "client disconnected");
                Ok(Dispatch::ClientGone)
            }
            Request::NewGame { client_id } => {
                let id = if *client_id == UNREGISTERED {
                    self.register()
                } else {
                    *client_id
                };
                let session = self
                    .sessions
                    .get_mut(&id)
                    .ok_or(ServerError::UnknownClient(id))?;
                session.new_game(&mut self.rng);
                debug!(
                    client_id = id,
                    status = %session.game.status(),
                    games_played = session.games_played,
                    "new game"
                );
                Ok(Dispatch::Reply(session.reply()))
            }
            Request::Guess { client_id, letter } => {
                let max_errors = self.max_errors;
                let session = self
                    .sessions
                    .get_mut(client_id)
                    .ok_or(ServerError::UnknownClient(*client_id))?;
                session.game.apply_guess(*letter, max_errors);
                debug!(
                    client_id,
                    letter = %(*letter as char),
                    status = %session.game.status(),
                    errors = session.game.error_count(),
                    "guess"
                );
                Ok(Dispatch::Reply(session.reply()))
            }
        }
    }

    fn register(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        self.sessions.insert(id, Session::new(id, self.master.pool()));
        info!(client_id = id, live = self.sessions.len(), "client registered");
        id
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether any session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every session (server shutdown).
    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
