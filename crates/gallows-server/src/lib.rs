//! Server side of the gallows shared-memory protocol.
//!
//! The server owns the session table: one [`session::Session`] per
//! connected client, each with a private word pool and the game in
//! progress. The [`server::Server`] context ties the table to the
//! shared mailbox and semaphore triad and runs the dispatch loop:
//! wait for a pending request, resolve the session, mutate its game,
//! write the reply, signal the waiting client.

use thiserror::Error;

pub mod game;
pub mod server;
pub mod session;

pub use game::Game;
pub use server::Server;
pub use session::{Dispatch, Session, SessionTable};

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that terminate the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Shared memory or semaphore failure.
    #[error(transparent)]
    Ipc(#[from] gallows_ipc::IpcError),

    /// Mailbox encode/decode failure.
    #[error(transparent)]
    Protocol(#[from] gallows_protocol::ProtocolError),

    /// Dictionary loading failure.
    #[error(transparent)]
    Words(#[from] gallows_words::WordsError),

    /// A request named a client id with no live session.
    ///
    /// Clients only ever send ids the server assigned, so this is a
    /// protocol violation, not a recoverable condition.
    #[error("no session for client id {0} (protocol violation)")]
    UnknownClient(i32),
}
