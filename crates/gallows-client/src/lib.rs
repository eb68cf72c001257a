//! Client side of the gallows shared-memory protocol.
//!
//! [`Connection`] performs one mailbox transaction per call, honoring
//! the gate ordering contract; [`ClientSession`] tracks the local
//! state machine (tried letters, win/loss tallies, game status) and
//! validates guesses before any IPC happens; [`gallows::render`]
//! draws the scaffold for an error count.

use thiserror::Error;

pub mod connection;
pub mod gallows;
pub mod session;

pub use connection::Connection;
pub use session::{ClientSession, GuessRejection};

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that terminate the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Shared memory or semaphore failure.
    #[error(transparent)]
    Ipc(#[from] gallows_ipc::IpcError),

    /// Mailbox encode/decode failure.
    #[error(transparent)]
    Protocol(#[from] gallows_protocol::ProtocolError),

    /// The server broadcast termination; the client must exit.
    #[error("the server is shutting down")]
    RemoteShutdown,

    /// Console I/O failure.
    #[error("console I/O error: {0}")]
    Io(#[from] std::io::Error),
}
