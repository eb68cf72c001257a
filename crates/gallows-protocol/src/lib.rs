//! Wire format for the gallows shared-memory protocol.
//!
//! One server process and N client processes exchange requests and
//! responses through a single fixed-layout mailbox record living in a
//! POSIX shared memory object. This crate defines that record: byte
//! offsets, the game-state discriminants, direction-tagged views
//! ([`Request`] and [`Reply`]) over the same bytes, and the fixed
//! resource names shared by server and clients.
//!
//! The mailbox itself carries no synchronization. Callers must hold
//! the gate semaphore (see `gallows-ipc`) before touching the bytes.

use thiserror::Error;

pub mod mailbox;
pub mod names;

pub use mailbox::{GameState, Mailbox, Reply, Request, MAILBOX_SIZE};
pub use names::ResourceNames;

/// Number of wrong guesses tolerated before a game is lost.
pub const MAX_ERRORS: u32 = 8;

/// Maximum word length the mailbox can carry.
pub const MAX_WORD_LENGTH: usize = 80;

/// Sentinel client id meaning "not yet registered".
pub const UNREGISTERED: i32 = -1;

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding mailbox records.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A status discriminant outside the known set.
    #[error("invalid game state discriminant: {0}")]
    InvalidState(u32),

    /// A word longer than the mailbox word field.
    #[error("word of {0} bytes exceeds the {MAX_WORD_LENGTH} byte mailbox field")]
    WordTooLong(usize),

    /// The supplied buffer is smaller than one mailbox record.
    #[error("buffer of {0} bytes is smaller than a {MAILBOX_SIZE} byte mailbox")]
    ShortBuffer(usize),

    /// A resource name prefix that cannot form valid POSIX object names.
    #[error("invalid resource name prefix: {0:?}")]
    InvalidName(String),
}
