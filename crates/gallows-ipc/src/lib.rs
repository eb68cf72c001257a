//! POSIX IPC primitives for the gallows protocol.
//!
//! Wraps the raw `libc` calls behind owning types: [`SharedMailbox`]
//! maps the shared memory object carrying the mailbox record,
//! [`NamedSemaphore`] and [`SemaphoreTriad`] provide the three-way
//! hand-off (gate, request-pending, response-ready), and
//! [`ShutdownFlag`] turns SIGINT/SIGTERM into a pollable cancellation
//! flag checked by every blocking wait.
//!
//! All teardown is `Drop`-driven: dropping a handle unmaps or closes
//! it. Unlinking the underlying objects is explicit and reserved for
//! the server, which created them.

use thiserror::Error;

pub mod sem;
pub mod shm;
pub mod shutdown;
mod triad;

pub use sem::NamedSemaphore;
pub use shm::SharedMailbox;
pub use shutdown::ShutdownFlag;
pub use triad::SemaphoreTriad;

/// Result type for IPC operations.
pub type Result<T> = std::result::Result<T, IpcError>;

/// Errors raised by shared memory and semaphore operations.
#[derive(Debug, Error)]
pub enum IpcError {
    /// An OS call failed during setup or teardown.
    #[error("{call} failed on {name}: {source}")]
    Os {
        /// The libc call that failed.
        call: &'static str,
        /// The POSIX object name involved.
        name: String,
        /// Errno detail.
        #[source]
        source: std::io::Error,
    },

    /// The shared memory object does not exist yet.
    #[error("no server reachable on {0} (start gallows-server first)")]
    ServerNotRunning(String),

    /// A semaphore with this name already exists.
    #[error("{0} already exists (is another server running?)")]
    AlreadyRunning(String),

    /// A blocking wait was abandoned because shutdown was requested.
    #[error("wait cancelled by shutdown request")]
    Cancelled,

    /// A name that cannot be turned into a C string.
    #[error("object name {0:?} contains an interior NUL byte")]
    BadName(String),
}

impl IpcError {
    pub(crate) fn os(call: &'static str, name: &str) -> Self {
        Self::Os {
            call,
            name: name.to_string(),
            source: std::io::Error::last_os_error(),
        }
    }
}
