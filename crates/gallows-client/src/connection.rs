//! One-transaction-at-a-time mailbox access.
//!
//! Every round trip is exactly one gate acquisition: acquire the
//! gate, check the server-wide terminate flag, write the request,
//! signal request-pending, wait for response-ready, read the reply,
//! release the gate. The gate is held across the whole exchange so
//! no other client can overwrite the mailbox before the reply is
//! consumed.

use tracing::debug;

use gallows_ipc::{IpcError, SemaphoreTriad, SharedMailbox, ShutdownFlag};
use gallows_protocol::{Mailbox, Reply, Request, ResourceNames};

use crate::{ClientError, Result};

/// A client's attachment to the server's shared objects.
pub struct Connection {
    mailbox: SharedMailbox,
    triad: SemaphoreTriad,
}

impl Connection {
    /// Attach to a running server.
    ///
    /// Fails with [`IpcError::ServerNotRunning`] when the shared
    /// objects are absent.
    pub fn open(names: &ResourceNames) -> Result<Self> {
        let mailbox = SharedMailbox::open(&names.mailbox)?;
        let triad = SemaphoreTriad::open(names)?;
        debug!(mailbox = %names.mailbox, "attached to server");
        Ok(Self { mailbox, triad })
    }

    /// Perform one request/response round trip.
    ///
    /// Observing the terminate flag after acquiring the gate means
    /// the server is shutting down: the gate token was posted for
    /// exactly this purpose and is deliberately not returned, and the
    /// call fails with [`ClientError::RemoteShutdown`].
    ///
    /// A cancellation while waiting for the reply releases the gate
    /// and surfaces as [`IpcError::Cancelled`].
    pub fn transact(&mut self, request: &Request, cancel: &ShutdownFlag) -> Result<Reply> {
        self.triad.acquire_gate(cancel)?;

        if Mailbox::terminate_set(self.mailbox.bytes())? {
            return Err(ClientError::RemoteShutdown);
        }

        request.encode(self.mailbox.bytes_mut())?;
        self.triad.signal_request()?;

        if let Err(err) = self.triad.wait_response(cancel) {
            // Shutdown raced with an in-flight request; hand the gate
            // back so nobody else deadlocks and unwind.
            if matches!(err, IpcError::Cancelled) {
                let _ = self.triad.release_gate();
            }
            return Err(err.into());
        }

        let reply = Reply::decode(self.mailbox.bytes());
        self.triad.release_gate()?;
        Ok(reply?)
    }

    /// Tell the server this client is leaving.
    ///
    /// The disconnect request gets no reply and the gate is left for
    /// the server to re-open once the session is torn down. When
    /// `cancel` is already set the gate is only taken if free right
    /// now; otherwise the notification is skipped.
    pub fn disconnect(&mut self, client_id: i32, cancel: &ShutdownFlag) -> Result<()> {
        if cancel.is_set() {
            if !self.triad.try_acquire_gate()? {
                debug!("gate busy during shutdown, skipping disconnect notice");
                return Ok(());
            }
        } else {
            self.triad.acquire_gate(cancel)?;
        }

        if Mailbox::terminate_set(self.mailbox.bytes())? {
            // Server is going down anyway; the consumed token was
            // ours to take.
            return Ok(());
        }

        Request::Disconnect { client_id }.encode(self.mailbox.bytes_mut())?;
        self.triad.signal_request()?;
        debug!(client_id, "disconnect notice sent");
        Ok(())
    }
}
