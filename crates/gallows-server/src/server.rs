//! The server context: shared resources plus the dispatch loop.

use tracing::{debug, error, info, warn};

use gallows_ipc::{IpcError, SemaphoreTriad, SharedMailbox, ShutdownFlag};
use gallows_protocol::{Mailbox, Request, ResourceNames};
use gallows_words::WordList;

use crate::{Dispatch, Result, SessionTable};

/// Everything the server owns: the mapped mailbox, the semaphore
/// triad and the session table.
///
/// Created with [`Server::bootstrap`], driven by [`Server::serve`],
/// torn down by [`Server::shutdown`] which broadcasts termination to
/// every connected client and unlinks the shared objects.
pub struct Server {
    mailbox: SharedMailbox,
    triad: SemaphoreTriad,
    table: SessionTable,
}

impl Server {
    /// Create the shared objects and an empty session table.
    ///
    /// The semaphore triad is created first: its `O_EXCL` semantics
    /// reject a second server instance before the (idempotent)
    /// shared memory creation runs. On a partial failure the objects
    /// created so far are unlinked again.
    pub fn bootstrap(names: &ResourceNames, words: WordList, max_errors: u32) -> Result<Self> {
        let triad = SemaphoreTriad::create(names)?;
        let mut mailbox = match SharedMailbox::create(&names.mailbox) {
            Ok(mailbox) => mailbox,
            Err(err) => {
                triad.unlink_all();
                return Err(err.into());
            }
        };
        mailbox.bytes_mut().fill(0);

        info!(
            mailbox = %names.mailbox,
            words = words.len(),
            max_errors,
            "server ready"
        );
        Ok(Self {
            mailbox,
            triad,
            table: SessionTable::new(words, max_errors),
        })
    }

    /// Run the dispatch loop until cancelled or a fatal error.
    ///
    /// One iteration serves exactly one mailbox transaction: wait
    /// for a pending request, resolve the session, mutate its game,
    /// write the reply, signal the gate-holding client. The server
    /// itself never acquires the gate.
    pub fn serve(&mut self, cancel: &ShutdownFlag) -> Result<()> {
        loop {
            match self.triad.wait_request(cancel) {
                Ok(()) => {}
                Err(IpcError::Cancelled) => {
                    debug!("dispatch loop cancelled");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }

            let request = Request::decode(self.mailbox.bytes())?;
            match self.table.dispatch(&request)? {
                Dispatch::Reply(reply) => {
                    reply.encode(self.mailbox.bytes_mut())?;
                    self.triad.signal_response()?;
                }
                Dispatch::ClientGone => {
                    // The departed client signalled its request and
                    // left without releasing the gate; clear its flag
                    // and re-open the gate on its behalf.
                    Mailbox::clear_terminate(self.mailbox.bytes_mut())?;
                    self.triad.release_gate()?;
                }
            }
        }
    }

    /// Broadcast termination, destroy all sessions, unlink everything.
    ///
    /// The terminate flag is set once; the gate is then posted once
    /// per live session so every blocked client wakes, observes the
    /// flag on its next gate acquisition and exits.
    pub fn shutdown(mut self) {
        if let Err(err) = Mailbox::set_terminate(self.mailbox.bytes_mut()) {
            error!(%err, "failed to set the terminate flag");
        }
        let live = self.table.len();
        for _ in 0..live {
            if let Err(err) = self.triad.release_gate() {
                warn!(%err, "failed to wake a client during shutdown");
            }
        }
        self.table.clear();
        info!(clients = live, "broadcast shutdown");

        self.triad.unlink_all();
        if let Err(err) = self.mailbox.unlink() {
            warn!(%err, "failed to unlink the shared mailbox");
        }
        // Drop unmaps and closes the remaining handles.
    }

    /// Live sessions, for logging and tests.
    pub fn session_count(&self) -> usize {
        self.table.len()
    }
}
