//! The three-semaphore hand-off of the gallows protocol.
//!
//! - **gate** (initial 1): single-admission lock over the mailbox;
//!   at most one client transacts at a time.
//! - **request** (initial 0): posted by a client after writing its
//!   request, awaited by the server.
//! - **response** (initial 0): posted by the server after writing a
//!   reply, awaited by the client currently holding the gate.
//!
//! Ordering contract: a client acquires the gate, writes, signals
//! request, waits for response, reads, and only then releases the
//! gate. The server never acquires the gate; it re-opens it only on
//! behalf of a client that disconnected without releasing.

use tracing::warn;

use gallows_protocol::ResourceNames;

use crate::{NamedSemaphore, Result, ShutdownFlag};

/// The gate, request-pending and response-ready semaphores.
pub struct SemaphoreTriad {
    gate: NamedSemaphore,
    request: NamedSemaphore,
    response: NamedSemaphore,
}

impl SemaphoreTriad {
    /// Create all three semaphores, server side.
    ///
    /// Fails with `AlreadyRunning` if any of them exists, keeping the
    /// server single-instance. Semaphores this call created before
    /// the failure are unlinked again, so a failed start leaves no
    /// stale names behind (pre-existing objects are left alone).
    pub fn create(names: &ResourceNames) -> Result<Self> {
        let gate = NamedSemaphore::create(&names.gate, 1)?;
        let request = match NamedSemaphore::create(&names.request, 0) {
            Ok(sem) => sem,
            Err(err) => {
                unlink_one(&gate);
                return Err(err);
            }
        };
        let response = match NamedSemaphore::create(&names.response, 0) {
            Ok(sem) => sem,
            Err(err) => {
                unlink_one(&gate);
                unlink_one(&request);
                return Err(err);
            }
        };
        Ok(Self {
            gate,
            request,
            response,
        })
    }

    /// Open all three semaphores, client side.
    pub fn open(names: &ResourceNames) -> Result<Self> {
        Ok(Self {
            gate: NamedSemaphore::open(&names.gate)?,
            request: NamedSemaphore::open(&names.request)?,
            response: NamedSemaphore::open(&names.response)?,
        })
    }

    /// Block until this process is the exclusive mailbox holder.
    pub fn acquire_gate(&self, cancel: &ShutdownFlag) -> Result<()> {
        self.gate.wait(cancel)
    }

    /// Take the gate only if it is free right now.
    ///
    /// Used by a cancelled client that still wants to send its
    /// disconnect notice without blocking further.
    pub fn try_acquire_gate(&self) -> Result<bool> {
        self.gate.try_wait()
    }

    /// Admit the next waiting client. Called by the gate holder.
    pub fn release_gate(&self) -> Result<()> {
        self.gate.post()
    }

    /// Announce a written request to the server.
    pub fn signal_request(&self) -> Result<()> {
        self.request.post()
    }

    /// Server side: block until a request is pending.
    pub fn wait_request(&self, cancel: &ShutdownFlag) -> Result<()> {
        self.request.wait(cancel)
    }

    /// Announce a written reply to the gate-holding client.
    pub fn signal_response(&self) -> Result<()> {
        self.response.post()
    }

    /// Client side: block until the reply is readable.
    pub fn wait_response(&self, cancel: &ShutdownFlag) -> Result<()> {
        self.response.wait(cancel)
    }

    /// Remove all three semaphores from the system, server only.
    ///
    /// Best-effort: failures are logged, not propagated, so teardown
    /// always reaches every object.
    pub fn unlink_all(&self) {
        for sem in [&self.gate, &self.request, &self.response] {
            unlink_one(sem);
        }
    }
}

fn unlink_one(sem: &NamedSemaphore) {
    if let Err(err) = sem.unlink() {
        warn!(name = sem.name(), %err, "failed to unlink semaphore");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gallows_protocol::ResourceNames;

    fn unique_names(tag: &str) -> ResourceNames {
        ResourceNames::with_prefix(&format!("triad-{tag}-{}", std::process::id())).unwrap()
    }

    #[test]
    fn create_open_and_hand_off() {
        let names = unique_names("basic");
        let Ok(server) = SemaphoreTriad::create(&names) else {
            eprintln!("skipping triad test (sem_open unavailable)");
            return;
        };
        let client = SemaphoreTriad::open(&names).unwrap();
        let cancel = ShutdownFlag::new();

        // Gate starts open, request/response start closed.
        client.acquire_gate(&cancel).unwrap();
        client.signal_request().unwrap();
        server.wait_request(&cancel).unwrap();
        server.signal_response().unwrap();
        client.wait_response(&cancel).unwrap();
        client.release_gate().unwrap();

        server.unlink_all();
    }

    #[test]
    fn failed_creation_leaves_no_stale_names() {
        let names = unique_names("partial");
        // A leftover request semaphore makes triad creation fail
        // after the gate was already created.
        let Ok(stale) = NamedSemaphore::create(&names.request, 0) else {
            eprintln!("skipping triad test (sem_open unavailable)");
            return;
        };
        assert!(SemaphoreTriad::create(&names).is_err());
        stale.unlink().unwrap();

        // The failed attempt unlinked its own gate, so a clean
        // environment lets the next start succeed.
        let server = SemaphoreTriad::create(&names).unwrap();
        server.unlink_all();
    }

    #[test]
    fn second_server_is_rejected() {
        let names = unique_names("excl");
        let Ok(server) = SemaphoreTriad::create(&names) else {
            eprintln!("skipping triad test (sem_open unavailable)");
            return;
        };
        assert!(SemaphoreTriad::create(&names).is_err());
        server.unlink_all();
    }
}
