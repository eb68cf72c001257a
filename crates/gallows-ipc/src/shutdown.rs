//! Cooperative, pollable cancellation.
//!
//! SIGINT and SIGTERM are bridged into an atomic flag via
//! `signal-hook`; blocking waits poll the flag between attempts and
//! unwind through their normal teardown path instead of dying inside
//! a handler.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::debug;

use crate::{IpcError, Result};

/// Shared shutdown-requested flag.
///
/// Clones share the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// A fresh, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown has been requested.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Request shutdown manually (tests and fatal error paths).
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Arrange for SIGINT and SIGTERM to set this flag.
    pub fn install_signal_hooks(&self) -> Result<()> {
        for sig in [SIGINT, SIGTERM] {
            signal_hook::flag::register(sig, Arc::clone(&self.0)).map_err(|source| {
                IpcError::Os {
                    call: "sigaction",
                    name: format!("signal {sig}"),
                    source,
                }
            })?;
        }
        debug!("signal hooks installed for SIGINT/SIGTERM");
        Ok(())
    }
}
