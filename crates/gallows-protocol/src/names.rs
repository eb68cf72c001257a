//! Fixed POSIX object names shared by server and clients.
//!
//! Every process derives the same four names from a common prefix:
//! one shared memory object and the three semaphores of the triad.
//! The default prefix is `gallows`; tests and parallel deployments
//! override it to keep instances apart.

use crate::{ProtocolError, Result};

/// Default name prefix for all shared objects.
pub const DEFAULT_PREFIX: &str = "gallows";

/// POSIX names derived from a common prefix.
///
/// POSIX shm and semaphore names must start with `/` and stay well
/// under the 255 byte name limit; the prefix is restricted to ASCII
/// alphanumerics and dashes to guarantee both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    /// Shared memory object holding the mailbox record.
    pub mailbox: String,
    /// Single-admission gate semaphore (initial value 1).
    pub gate: String,
    /// Request-pending semaphore (initial value 0).
    pub request: String,
    /// Response-ready semaphore (initial value 0).
    pub response: String,
}

impl ResourceNames {
    /// Derive the object names from a prefix.
    pub fn with_prefix(prefix: &str) -> Result<Self> {
        if prefix.is_empty()
            || prefix.len() > 64
            || !prefix.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(ProtocolError::InvalidName(prefix.to_string()));
        }
        Ok(Self {
            mailbox: format!("/{prefix}-mailbox"),
            gate: format!("/{prefix}-gate"),
            request: format!("/{prefix}-request"),
            response: format!("/{prefix}-response"),
        })
    }
}

impl Default for ResourceNames {
    fn default() -> Self {
        // The default prefix always validates.
        Self::with_prefix(DEFAULT_PREFIX).unwrap_or_else(|_| unreachable!())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_names() {
        let names = ResourceNames::default();
        assert_eq!(names.mailbox, "/gallows-mailbox");
        assert_eq!(names.gate, "/gallows-gate");
        assert_eq!(names.request, "/gallows-request");
        assert_eq!(names.response, "/gallows-response");
    }

    #[test]
    fn prefix_is_validated() {
        assert!(ResourceNames::with_prefix("").is_err());
        assert!(ResourceNames::with_prefix("has space").is_err());
        assert!(ResourceNames::with_prefix("slash/y").is_err());
        assert!(ResourceNames::with_prefix(&"x".repeat(65)).is_err());
        assert!(ResourceNames::with_prefix("test-42").is_ok());
    }
}
