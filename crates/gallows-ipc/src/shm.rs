//! Shared memory mapping for the mailbox record.
//!
//! Uses POSIX `shm_open` for the shared memory object and `mmap` to
//! map it into the process address space. Permissions are owner-only
//! (0600). The server creates and sizes the object; clients open an
//! existing one and fail with a "start the server first" error when
//! it is absent.

use std::ffi::CString;
use std::os::unix::io::RawFd;
use std::{ptr, slice};

use libc::{
    MAP_SHARED, O_CREAT, O_RDWR, PROT_READ, PROT_WRITE, S_IRUSR, S_IWUSR, c_uint, c_void, mode_t,
    off_t, size_t,
};
use tracing::{debug, warn};

use gallows_protocol::MAILBOX_SIZE;

use crate::{IpcError, Result};

/// Owning handle to the mapped mailbox region.
///
/// Exactly [`MAILBOX_SIZE`] bytes are mapped. Dropping the handle
/// unmaps the region and closes the descriptor but never unlinks the
/// object; only the creating server calls [`SharedMailbox::unlink`].
#[derive(Debug)]
#[allow(unsafe_code)]
pub struct SharedMailbox {
    fd: RawFd,
    ptr: *mut c_void,
    name: String,
}

impl SharedMailbox {
    /// Create (or reattach to) the shared memory object, server side.
    ///
    /// `O_CREAT` without `O_EXCL`, matching the semaphore triad being
    /// the actual single-instance guard: triad creation fails first
    /// when another server is alive.
    #[allow(unsafe_code)]
    pub fn create(name: &str) -> Result<Self> {
        let c_name = c_name(name)?;

        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                O_CREAT | O_RDWR,
                (S_IRUSR | S_IWUSR) as mode_t as c_uint,
            )
        };
        if fd == -1 {
            return Err(IpcError::os("shm_open", name));
        }

        if unsafe { libc::ftruncate(fd, MAILBOX_SIZE as off_t) } == -1 {
            let err = IpcError::os("ftruncate", name);
            unsafe { libc::close(fd) };
            return Err(err);
        }

        let mapped = Self::map(fd, name)?;
        debug!(name, size = MAILBOX_SIZE, "created shared mailbox");
        Ok(mapped)
    }

    /// Open the existing shared memory object, client side.
    #[allow(unsafe_code)]
    pub fn open(name: &str) -> Result<Self> {
        let c_name = c_name(name)?;

        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                O_RDWR,
                (S_IRUSR | S_IWUSR) as mode_t as c_uint,
            )
        };
        if fd == -1 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ENOENT) {
                return Err(IpcError::ServerNotRunning(name.to_string()));
            }
            return Err(IpcError::Os {
                call: "shm_open",
                name: name.to_string(),
                source: err,
            });
        }

        let mapped = Self::map(fd, name)?;
        debug!(name, "opened shared mailbox");
        Ok(mapped)
    }

    #[allow(unsafe_code)]
    fn map(fd: RawFd, name: &str) -> Result<Self> {
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                MAILBOX_SIZE as size_t,
                PROT_READ | PROT_WRITE,
                MAP_SHARED,
                fd,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            let err = IpcError::os("mmap", name);
            unsafe { libc::close(fd) };
            return Err(err);
        }
        Ok(Self {
            fd,
            ptr,
            name: name.to_string(),
        })
    }

    /// The mailbox bytes, shared view.
    ///
    /// Callers must hold the gate semaphore; the mapping itself
    /// carries no synchronization.
    #[allow(unsafe_code)]
    pub fn bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.cast::<u8>(), MAILBOX_SIZE) }
    }

    /// The mailbox bytes, mutable view. Same gate requirement.
    #[allow(unsafe_code)]
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.ptr.cast::<u8>(), MAILBOX_SIZE) }
    }

    /// The POSIX object name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remove the shared memory object from the system, server only.
    ///
    /// Existing mappings stay valid until the last process unmaps.
    #[allow(unsafe_code)]
    pub fn unlink(&self) -> Result<()> {
        let c_name = c_name(&self.name)?;
        if unsafe { libc::shm_unlink(c_name.as_ptr()) } == -1 {
            return Err(IpcError::os("shm_unlink", &self.name));
        }
        debug!(name = %self.name, "unlinked shared mailbox");
        Ok(())
    }
}

impl Drop for SharedMailbox {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        unsafe {
            if libc::munmap(self.ptr, MAILBOX_SIZE as size_t) == -1 {
                warn!(name = %self.name, "munmap failed during teardown");
            }
            if libc::close(self.fd) == -1 {
                warn!(name = %self.name, "close failed during teardown");
            }
        }
    }
}

// SAFETY: the fd is an integer handle and the pointer targets an
// OS-managed shared mapping; moving the handle between threads is
// fine. Concurrent access is serialized by the gate semaphore.
#[allow(unsafe_code)]
unsafe impl Send for SharedMailbox {}

fn c_name(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| IpcError::BadName(name.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unique_name(tag: &str) -> String {
        format!("/gallows-test-{tag}-{}", std::process::id())
    }

    #[test]
    fn create_write_open_read() {
        let name = unique_name("shm");
        let Ok(mut writer) = SharedMailbox::create(&name) else {
            // shm_open may be unavailable in minimal containers
            eprintln!("skipping shm test (no shared memory available)");
            return;
        };

        writer.bytes_mut()[0] = 0x42;
        writer.bytes_mut()[MAILBOX_SIZE - 1] = 0x99;

        let reader = SharedMailbox::open(&name).unwrap();
        assert_eq!(reader.bytes()[0], 0x42);
        assert_eq!(reader.bytes()[MAILBOX_SIZE - 1], 0x99);

        writer.unlink().unwrap();
    }

    #[test]
    fn open_without_server_fails_clearly() {
        let name = unique_name("absent");
        match SharedMailbox::open(&name) {
            Err(IpcError::ServerNotRunning(n)) => assert_eq!(n, name),
            other => panic!("expected ServerNotRunning, got {other:?}"),
        }
    }
}
