//! Named counting semaphores with cancellable waits.
//!
//! Waits are implemented with `sem_timedwait` on a short tick so the
//! shutdown flag is polled between attempts. `EINTR` and `ETIMEDOUT`
//! are both retried; every other failure is fatal. This keeps the
//! contract of the original protocol (a delivered signal never kills
//! a wait outright) while making cancellation pollable instead of
//! depending on signal delivery semantics.

use std::ffi::CString;
use std::mem::MaybeUninit;

use libc::{O_CREAT, O_EXCL, S_IRUSR, S_IWUSR, c_uint, mode_t};
use tracing::{debug, warn};

use crate::{IpcError, Result, ShutdownFlag};

/// Poll interval for cancellable waits, in nanoseconds.
const WAIT_TICK_NS: libc::c_long = 100_000_000;

/// Owning handle to a named POSIX semaphore.
///
/// Dropping closes the handle. The object itself survives until the
/// creator calls [`NamedSemaphore::unlink`].
#[derive(Debug)]
#[allow(unsafe_code)]
pub struct NamedSemaphore {
    sem: *mut libc::sem_t,
    name: String,
}

impl NamedSemaphore {
    /// Create a semaphore with an initial value, server side.
    ///
    /// `O_EXCL` makes a second creation fail, which is how the server
    /// enforces its single-instance rule.
    #[allow(unsafe_code)]
    pub fn create(name: &str, initial: u32) -> Result<Self> {
        let c_name = c_name(name)?;
        let sem = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                O_CREAT | O_EXCL,
                (S_IRUSR | S_IWUSR) as mode_t as c_uint,
                initial as c_uint,
            )
        };
        if sem == libc::SEM_FAILED {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EEXIST) {
                return Err(IpcError::AlreadyRunning(name.to_string()));
            }
            return Err(IpcError::Os {
                call: "sem_open",
                name: name.to_string(),
                source: err,
            });
        }
        debug!(name, initial, "created semaphore");
        Ok(Self {
            sem,
            name: name.to_string(),
        })
    }

    /// Open an existing semaphore, client side.
    #[allow(unsafe_code)]
    pub fn open(name: &str) -> Result<Self> {
        let c_name = c_name(name)?;
        let sem = unsafe { libc::sem_open(c_name.as_ptr(), 0) };
        if sem == libc::SEM_FAILED {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ENOENT) {
                return Err(IpcError::ServerNotRunning(name.to_string()));
            }
            return Err(IpcError::Os {
                call: "sem_open",
                name: name.to_string(),
                source: err,
            });
        }
        Ok(Self {
            sem,
            name: name.to_string(),
        })
    }

    /// Increment the semaphore, waking one waiter.
    #[allow(unsafe_code)]
    pub fn post(&self) -> Result<()> {
        if unsafe { libc::sem_post(self.sem) } == -1 {
            return Err(IpcError::os("sem_post", &self.name));
        }
        Ok(())
    }

    /// Block until the semaphore admits this caller or `cancel` fires.
    ///
    /// Returns [`IpcError::Cancelled`] once the flag is observed; the
    /// semaphore count is untouched in that case.
    #[allow(unsafe_code)]
    pub fn wait(&self, cancel: &ShutdownFlag) -> Result<()> {
        loop {
            if cancel.is_set() {
                return Err(IpcError::Cancelled);
            }

            let deadline = next_tick()?;
            let rc = unsafe { libc::sem_timedwait(self.sem, &raw const deadline) };
            if rc == 0 {
                return Ok(());
            }

            let err = std::io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::ETIMEDOUT | libc::EINTR) => {}
                _ => {
                    return Err(IpcError::Os {
                        call: "sem_timedwait",
                        name: self.name.clone(),
                        source: err,
                    });
                }
            }
        }
    }

    /// Take the semaphore only if it is immediately available.
    ///
    /// Returns `Ok(false)` when the count is zero.
    #[allow(unsafe_code)]
    pub fn try_wait(&self) -> Result<bool> {
        if unsafe { libc::sem_trywait(self.sem) } == 0 {
            return Ok(true);
        }
        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EAGAIN | libc::EINTR) => Ok(false),
            _ => Err(IpcError::Os {
                call: "sem_trywait",
                name: self.name.clone(),
                source: err,
            }),
        }
    }

    /// The POSIX object name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remove the semaphore from the system, creator only.
    #[allow(unsafe_code)]
    pub fn unlink(&self) -> Result<()> {
        let c_name = c_name(&self.name)?;
        if unsafe { libc::sem_unlink(c_name.as_ptr()) } == -1 {
            return Err(IpcError::os("sem_unlink", &self.name));
        }
        debug!(name = %self.name, "unlinked semaphore");
        Ok(())
    }
}

impl Drop for NamedSemaphore {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        if unsafe { libc::sem_close(self.sem) } == -1 {
            warn!(name = %self.name, "sem_close failed during teardown");
        }
    }
}

// SAFETY: sem_t handles from sem_open are process-wide and the libc
// wait/post entry points are thread-safe.
#[allow(unsafe_code)]
unsafe impl Send for NamedSemaphore {}
#[allow(unsafe_code)]
unsafe impl Sync for NamedSemaphore {}

/// Absolute CLOCK_REALTIME deadline one poll tick from now.
#[allow(unsafe_code)]
fn next_tick() -> Result<libc::timespec> {
    const NANOS_PER_SEC: libc::c_long = 1_000_000_000;

    let mut now = MaybeUninit::<libc::timespec>::uninit();
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, now.as_mut_ptr()) } == -1 {
        return Err(IpcError::os("clock_gettime", "CLOCK_REALTIME"));
    }
    // SAFETY: clock_gettime returned 0, the value is initialized.
    let mut ts = unsafe { now.assume_init() };

    ts.tv_nsec += WAIT_TICK_NS;
    if ts.tv_nsec >= NANOS_PER_SEC {
        ts.tv_sec += 1;
        ts.tv_nsec -= NANOS_PER_SEC;
    }
    Ok(ts)
}

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
    fn post_then_wait_succeeds() {
        let name = unique_name("sem");
        let Ok(sem) = NamedSemaphore::create(&name, 0) else {
            eprintln!("skipping semaphore test (sem_open unavailable)");
            return;
        };

        sem.post().unwrap();
        sem.wait(&ShutdownFlag::new()).unwrap();
        assert!(!sem.try_wait().unwrap());

        sem.unlink().unwrap();
    }

    #[test]
    fn create_twice_reports_running_instance() {
        let name = unique_name("dup");
        let Ok(first) = NamedSemaphore::create(&name, 1) else {
            eprintln!("skipping semaphore test (sem_open unavailable)");
            return;
        };

        match NamedSemaphore::create(&name, 1) {
            Err(IpcError::AlreadyRunning(n)) => assert_eq!(n, name),
            other => panic!("expected AlreadyRunning, got {other:?}"),
        }

        first.unlink().unwrap();
    }

    #[test]
    fn cancelled_flag_aborts_wait() {
        let name = unique_name("cancel");
        let Ok(sem) = NamedSemaphore::create(&name, 0) else {
            eprintln!("skipping semaphore test (sem_open unavailable)");
            return;
        };

        let cancel = ShutdownFlag::new();
        cancel.trigger();
        assert!(matches!(sem.wait(&cancel), Err(IpcError::Cancelled)));

        sem.unlink().unwrap();
    }
}
