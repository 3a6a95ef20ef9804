//! Exclusive cross-process lock on a vault.
//!
//! The lock lives on a sibling `<vault>.lock` file rather than on the vault
//! itself, because every persist renames a new file over the vault path and
//! a lock held on the old inode would no longer guard anything.
//!
//! On Unix this is `flock(LOCK_EX | LOCK_NB)`, which the kernel releases
//! when the process dies.  Elsewhere an exclusively-created marker file is
//! used and removed on drop.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::errors::{OtpVaultError, Result};

/// Delay between acquisition attempts while the lock is busy.
const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// A held vault lock.  Dropping it releases the lock.
#[derive(Debug)]
pub struct VaultLock {
    path: PathBuf,
    #[cfg_attr(not(unix), allow(dead_code))]
    file: fs::File,
}

impl VaultLock {
    /// Lock file path for a vault file: `<vault>.lock`.
    pub fn path_for(vault_path: &Path) -> PathBuf {
        let mut name = vault_path
            .file_name()
            .unwrap_or_default()
            .to_os_string();
        name.push(".lock");
        vault_path.with_file_name(name)
    }

    /// Acquire the lock for `vault_path`, retrying until `timeout` elapses.
    ///
    /// Fails with `VaultBusy` if another process still holds it.
    pub fn acquire(vault_path: &Path, timeout: Duration) -> Result<Self> {
        let path = Self::path_for(vault_path);
        let deadline = Instant::now() + timeout;

        loop {
            match Self::try_acquire(&path)? {
                Some(lock) => {
                    tracing::debug!(path = %path.display(), "vault lock acquired");
                    return Ok(lock);
                }
                None if Instant::now() >= deadline => {
                    return Err(OtpVaultError::VaultBusy(vault_path.to_path_buf()));
                }
                None => {
                    tracing::debug!(path = %path.display(), "vault lock busy, retrying");
                    thread::sleep(RETRY_INTERVAL);
                }
            }
        }
    }

    /// One non-blocking attempt.  `Ok(None)` means someone else holds it.
    #[cfg(unix)]
    fn try_acquire(path: &Path) -> Result<Option<Self>> {
        use std::os::unix::io::AsRawFd;

        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        // SAFETY: `file` owns a valid open descriptor for the whole call.
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc == 0 {
            return Ok(Some(Self {
                path: path.to_path_buf(),
                file,
            }));
        }

        let err = std::io::Error::last_os_error();
        if err.kind() == std::io::ErrorKind::WouldBlock {
            Ok(None)
        } else {
            Err(err.into())
        }
    }

    #[cfg(not(unix))]
    fn try_acquire(path: &Path) -> Result<Option<Self>> {
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => Ok(Some(Self {
                path: path.to_path_buf(),
                file,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for VaultLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            // SAFETY: the descriptor is still open; closing it afterwards
            // would release the lock anyway.
            unsafe {
                libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
            }
        }

        #[cfg(not(unix))]
        {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_path_is_sibling() {
        let path = Path::new("/home/u/.otpvault/vault.bin");
        assert_eq!(
            VaultLock::path_for(path),
            PathBuf::from("/home/u/.otpvault/vault.bin.lock")
        );
    }

    #[test]
    fn second_acquire_fails_with_busy() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join("vault.bin");

        let _held = VaultLock::acquire(&vault, Duration::from_millis(100)).unwrap();
        let err = VaultLock::acquire(&vault, Duration::from_millis(120)).unwrap_err();
        assert!(matches!(err, OtpVaultError::VaultBusy(_)));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join("vault.bin");

        {
            let _held = VaultLock::acquire(&vault, Duration::from_millis(100)).unwrap();
        }
        assert!(VaultLock::acquire(&vault, Duration::from_millis(100)).is_ok());
    }
}
