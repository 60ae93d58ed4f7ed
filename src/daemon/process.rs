//! Daemon process management
//!
//! Handles detaching from the terminal, PID file management and the
//! redirection of daemon output to the configured log files.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process;

use daemonize::Daemonize;
use tracing::info;

use relogd_core::error::RelogError;

/// Represents a daemon process
pub struct DaemonProcess {
    pid_file: PathBuf,
    owns_pid_file: bool,
}

impl DaemonProcess {
    /// Create a new daemon process manager
    pub fn new(pid_file: PathBuf) -> Self {
        Self {
            pid_file,
            owns_pid_file: false,
        }
    }

    /// Check if a daemon is already running
    pub fn is_running(&self) -> Result<bool, RelogError> {
        if !self.pid_file.exists() {
            return Ok(false);
        }

        let pid = self.get_pid()?;

        match nix::unistd::getpgid(Some(nix::unistd::Pid::from_raw(pid))) {
            Ok(_) => Ok(true),
            Err(nix::errno::Errno::ESRCH) => {
                // Process doesn't exist, clean up PID file
                let _ = fs::remove_file(&self.pid_file);
                Ok(false)
            }
            Err(e) => Err(RelogError::Daemon {
                reason: format!("Failed to check process status: {}", e),
            }),
        }
    }

    /// Get the PID recorded in the PID file
    pub fn get_pid(&self) -> Result<i32, RelogError> {
        let pid_content = fs::read_to_string(&self.pid_file).map_err(|e| RelogError::Daemon {
            reason: format!("Failed to read PID file: {}", e),
        })?;

        pid_content.trim().parse().map_err(|_| RelogError::Daemon {
            reason: "Invalid PID in PID file".to_string(),
        })
    }

    /// Daemonize the current process
    ///
    /// Must run before any async runtime is created. The daemon's stdout
    /// and stderr go to `log` and `err_log` when given.
    pub fn daemonize(&mut self, log: Option<&Path>, err_log: Option<&Path>) -> Result<(), RelogError> {
        if let Some(parent) = self.pid_file.parent() {
            fs::create_dir_all(parent).map_err(|e| RelogError::Daemon {
                reason: format!("Failed to create PID file directory: {}", e),
            })?;
        }

        let working_directory = std::env::current_dir().map_err(|e| RelogError::Daemon {
            reason: format!("Failed to get current directory: {}", e),
        })?;

        let mut daemonize = Daemonize::new()
            .pid_file(&self.pid_file)
            .chown_pid_file(true)
            .working_directory(working_directory)
            .umask(0o027); // Restrictive permissions

        if let Some(path) = log {
            daemonize = daemonize.stdout(open_append(path)?);
        }
        if let Some(path) = err_log {
            daemonize = daemonize.stderr(open_append(path)?);
        }

        daemonize.start().map_err(|e| RelogError::Daemon {
            reason: format!("Failed to daemonize process: {}", e),
        })?;
        self.owns_pid_file = true;

        info!("Successfully daemonized process, PID: {}", process::id());
        Ok(())
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        // Only the daemon that wrote the PID file removes it
        if self.owns_pid_file {
            let _ = fs::remove_file(&self.pid_file);
        }
    }
}

fn open_append(path: &Path) -> Result<File, RelogError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| RelogError::Daemon {
            reason: format!("Failed to open log file {}: {}", path.display(), e),
        })
}

/// Get the default PID file path
pub fn get_default_pid_file() -> PathBuf {
    // Use XDG_RUNTIME_DIR if available, otherwise /tmp
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        Path::new(&runtime_dir).join("relogd.pid")
    } else {
        Path::new("/tmp").join(format!("relogd-{}.pid", nix::unistd::getuid()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_pid_file_is_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let process = DaemonProcess::new(dir.path().join("relogd.pid"));
        assert!(!process.is_running().unwrap());
    }

    #[test]
    fn test_own_pid_is_running() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("relogd.pid");
        fs::write(&pid_file, format!("{}\n", process::id())).unwrap();

        let daemon = DaemonProcess::new(pid_file.clone());
        assert!(daemon.is_running().unwrap());
        assert_eq!(daemon.get_pid().unwrap(), process::id() as i32);

        // a PID file written by someone else survives the manager
        drop(daemon);
        assert!(pid_file.exists());
    }

    #[test]
    fn test_garbage_pid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("relogd.pid");
        fs::write(&pid_file, "not-a-pid").unwrap();

        let daemon = DaemonProcess::new(pid_file);
        assert!(matches!(daemon.is_running(), Err(RelogError::Daemon { .. })));
    }
}
