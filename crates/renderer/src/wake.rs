use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum WakeLockError {
    #[error("wake lock refused: {0}")]
    Refused(#[from] io::Error),
    #[error("wake lock helper exited with {0}")]
    Exited(ExitStatus),
    #[error("wake locks are not supported on this platform")]
    Unsupported,
}

/// Keeps the display from idling while the view is visible.
pub trait WakeLock {
    /// Takes the lock. Acquiring while held is a no-op.
    fn acquire(&mut self) -> Result<(), WakeLockError>;
    /// Drops the lock if held.
    fn release(&mut self);
    /// Whether the lock is still in force. Implementations may notice here
    /// that it was lost and forget it.
    fn is_held(&mut self) -> bool;
}

/// How long a freshly spawned helper must survive before the lock counts.
const HELPER_STARTUP_GRACE: Duration = Duration::from_millis(100);
const HELPER_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub type BoxedWakeLock = Box<dyn WakeLock>;

/// Holds an idle inhibitor by keeping a `systemd-inhibit` child alive.
#[derive(Debug)]
pub struct InhibitWakeLock {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl InhibitWakeLock {
    pub fn new() -> Self {
        Self::with_command(
            "systemd-inhibit",
            [
                "--what=idle",
                "--who=psyche",
                "--why=animated pattern on screen",
                "--mode=block",
                "sleep",
                "infinity",
            ],
        )
    }

    /// Uses an arbitrary long-running command as the inhibitor.
    pub fn with_command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            child: None,
        }
    }
}

impl Default for InhibitWakeLock {
    fn default() -> Self {
        Self::new()
    }
}

impl WakeLock for InhibitWakeLock {
    fn acquire(&mut self) -> Result<(), WakeLockError> {
        if self.is_held() {
            return Ok(());
        }
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(None) => {}
                Ok(Some(status)) => return Err(WakeLockError::Exited(status)),
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(err.into());
                }
            }
            if started.elapsed() >= HELPER_STARTUP_GRACE {
                break;
            }
            thread::sleep(HELPER_POLL_INTERVAL);
        }
        debug!(pid = child.id(), program = %self.program, "wake lock acquired");
        self.child = Some(child);
        Ok(())
    }

    fn release(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Err(err) = child.kill() {
            debug!(error = %err, "wake lock helper already gone");
        }
        if let Err(err) = child.wait() {
            debug!(error = %err, "failed to reap wake lock helper");
        }
        debug!("wake lock released");
    }

    fn is_held(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(%status, "wake lock helper exited");
                self.child = None;
                false
            }
            Err(err) => {
                debug!(error = %err, "failed to poll wake lock helper");
                self.child = None;
                false
            }
        }
    }
}

impl Drop for InhibitWakeLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// The platform's wake lock, if there is one.
pub fn platform_default() -> Option<BoxedWakeLock> {
    if cfg!(target_os = "linux") {
        Some(Box::new(InhibitWakeLock::new()))
    } else {
        None
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn holds_and_releases_child() {
        let mut lock = InhibitWakeLock::with_command("sleep", ["30"]);
        assert!(!lock.is_held());
        lock.acquire().expect("spawn sleep");
        assert!(lock.is_held());
        lock.acquire().expect("second acquire is a no-op");
        lock.release();
        assert!(!lock.is_held());
        lock.release();
    }

    #[test]
    fn missing_helper_is_refused() {
        let mut lock = InhibitWakeLock::with_command("psyche-no-such-helper", Vec::<String>::new());
        let err = lock.acquire().unwrap_err();
        assert!(matches!(err, WakeLockError::Refused(_)));
        assert!(!lock.is_held());
    }

    #[test]
    fn helper_failing_at_startup_is_reported() {
        let mut lock = InhibitWakeLock::with_command("sh", ["-c", "exit 3"]);
        let err = lock.acquire().unwrap_err();
        assert!(matches!(err, WakeLockError::Exited(status) if status.code() == Some(3)));
        assert!(!lock.is_held());
    }

    #[test]
    fn helper_exiting_later_drops_the_lock() {
        let mut lock = InhibitWakeLock::with_command("sh", ["-c", "sleep 0.3; exit 1"]);
        lock.acquire().expect("helper outlives the startup grace");
        assert!(lock.is_held());

        thread::sleep(Duration::from_millis(800));
        assert!(!lock.is_held());

        lock.release();
        assert!(!lock.is_held());
    }
}
