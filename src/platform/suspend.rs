//! Suspend / resume capability for a running player process.
//!
//! Selected once by [`PlatformResolver::suspend_resume`]; the playback
//! controller always calls through the trait and never checks the platform
//! itself.
//!
//! [`PlatformResolver::suspend_resume`]: super::PlatformResolver::suspend_resume

use std::fmt;
use std::io;

/// Pause and continue a process by PID.
///
/// Signalling a process that has already exited is not an error.
pub trait SuspendResume: Send + Sync + fmt::Debug {
    /// `false` for the unsupported stub; callers report "unsupported"
    /// without changing state.
    fn is_supported(&self) -> bool;

    fn suspend(&self, pid: u32) -> io::Result<()>;

    fn resume(&self, pid: u32) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// SignalSuspend (POSIX)
// ---------------------------------------------------------------------------

/// SIGSTOP / SIGCONT via `nix`.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalSuspend;

#[cfg(unix)]
impl SuspendResume for SignalSuspend {
    fn is_supported(&self) -> bool {
        true
    }

    fn suspend(&self, pid: u32) -> io::Result<()> {
        super::process::send_signal(pid, nix::sys::signal::Signal::SIGSTOP)
    }

    fn resume(&self, pid: u32) -> io::Result<()> {
        super::process::send_signal(pid, nix::sys::signal::Signal::SIGCONT)
    }
}

// ---------------------------------------------------------------------------
// NoSuspend
// ---------------------------------------------------------------------------

/// Stub for platforms without job-control signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSuspend;

impl SuspendResume for NoSuspend {
    fn is_supported(&self) -> bool {
        false
    }

    fn suspend(&self, _pid: u32) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "pause is not supported on this platform",
        ))
    }

    fn resume(&self, _pid: u32) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "resume is not supported on this platform",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_refuses() {
        let stub = NoSuspend;
        assert!(!stub.is_supported());
        assert_eq!(
            stub.suspend(1).unwrap_err().kind(),
            io::ErrorKind::Unsupported
        );
        assert_eq!(stub.resume(1).unwrap_err().kind(), io::ErrorKind::Unsupported);
    }

    #[cfg(unix)]
    #[test]
    fn stop_and_continue_a_live_process() {
        let mut child = std::process::Command::new("sleep")
            .arg("5")
            .spawn()
            .expect("failed to spawn sleep");

        let signals = SignalSuspend;
        signals.suspend(child.id()).expect("SIGSTOP");
        signals.resume(child.id()).expect("SIGCONT");

        child.kill().unwrap();
        child.wait().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn signalling_an_exited_process_is_ok() {
        let mut child = std::process::Command::new("true")
            .spawn()
            .expect("failed to spawn true");
        let pid = child.id();
        child.wait().unwrap();

        assert!(SignalSuspend.suspend(pid).is_ok());
        assert!(SignalSuspend.resume(pid).is_ok());
    }
}
