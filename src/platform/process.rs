//! Terminating child processes by PID.
//!
//! The playback worker owns the `Child` handles and blocks until they exit,
//! so the controller can only reach a process through its PID.  Both
//! signalling helpers treat "no such process" as success: the target may
//! exit between the caller's check and the signal.
//!
//! A PID is only safe to signal while its process is unreaped.
//! [`wait_exited`] lets the worker observe the exit, retire the PID from the
//! controller's state, and only then reap.

use std::io;
use std::process::Child;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

#[cfg(unix)]
pub(crate) fn send_signal(pid: u32, sig: Signal) -> io::Result<()> {
    let raw = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    match signal::kill(Pid::from_raw(raw), sig) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(io::Error::other(e)),
    }
}

/// Ask `pid` to exit (SIGTERM on Unix, `taskkill` elsewhere).
pub fn terminate(pid: u32) -> io::Result<()> {
    log::debug!("process: terminate {pid}");

    #[cfg(unix)]
    {
        send_signal(pid, Signal::SIGTERM)
    }

    #[cfg(not(unix))]
    {
        taskkill(pid)
    }
}

/// Kill `pid` without giving it a chance to clean up.
pub fn force_kill(pid: u32) -> io::Result<()> {
    log::debug!("process: kill {pid}");

    #[cfg(unix)]
    {
        send_signal(pid, Signal::SIGKILL)
    }

    #[cfg(not(unix))]
    {
        taskkill(pid)
    }
}

/// Block until `child` has exited, leaving it unreaped so its PID cannot be
/// reused yet.
///
/// Returns `Ok(false)` where the platform has no non-reaping wait; the
/// caller must then poll [`Child::try_wait`] itself.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
pub fn wait_exited(child: &Child) -> io::Result<bool> {
    use nix::sys::wait::{waitid, Id, WaitPidFlag};

    let raw = i32::try_from(child.id())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    loop {
        match waitid(Id::Pid(Pid::from_raw(raw)), WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT) {
            Ok(_) => return Ok(true),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(io::Error::other(e)),
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
pub fn wait_exited(_child: &Child) -> io::Result<bool> {
    Ok(false)
}

#[cfg(not(unix))]
fn taskkill(pid: u32) -> io::Result<()> {
    use std::process::{Command, Stdio};

    // Not waited on: the worker observes the exit through its own handle.
    Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(drop)
}
