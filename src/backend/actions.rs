use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

/// Ask a process to exit gracefully. Fire-and-forget: the only confirmation
/// is the pid disappearing from a later enumeration.
pub fn terminate(pid: i32) -> nix::Result<()> {
    send(pid, Signal::SIGTERM)
}

/// Forcibly kill a process that ignored SIGTERM.
pub fn force_kill(pid: i32) -> nix::Result<()> {
    send(pid, Signal::SIGKILL)
}

fn send(pid: i32, sig: Signal) -> nix::Result<()> {
    match signal::kill(Pid::from_raw(pid), sig) {
        Ok(()) => {
            log::info!("Sent {:?} to PID {}", sig, pid);
            Ok(())
        }
        Err(e) => {
            log::error!("Failed to send {:?} to PID {}: {}", sig, pid, e);
            Err(e)
        }
    }
}
