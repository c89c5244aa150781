use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use super::{Container, ContainerStatus};
use crate::error::LibdockliteError;
use crate::utils;

/// Time a container gets to exit after SIGTERM before it is killed
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

impl Container {
    /// Stops the container process group. Stopping a container that is not
    /// running only normalizes its record.
    pub fn stop(&mut self) -> Result<(), LibdockliteError> {
        self.stop_with_grace(STOP_GRACE_PERIOD)
    }

    pub(crate) fn stop_with_grace(&mut self, grace: Duration) -> Result<(), LibdockliteError> {
        let _lock = self.lock()?;
        self.refresh_state()?;
        self.refresh_status();

        if !self.status().can_stop() {
            tracing::debug!(id = self.id(), status = %self.status(), "container is not running");
        } else if let Some(pid) = self.pid() {
            tracing::debug!(id = self.id(), %pid, "stopping container");
            send_signal(pid, Signal::SIGTERM);
            if !wait_for_exit(pid, grace) {
                tracing::debug!(id = self.id(), %pid, "grace period expired, killing");
                send_signal(pid, Signal::SIGKILL);
            }
        }

        self.clear_pid()
            .set_status(ContainerStatus::Stopped)
            .save()?;
        Ok(())
    }
}

/// Signals the process group led by `pid`, or `pid` alone when it does not
/// lead a group. A process that is already gone is not an error.
fn send_signal(pid: Pid, sig: Signal) {
    let res = match signal::killpg(pid, sig) {
        Err(Errno::ESRCH) => signal::kill(pid, sig),
        res => res,
    };

    match res {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => tracing::warn!(%pid, ?sig, %err, "failed to signal container process"),
    }
}

fn wait_for_exit(pid: Pid, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    loop {
        if !utils::is_process_alive(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}
