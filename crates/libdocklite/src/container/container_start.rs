use nix::unistd::Pid;

use super::{Container, ContainerStatus};
use crate::error::LibdockliteError;
use crate::supervisor::Supervisor;

impl Container {
    /// Starts a created or stopped container through `supervisor`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use libdocklite::container::ContainerRegistry;
    /// use libdocklite::supervisor::create_supervisor;
    ///
    /// # fn main() -> Result<(), libdocklite::error::LibdockliteError> {
    /// let registry = ContainerRegistry::new("/var/docklite");
    /// let mut container = registry.get("74f1a4cb3801")?;
    /// container.start(create_supervisor("proot").as_ref())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn start(&mut self, supervisor: &dyn Supervisor) -> Result<Pid, LibdockliteError> {
        let _lock = self.lock()?;
        self.refresh_state()?;
        self.refresh_status();

        if !self.can_start() {
            tracing::error!(status = ?self.status(), id = ?self.id(), "cannot start container");
            return Err(LibdockliteError::InvalidStatus {
                id: self.id().to_owned(),
                action: "started",
                status: self.status(),
            });
        }

        let pid = supervisor.start(self)?;
        self.set_pid(pid.as_raw())
            .set_status(ContainerStatus::Running)
            .save()?;
        tracing::debug!(id = self.id(), %pid, "container started");

        Ok(pid)
    }
}
