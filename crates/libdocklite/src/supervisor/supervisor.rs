//! An interface trait so that the container lifecycle can launch
//! processes without having to worry about the sandbox helper
use std::any::Any;
use std::convert::Infallible;

use nix::unistd::Pid;

use crate::container::Container;
use crate::supervisor::proot::ProotSupervisor;
use crate::supervisor::Result;

/// Runs container workloads through an external sandbox helper
pub trait Supervisor {
    fn as_any(&self) -> &dyn Any;
    /// Spawns the container's command (or a shell) detached, with output
    /// going to the container log. Returns the process group leader.
    fn start(&self, container: &Container) -> Result<Pid>;
    /// Runs `command` inside the container and waits for its exit status.
    fn exec_in(&self, container: &Container, command: &str) -> Result<i32>;
    /// Replaces the calling process with an interactive shell inside the
    /// container. Returns only on failure.
    fn enter_shell(&self, container: &Container) -> Result<Infallible>;
}

pub fn create_supervisor(helper: &str) -> Box<dyn Supervisor> {
    Box::new(ProotSupervisor::new(helper))
}
