//! Launching and waiting for the sandbox helper that runs container
//! processes. The rest of docklite only talks to the [`Supervisor`] trait so
//! unit tests can swap in a recording implementation.

pub mod proot;
#[allow(clippy::module_inception)]
pub mod supervisor;

pub use supervisor::{create_supervisor, Supervisor};

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("failed to launch sandbox helper {helper}: {errno}")]
    Spawn { helper: String, errno: nix::Error },
    #[error("failed to open container log {path:?}")]
    Log {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to fork: {0}")]
    Fork(nix::Error),
    #[error("failed to wait for pid {pid}: {errno}")]
    Wait {
        pid: nix::unistd::Pid,
        errno: nix::Error,
    },
    #[error("failed to create exec status pipe")]
    Pipe(#[source] std::io::Error),
    #[error("argument contains a nul byte: {0:?}")]
    InvalidArgument(String),
}

type Result<T> = std::result::Result<T, SupervisorError>;
