use crate::container::lock::LockError;
use crate::container::state::StateError;
use crate::container::ContainerStatus;
use crate::supervisor::SupervisorError;

#[derive(Debug, thiserror::Error)]
pub enum LibdockliteError {
    #[error("container {0} does not exist")]
    NotFound(String),
    #[error("container {0} already exists")]
    AlreadyExists(String),
    #[error("container id prefix {id} matches {count} containers")]
    AmbiguousId { id: String, count: usize },
    #[error("invalid container id: {0:?}")]
    InvalidId(String),
    #[error("{id} could not be {action} because it was {status}")]
    InvalidStatus {
        id: String,
        action: &'static str,
        status: ContainerStatus,
    },
    #[error("failed to create container directory {path:?}")]
    CreateDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove container directory {path:?}")]
    RemoveDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("io error")]
    OtherIO(#[from] std::io::Error),
}
