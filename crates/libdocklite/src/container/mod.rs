//! Container management
//! A container is a directory under the containers root named by its id. It
//! holds the persisted state record, the rootfs presented as `/` by the
//! sandbox helper and the log of the supervised process.
#[allow(clippy::module_inception)]
mod container;
mod container_delete;
mod container_start;
mod container_stop;
pub mod lock;
pub mod registry;
pub mod state;
pub use container::Container;
pub use container_stop::STOP_GRACE_PERIOD;
pub use registry::ContainerRegistry;
pub use state::{ContainerStatus, State};
