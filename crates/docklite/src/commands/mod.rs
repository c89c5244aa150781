use std::path::Path;

use anyhow::{Context, Result};
use libdocklite::container::{Container, ContainerRegistry};

pub mod create;
pub mod enter;
pub mod exec;
pub mod inspect;
pub mod logs;
pub mod ps;
pub mod rm;
pub mod run;
pub mod start;
pub mod stop;

fn load_container<P: AsRef<Path>>(root_path: P, container_id: &str) -> Result<Container> {
    ContainerRegistry::new(root_path.as_ref())
        .get(container_id)
        .with_context(|| format!("could not load state for container {container_id}"))
}
