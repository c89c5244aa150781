//! Handles the creation of a new container
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use libdocklite::config::ContainerConfig;
use libdocklite::container::{Container, ContainerRegistry};

/// Create a container from a config file without starting it
#[derive(Parser, Debug)]
pub struct Create {
    /// Path to the container config file
    #[clap(required = true)]
    pub config: PathBuf,
}

pub(super) fn create_container(config_path: &Path, root_path: &Path) -> Result<Container> {
    let config = ContainerConfig::load(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    ContainerRegistry::new(root_path)
        .create(&config)
        .with_context(|| format!("failed to create container {}", config.name))
}

pub fn create(args: Create, root_path: PathBuf) -> Result<()> {
    let container = create_container(&args.config, &root_path)?;
    println!("{}", container.id());
    Ok(())
}
