use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use libdocklite::container::ContainerRegistry;

/// Remove a container, stopping it first if it is running
#[derive(Parser, Debug)]
pub struct Rm {
    #[clap(value_parser = clap::builder::NonEmptyStringValueParser::new(), required = true)]
    pub container_id: String,
}

pub fn rm(args: Rm, root_path: PathBuf) -> Result<()> {
    tracing::debug!("start removing {}", args.container_id);
    ContainerRegistry::new(root_path)
        .remove(&args.container_id)
        .with_context(|| format!("failed to remove container {}", args.container_id))
}
