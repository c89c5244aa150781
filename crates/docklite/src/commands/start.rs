//! Starts execution of the container

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use libdocklite::supervisor::create_supervisor;

use crate::commands::load_container;

/// Start a created or stopped container
#[derive(Parser, Debug)]
pub struct Start {
    #[clap(value_parser = clap::builder::NonEmptyStringValueParser::new(), required = true)]
    pub container_id: String,
}

pub fn start(args: Start, root_path: PathBuf, helper: &str) -> Result<()> {
    let mut container = load_container(root_path, &args.container_id)?;
    let supervisor = create_supervisor(helper);
    let pid = container
        .start(supervisor.as_ref())
        .with_context(|| format!("failed to start container {}", args.container_id))?;
    tracing::info!(id = %args.container_id, %pid, "container started");
    Ok(())
}
