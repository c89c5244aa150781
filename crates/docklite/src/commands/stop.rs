use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::commands::load_container;

/// Stop a running container, killing it after a grace period
#[derive(Parser, Debug)]
pub struct Stop {
    #[clap(value_parser = clap::builder::NonEmptyStringValueParser::new(), required = true)]
    pub container_id: String,
}

pub fn stop(args: Stop, root_path: PathBuf) -> Result<()> {
    let mut container = load_container(root_path, &args.container_id)?;
    container
        .stop()
        .with_context(|| format!("failed to stop container {}", args.container_id))
}
