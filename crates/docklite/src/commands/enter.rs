use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use libdocklite::supervisor::create_supervisor;

use crate::commands::load_container;

/// Replace docklite with an interactive shell inside a container
#[derive(Parser, Debug)]
pub struct Enter {
    #[clap(value_parser = clap::builder::NonEmptyStringValueParser::new(), required = true)]
    pub container_id: String,
}

pub fn enter(args: Enter, root_path: PathBuf, helper: &str) -> Result<()> {
    let container = load_container(root_path, &args.container_id)?;
    let never = create_supervisor(helper)
        .enter_shell(&container)
        .with_context(|| format!("failed to enter container {}", args.container_id))?;
    match never {}
}
