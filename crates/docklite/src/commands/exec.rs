use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use libdocklite::supervisor::create_supervisor;

use crate::commands::load_container;

/// Run a one-shot command inside a container
#[derive(Parser, Debug)]
pub struct Exec {
    #[clap(value_parser = clap::builder::NonEmptyStringValueParser::new(), required = true)]
    pub container_id: String,
    /// Command to run, passed to /bin/sh -c inside the container
    #[clap(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

pub fn exec(args: Exec, root_path: PathBuf, helper: &str) -> Result<()> {
    let container = load_container(root_path, &args.container_id)?;
    let command = args.command.join(" ");
    let exit_code = create_supervisor(helper)
        .exec_in(&container, &command)
        .with_context(|| format!("failed to exec in container {}", args.container_id))?;
    tracing::debug!(exit_code, "exec finished");
    std::process::exit(exit_code)
}
