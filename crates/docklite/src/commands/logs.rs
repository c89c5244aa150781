use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::commands::load_container;

/// Print the output captured from a container's main process
#[derive(Parser, Debug)]
pub struct Logs {
    #[clap(value_parser = clap::builder::NonEmptyStringValueParser::new(), required = true)]
    pub container_id: String,
}

pub fn logs(args: Logs, root_path: PathBuf) -> Result<()> {
    let container = load_container(root_path, &args.container_id)?;
    let log_path = container.log_path();
    let mut log = File::open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;
    io::copy(&mut log, &mut io::stdout().lock())?;
    Ok(())
}
