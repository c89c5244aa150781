use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use libdocklite::supervisor::{create_supervisor, Supervisor};

use super::create::create_container;

/// Create a container from a config file and start it
#[derive(Parser, Debug)]
pub struct Run {
    /// Path to the container config file
    #[clap(required = true)]
    pub config: PathBuf,
}

pub fn run(args: Run, root_path: PathBuf, helper: &str) -> Result<()> {
    let supervisor = create_supervisor(helper);
    create_and_start(
        &args.config,
        &root_path,
        supervisor.as_ref(),
        &mut io::stdout(),
    )
}

fn create_and_start<W: Write>(
    config_path: &Path,
    root_path: &Path,
    supervisor: &dyn Supervisor,
    out: &mut W,
) -> Result<()> {
    let mut container = create_container(config_path, root_path)?;
    // printed first so a failed start still names the container left behind
    writeln!(out, "{}", container.id())?;
    out.flush()?;
    container
        .start(supervisor)
        .with_context(|| format!("failed to start container {}", container.id()))?;
    Ok(())
}
