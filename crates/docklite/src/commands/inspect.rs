use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use libdocklite::container::Container;

use crate::commands::load_container;

/// Show the recorded state of a container
#[derive(Parser, Debug)]
pub struct Inspect {
    #[clap(value_parser = clap::builder::NonEmptyStringValueParser::new(), required = true)]
    pub container_id: String,
    /// Output format ('text' (default), or 'json')
    #[clap(short, long, default_value = "text")]
    pub format: String,
}

pub fn inspect(args: Inspect, root_path: PathBuf) -> Result<()> {
    let container = load_container(root_path, &args.container_id)?;
    match args.format.as_str() {
        "text" => print!("{}", describe(&container)),
        "json" => println!("{}", serde_json::to_string_pretty(&container.state)?),
        unknown => bail!("unknown output format: {}", unknown),
    }
    Ok(())
}

fn describe(container: &Container) -> String {
    let config = container.config();
    let mut out = format!(
        "ID:      {}\nName:    {}\nStatus:  {}\nPID:     {}\nImage:   {}\nCommand: {}\n",
        container.id(),
        container.name(),
        container.status(),
        container.pid().map_or(0, |pid| pid.as_raw()),
        config.image,
        config.command,
    );
    if let Some(workdir) = config.workdir() {
        out.push_str(&format!("Workdir: {workdir}\n"));
    }
    out.push_str(&format!("Rootfs:  {}\n", container.rootfs().display()));
    if let Some(created) = container.created() {
        out.push_str(&format!("Created: {}\n", created.to_rfc3339()));
    }
    for port in &config.ports {
        out.push_str(&format!("Port:    {port}\n"));
    }
    for volume in &config.volumes {
        out.push_str(&format!("Volume:  {volume}\n"));
    }
    for (key, value) in &config.env {
        out.push_str(&format!("Env:     {key}={value}\n"));
    }
    out
}
