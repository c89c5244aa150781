//! Contains Functionality of list container command
use std::fmt::Write as _;
use std::io;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::Parser;
use libdocklite::container::{Container, ContainerRegistry};
use tabwriter::TabWriter;

const SHORT_ID_LEN: usize = 12;

/// List containers, only running ones unless --all is given
#[derive(Parser, Debug)]
pub struct Ps {
    /// Show stopped and created containers too
    #[clap(short, long)]
    pub all: bool,
    /// Only print full container ids
    #[clap(short, long)]
    pub quiet: bool,
}

pub fn ps(args: Ps, root_path: PathBuf) -> Result<()> {
    let containers = ContainerRegistry::new(root_path).list(args.all)?;

    if args.quiet {
        for container in &containers {
            println!("{}", container.id());
        }
        return Ok(());
    }

    let mut tab_writer = TabWriter::new(io::stdout());
    writeln!(&mut tab_writer, "ID\tNAME\tSTATUS\tPID\tCREATED")?;
    write!(&mut tab_writer, "{}", render(&containers))?;
    tab_writer.flush()?;

    Ok(())
}

fn render(containers: &[Container]) -> String {
    let mut content = String::new();
    for container in containers {
        let pid = if let Some(pid) = container.pid() {
            pid.to_string()
        } else {
            "".to_owned()
        };

        let created = if let Some(utc) = container.created() {
            let local: DateTime<Local> = DateTime::from(utc);
            local.to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
        } else {
            "".to_owned()
        };

        let _ = writeln!(
            content,
            "{}\t{}\t{}\t{}\t{}",
            short_id(container.id()),
            container.name(),
            container.status(),
            pid,
            created,
        );
    }
    content
}

fn short_id(id: &str) -> &str {
    id.char_indices()
        .nth(SHORT_ID_LEN)
        .map_or(id, |(end, _)| &id[..end])
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use libdocklite::config::ContainerConfig;
    use libdocklite::container::ContainerStatus;

    use super::*;

    #[test]
    fn test_short_id() {
        assert_eq!(
            short_id("0123456789abcdef0123456789abcdef"),
            "0123456789ab"
        );
        assert_eq!(short_id("web"), "web");
    }

    #[test]
    fn test_render() {
        let config = ContainerConfig {
            name: "web".to_owned(),
            ..Default::default()
        };
        let mut container = Container::new(
            "0123456789abcdef0123456789abcdef",
            &config,
            Path::new("/tmp/docklite/containers/0123456789abcdef0123456789abcdef"),
        );
        container.state.created = None;
        container.set_status(ContainerStatus::Running).set_pid(42);

        assert_eq!(
            render(&[container]),
            "0123456789ab\tweb\trunning\t42\t\n"
        );
    }
}
