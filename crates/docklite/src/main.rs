//! # docklite
//! A lightweight rootless container manager. Containers are directories
//! holding a root filesystem, run through a ptrace based sandbox helper.
mod commands;
mod observability;
mod rootpath;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{create, enter, exec, inspect, logs, ps, rm, run, start, stop};

// High-level commandline option definition
// This takes global options as well as individual commands
#[derive(Parser, Debug)]
#[clap(version, author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    #[clap(flatten)]
    global: GlobalOpts,

    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Parser, Debug)]
struct GlobalOpts {
    /// set the log file to write docklite logs to (default is '/dev/stderr')
    #[clap(short, long, overrides_with("log"))]
    log: Option<PathBuf>,
    /// change log level to debug, but the `log-level` flag takes precedence
    #[clap(long)]
    debug: bool,
    /// set the log format ('text' (default), or 'json') (default: "text")
    #[clap(long)]
    log_format: Option<String>,
    /// set the log level (default is 'error')
    #[clap(long)]
    log_level: Option<String>,
    /// root directory to store containers
    #[clap(short, long)]
    root: Option<PathBuf>,
    /// sandbox helper used to run container processes
    #[clap(long, env = "DOCKLITE_HELPER", default_value = "proot")]
    helper: String,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    Run(run::Run),
    Create(create::Create),
    Start(start::Start),
    Stop(stop::Stop),
    Ps(ps::Ps),
    Rm(rm::Rm),
    Logs(logs::Logs),
    Exec(exec::Exec),
    Enter(enter::Enter),
    Inspect(inspect::Inspect),
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    if let Err(e) = observability::init(&opts) {
        eprintln!("log init failed: {e:?}");
    }

    tracing::debug!(
        "started by user {} with {:?}",
        nix::unistd::geteuid(),
        std::env::args_os()
    );
    let root_path = rootpath::determine(opts.global.root)?;
    let helper = opts.global.helper;

    match opts.subcmd {
        SubCommand::Run(args) => run::run(args, root_path, &helper),
        SubCommand::Create(args) => create::create(args, root_path),
        SubCommand::Start(args) => start::start(args, root_path, &helper),
        SubCommand::Stop(args) => stop::stop(args, root_path),
        SubCommand::Ps(args) => ps::ps(args, root_path),
        SubCommand::Rm(args) => rm::rm(args, root_path),
        SubCommand::Logs(args) => logs::logs(args, root_path),
        SubCommand::Exec(args) => exec::exec(args, root_path, &helper),
        SubCommand::Enter(args) => enter::enter(args, root_path, &helper),
        SubCommand::Inspect(args) => inspect::inspect(args, root_path),
    }
}
