//! Supervisor backed by proot, which remaps the root directory and bind
//! mounts through ptrace so no privileges are needed.
use std::any::Any;
use std::convert::Infallible;
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd};
use std::path::Path;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, AccessFlags, ForkResult, Pid};

use super::{Result, Supervisor, SupervisorError};
use crate::container::Container;

/// Shells looked up inside the rootfs, in order of preference
pub const SHELLS: [&str; 4] = ["/bin/bash", "/bin/sh", "/bin/ash", "/bin/zsh"];
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Picks the first shell from [`SHELLS`] present in `rootfs`. Symlinks are
/// accepted without resolving them since they usually point at absolute
/// paths that only make sense inside the container.
pub fn detect_shell(rootfs: &Path) -> &'static str {
    SHELLS
        .iter()
        .find(|shell| {
            let path = rootfs.join(shell.trim_start_matches('/'));
            match path.symlink_metadata() {
                Ok(meta) if meta.file_type().is_symlink() => true,
                Ok(meta) if meta.is_file() => unistd::access(&path, AccessFlags::X_OK).is_ok(),
                _ => false,
            }
        })
        .copied()
        .unwrap_or(DEFAULT_SHELL)
}

/// Close-on-exec pipe the forked child uses to report a failed exec. A
/// successful exec closes the write end, so the parent reads EOF.
struct ExecPipe {
    reader: File,
    writer: OwnedFd,
}

impl ExecPipe {
    fn new() -> Result<Self> {
        let (rd, wr) = unistd::pipe2(OFlag::O_CLOEXEC)
            .map_err(|errno| SupervisorError::Pipe(errno.into()))?;
        // SAFETY: both descriptors were just created and are owned by nothing else.
        let (reader, writer) = unsafe { (File::from_raw_fd(rd), OwnedFd::from_raw_fd(wr)) };
        Ok(Self { reader, writer })
    }

    fn report(&self, errno: Errno) {
        let _ = unistd::write(self.writer.as_raw_fd(), &(errno as i32).to_be_bytes());
    }

    /// Returns the errno of a failed exec, or `None` once the child has
    /// replaced its image.
    fn wait_exec(self) -> Result<Option<Errno>> {
        let Self { mut reader, writer } = self;
        drop(writer);

        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(SupervisorError::Pipe)?;
        Ok(buf
            .get(..4)
            .and_then(|bytes| bytes.try_into().ok())
            .map(|bytes| Errno::from_i32(i32::from_be_bytes(bytes))))
    }
}

#[derive(Debug, Clone)]
pub struct ProotSupervisor {
    helper: String,
}

impl ProotSupervisor {
    pub fn new(helper: &str) -> Self {
        Self {
            helper: helper.to_owned(),
        }
    }

    /// Builds `helper -r <rootfs> [-w <workdir>] [-b host:ctr ...] program...`
    pub fn helper_args(
        &self,
        container: &Container,
        bind_volumes: bool,
        program: &[String],
    ) -> Vec<String> {
        let mut args = vec![
            self.helper.clone(),
            "-r".to_owned(),
            container.rootfs().display().to_string(),
        ];
        if let Some(workdir) = container.config().workdir() {
            args.extend(["-w".to_owned(), workdir.to_owned()]);
        }
        if bind_volumes {
            for volume in &container.config().volumes {
                args.extend(["-b".to_owned(), volume.to_string()]);
            }
        }
        args.extend_from_slice(program);
        args
    }

    fn spawn(&self, args: &[String], env: &[String], log: Option<&File>) -> Result<Pid> {
        let argv = to_cstrings(args)?;
        let envp = to_cstrings(env)?;
        let pipe = ExecPipe::new()?;

        // SAFETY: the child only calls async-signal-safe functions before exec or _exit.
        match unsafe { unistd::fork() }.map_err(SupervisorError::Fork)? {
            ForkResult::Child => {
                if let Some(log) = log {
                    let fd = log.as_raw_fd();
                    let _ = unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0));
                    if let Err(errno) = unistd::dup2(fd, 1).and_then(|_| unistd::dup2(fd, 2)) {
                        pipe.report(errno);
                        unsafe { nix::libc::_exit(127) };
                    }
                }
                let errno = match unistd::execvpe(&argv[0], &argv, &envp) {
                    Ok(never) => match never {},
                    Err(errno) => errno,
                };
                pipe.report(errno);
                unsafe { nix::libc::_exit(127) }
            }
            ForkResult::Parent { child } => match pipe.wait_exec()? {
                None => Ok(child),
                Some(errno) => {
                    let _ = waitpid(child, None);
                    tracing::error!(helper = %self.helper, %errno, "failed to launch sandbox helper");
                    Err(SupervisorError::Spawn {
                        helper: self.helper.clone(),
                        errno,
                    })
                }
            },
        }
    }
}

impl Supervisor for ProotSupervisor {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn start(&self, container: &Container) -> Result<Pid> {
        let log_path = container.log_path();
        let log = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&log_path)
            .map_err(|err| {
                tracing::error!(path = ?log_path, %err, "failed to open container log");
                SupervisorError::Log {
                    path: log_path.to_owned(),
                    source: err,
                }
            })?;

        let args = self.helper_args(container, true, &program(container));
        tracing::debug!(id = container.id(), ?args, "starting container process");
        let pid = self.spawn(&args, &environment(container), Some(&log))?;
        tracing::info!(id = container.id(), %pid, "container process started");
        Ok(pid)
    }

    fn exec_in(&self, container: &Container, command: &str) -> Result<i32> {
        let program = ["/bin/sh".to_owned(), "-c".to_owned(), command.to_owned()];
        let args = self.helper_args(container, false, &program);
        tracing::debug!(id = container.id(), ?args, "executing in container");
        let pid = self.spawn(&args, &environment(container), None)?;

        loop {
            match waitpid(pid, None) {
                Ok(WaitStatus::Exited(_, code)) => return Ok(code),
                Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(128 + signal as i32),
                Ok(_) | Err(Errno::EINTR) => continue,
                Err(errno) => return Err(SupervisorError::Wait { pid, errno }),
            }
        }
    }

    fn enter_shell(&self, container: &Container) -> Result<Infallible> {
        let shell = detect_shell(container.rootfs()).to_owned();
        let args = self.helper_args(container, true, &[shell]);
        tracing::debug!(id = container.id(), ?args, "entering container");
        let argv = to_cstrings(&args)?;
        let envp = to_cstrings(&environment(container))?;

        unistd::execvpe(&argv[0], &argv, &envp).map_err(|errno| {
            tracing::error!(helper = %self.helper, %errno, "failed to launch sandbox helper");
            SupervisorError::Spawn {
                helper: self.helper.clone(),
                errno,
            }
        })
    }
}

fn program(container: &Container) -> Vec<String> {
    match container.config().command() {
        Some(command) => vec!["/bin/sh".to_owned(), "-c".to_owned(), command.to_owned()],
        None => vec![detect_shell(container.rootfs()).to_owned()],
    }
}

/// The caller's environment with the container's variables layered on top.
fn environment(container: &Container) -> Vec<String> {
    let mut vars: Vec<(String, String)> = std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect();
    for (key, value) in &container.config().env {
        vars.retain(|(k, _)| k != key);
        vars.push((key.clone(), value.clone()));
    }
    vars.into_iter().map(|(k, v)| format!("{k}={v}")).collect()
}

fn to_cstrings<S: AsRef<str>>(items: &[S]) -> Result<Vec<CString>> {
    items
        .iter()
        .map(|item| {
            CString::new(item.as_ref())
                .map_err(|_| SupervisorError::InvalidArgument(item.as_ref().to_owned()))
        })
        .collect()
}
