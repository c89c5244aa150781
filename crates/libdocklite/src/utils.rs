//! Utility functionality

use std::fs::DirBuilder;
use std::os::linux::fs::MetadataExt;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use nix::errno::Errno;
use nix::sys::signal;
use nix::sys::stat::Mode;
use nix::unistd::Pid;
use procfs::process::{Process, ProcState};

#[derive(Debug, thiserror::Error)]
pub enum MkdirWithModeError {
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("metadata doesn't match the expected attributes")]
    MetadataMismatch,
}

/// Creates the specified directory and all parent directories with the specified mode. Ensures
/// that the directory has been created with the correct mode and that the owner of the directory
/// is the owner that has been specified
/// # Example
/// ``` no_run
/// use libdocklite::utils::create_dir_all_with_mode;
/// use nix::sys::stat::Mode;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/docklite");
/// create_dir_all_with_mode(&path, 1000, Mode::S_IRWXU).unwrap();
/// assert!(path.exists())
/// ```
pub fn create_dir_all_with_mode<P: AsRef<Path>>(
    path: P,
    owner: u32,
    mode: Mode,
) -> Result<(), MkdirWithModeError> {
    let path = path.as_ref();
    if !path.exists() {
        DirBuilder::new()
            .recursive(true)
            .mode(mode.bits())
            .create(path)?;
    }

    let metadata = path.metadata()?;
    if metadata.is_dir()
        && metadata.st_uid() == owner
        && metadata.st_mode() & mode.bits() == mode.bits()
    {
        Ok(())
    } else {
        Err(MkdirWithModeError::MetadataMismatch)
    }
}

/// Reports whether `pid` names a process that can still do work. Zombies
/// and dead processes count as gone. When procfs cannot be read the check
/// falls back to a null signal.
pub fn is_process_alive(pid: Pid) -> bool {
    if pid.as_raw() <= 0 {
        return false;
    }

    match Process::new(pid.as_raw()).and_then(|p| p.stat()) {
        Ok(stat) => match stat.state() {
            Ok(ProcState::Zombie) | Ok(ProcState::Dead) => false,
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(?pid, %err, "unknown process state, assuming alive");
                true
            }
        },
        Err(err) => {
            tracing::trace!(?pid, %err, "procfs lookup failed, probing with kill");
            !matches!(signal::kill(pid, None), Err(Errno::ESRCH))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::process::Command;

    #[test]
    fn test_create_dir_all_with_mode() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("a/b/c");
        let uid = nix::unistd::getuid().as_raw();
        create_dir_all_with_mode(&path, uid, Mode::S_IRWXU)?;
        assert!(path.is_dir());
        // existing directory is accepted as is
        create_dir_all_with_mode(&path, uid, Mode::S_IRWXU)?;
        Ok(())
    }

    #[test]
    fn test_create_dir_all_with_mode_wrong_owner() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let uid = nix::unistd::getuid().as_raw();
        let result = create_dir_all_with_mode(tmp.path(), uid + 1, Mode::S_IRWXU);
        assert!(matches!(result, Err(MkdirWithModeError::MetadataMismatch)));
        Ok(())
    }

    #[test]
    fn test_is_process_alive() -> Result<()> {
        assert!(is_process_alive(nix::unistd::getpid()));
        assert!(!is_process_alive(Pid::from_raw(0)));
        assert!(!is_process_alive(Pid::from_raw(-1)));

        let mut child = Command::new("true").spawn()?;
        let pid = Pid::from_raw(child.id() as i32);
        // exited but not reaped
        std::thread::sleep(std::time::Duration::from_millis(200));
        assert!(!is_process_alive(pid));
        child.wait()?;
        Ok(())
    }
}
