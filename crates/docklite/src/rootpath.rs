use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use libdocklite::utils::create_dir_all_with_mode;
use nix::sys::stat::Mode;
use nix::unistd::getuid;

/// Resolves the directory holding all docklite data: `--root`, then
/// `$PREFIX/var/docklite` (set by Termux and similar prefixes), then
/// `$HOME/.local/var/docklite`, then `/tmp/docklite-<uid>`.
pub fn determine(root_path: Option<PathBuf>) -> Result<PathBuf> {
    let uid = getuid().as_raw();

    if let Some(path) = root_path {
        if !path.exists() {
            create_dir_all_with_mode(&path, uid, Mode::S_IRWXU)?;
        }
        let path = path.canonicalize()?;
        return Ok(path);
    }

    if let Ok(prefix) = std::env::var("PREFIX") {
        let path = Path::new(&prefix).join("var/docklite");
        if create_dir_all_with_mode(&path, uid, Mode::S_IRWXU).is_ok() {
            return Ok(path);
        }
    }

    if let Ok(path) = std::env::var("HOME") {
        if let Ok(resolved) = fs::canonicalize(path) {
            let data_dir = resolved.join(".local/var/docklite");
            if create_dir_all_with_mode(&data_dir, uid, Mode::S_IRWXU).is_ok() {
                return Ok(data_dir);
            }
        }
    }

    let tmp_dir = PathBuf::from(format!("/tmp/docklite-{uid}"));
    if create_dir_all_with_mode(&tmp_dir, uid, Mode::S_IRWXU).is_ok() {
        return Ok(tmp_dir);
    }

    bail!("could not find a storage location with suitable permissions for the current user");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    use anyhow::{Context, Result};
    use serial_test::serial;

    use super::*;

    fn restore_var(key: &'static str) -> impl Drop {
        let saved = std::env::var_os(key);
        scopeguard::guard(saved, move |saved| match saved {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        })
    }

    #[test]
    fn test_user_specified() -> Result<()> {
        // A missing path is created and returned in absolute form.
        let tmp = tempfile::tempdir()?;
        let specified_path = tmp.path().join("provided_path");
        let non_abs_path = specified_path.join("../provided_path");
        let path = determine(Some(non_abs_path)).context("failed with specified path")?;
        assert_eq!(path, specified_path.canonicalize()?);
        Ok(())
    }

    #[test]
    fn test_user_specified_exists() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let specified_path = tmp.path().join("provided_path");
        fs::create_dir(&specified_path).context("failed to create dir")?;
        let non_abs_path = specified_path.join("../provided_path");
        let path = determine(Some(non_abs_path)).context("failed with specified path")?;
        assert_eq!(path, specified_path.canonicalize()?);
        Ok(())
    }

    #[test]
    #[serial]
    fn test_prefix_then_home() -> Result<()> {
        let _prefix = restore_var("PREFIX");
        let _home = restore_var("HOME");

        let tmp = tempfile::tempdir()?;
        let prefix = tmp.path().join("usr");
        std::env::set_var("PREFIX", &prefix);
        let path = determine(None).context("failed with $PREFIX path")?;
        assert_eq!(path, prefix.join("var/docklite"));
        assert!(path.is_dir());
        let mode = fs::metadata(&path)?.permissions().mode();
        assert_eq!(mode & 0o777, 0o700);

        // an unusable prefix falls through to HOME
        let blocked = tmp.path().join("blocked");
        fs::create_dir(&blocked)?;
        fs::set_permissions(&blocked, Permissions::from_mode(0o500))?;
        std::env::set_var("PREFIX", &blocked);
        let home = tmp.path().join("home");
        fs::create_dir(&home)?;
        std::env::set_var("HOME", &home);
        let path = determine(None).context("failed with $HOME path")?;
        if nix::unistd::getuid().is_root() {
            // root ignores the directory permissions
            assert_eq!(path, blocked.join("var/docklite"));
        } else {
            assert_eq!(path, home.canonicalize()?.join(".local/var/docklite"));
        }
        Ok(())
    }

    #[test]
    #[serial]
    fn test_home_without_prefix() -> Result<()> {
        let _prefix = restore_var("PREFIX");
        let _home = restore_var("HOME");

        let tmp = tempfile::tempdir()?;
        std::env::remove_var("PREFIX");
        std::env::set_var("HOME", tmp.path());
        let path = determine(None).context("failed with $HOME path")?;
        assert_eq!(path, tmp.path().canonicalize()?.join(".local/var/docklite"));
        Ok(())
    }
}
