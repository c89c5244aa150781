//! Lookup and enumeration of the containers kept under one docklite root
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::lock::StateLock;
use super::{Container, ContainerStatus, State};
use crate::config::ContainerConfig;
use crate::error::LibdockliteError;

type Result<T> = std::result::Result<T, LibdockliteError>;

/// Returns a random 128-bit id rendered as 32 lowercase hex characters.
pub fn generate_id() -> String {
    format!("{:032x}", fastrand::u128(..))
}

fn validate_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(LibdockliteError::InvalidId(id.to_owned()))
    }
}

#[derive(Debug, Clone)]
pub struct ContainerRegistry {
    containers_dir: PathBuf,
}

impl ContainerRegistry {
    const CONTAINERS_PATH: &'static str = "containers";

    pub fn new<P: Into<PathBuf>>(root_path: P) -> Self {
        Self {
            containers_dir: root_path.into().join(Self::CONTAINERS_PATH),
        }
    }

    pub fn containers_dir(&self) -> &Path {
        &self.containers_dir
    }

    fn container_root(&self, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self.containers_dir.join(id))
    }

    /// Creates a container with a freshly generated id.
    pub fn create(&self, config: &ContainerConfig) -> Result<Container> {
        self.create_with_id(&generate_id(), config)
    }

    /// Creates the directory tree and initial record for `id`. An existing
    /// directory is never reused.
    pub fn create_with_id(&self, id: &str, config: &ContainerConfig) -> Result<Container> {
        let container_root = self.container_root(id)?;
        create_dir(&self.containers_dir, true)?;
        fs::create_dir(&container_root).map_err(|err| {
            if err.kind() == ErrorKind::AlreadyExists {
                tracing::error!(id, "container already exists");
                LibdockliteError::AlreadyExists(id.to_owned())
            } else {
                tracing::error!(?err, path = ?container_root, "failed to create container dir");
                LibdockliteError::CreateDir {
                    path: container_root.to_owned(),
                    source: err,
                }
            }
        })?;

        let container = Container::new(id, config, &container_root);
        create_dir(container.rootfs(), false)?;
        create_dir(&container.logs_dir(), false)?;
        container.save()?;
        tracing::debug!(id, name = container.name(), "container created");

        Ok(container)
    }

    /// Maps `id` to a stored container id. An exact id wins, otherwise `id`
    /// must be the prefix of exactly one container.
    pub fn resolve(&self, id: &str) -> Result<String> {
        let container_root = self.container_root(id)?;
        if State::file_path(&container_root).exists() {
            return Ok(id.to_owned());
        }

        let entries = match fs::read_dir(&self.containers_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(LibdockliteError::NotFound(id.to_owned()))
            }
            Err(err) => return Err(err.into()),
        };
        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with(id) && State::file_path(&entry.path()).exists() {
                matches.push(name);
            }
        }

        match matches.len() {
            0 => {
                tracing::debug!(id, "container record not found");
                Err(LibdockliteError::NotFound(id.to_owned()))
            }
            1 => Ok(matches.remove(0)),
            count => Err(LibdockliteError::AmbiguousId {
                id: id.to_owned(),
                count,
            }),
        }
    }

    /// Loads a container by id or unique id prefix and reconciles its status
    /// with the process table.
    pub fn get(&self, id: &str) -> Result<Container> {
        let id = self.resolve(id)?;
        let container_root = self.containers_dir.join(id);
        let _lock = StateLock::acquire(&container_root)?;
        Container::load(container_root)
    }

    /// Returns the running containers, or every container when
    /// `include_stopped` is set. Records that cannot be read are skipped.
    pub fn list(&self, include_stopped: bool) -> Result<Vec<Container>> {
        let entries = match fs::read_dir(&self.containers_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut containers = Vec::new();
        for entry in entries {
            let container_root = entry?.path();
            let hidden = container_root
                .file_name()
                .and_then(|name| name.to_str())
                .map_or(true, |name| name.starts_with('.'));
            if hidden
                || !container_root.is_dir()
                || !State::file_path(&container_root).exists()
            {
                continue;
            }

            let loaded = StateLock::acquire(&container_root)
                .map_err(LibdockliteError::from)
                .and_then(|_lock| Container::load(container_root.clone()));
            match loaded {
                Ok(container) => {
                    if include_stopped || container.status() == ContainerStatus::Running {
                        containers.push(container);
                    }
                }
                Err(err) => {
                    tracing::warn!(?err, path = ?container_root, "skipping unreadable container")
                }
            }
        }

        Ok(containers)
    }

    /// Stops and deletes a container. Removing an unknown id succeeds.
    pub fn remove(&self, id: &str) -> Result<()> {
        let container_root = self.container_root(id)?;
        if container_root.is_dir() && !State::file_path(&container_root).exists() {
            // directory without a record, left behind by an interrupted create
            return fs::remove_dir_all(&container_root).map_err(|err| {
                LibdockliteError::RemoveDir {
                    path: container_root,
                    source: err,
                }
            });
        }

        match self.get(id) {
            Ok(mut container) => container.delete(),
            Err(LibdockliteError::NotFound(_)) => {
                tracing::debug!(id, "container already removed");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

fn create_dir(path: &Path, recursive: bool) -> Result<()> {
    let res = if recursive {
        fs::create_dir_all(path)
    } else {
        fs::create_dir(path)
    };
    res.map_err(|err| {
        tracing::error!(?err, ?path, "failed to create directory");
        LibdockliteError::CreateDir {
            path: path.to_owned(),
            source: err,
        }
    })
}
