use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use nix::unistd::Pid;

use crate::config::ContainerConfig;
use crate::container::lock::StateLock;
use crate::container::{ContainerStatus, State};
use crate::error::LibdockliteError;
use crate::utils;

/// Structure representing the container data
#[derive(Debug, Clone)]
pub struct Container {
    // State of the container
    pub state: State,
    // Directory holding the record, rootfs and logs of this container
    pub root: PathBuf,
}

impl Container {
    const ROOTFS_PATH: &'static str = "rootfs";
    const LOGS_PATH: &'static str = "logs";
    const LOG_FILE: &'static str = "output.log";

    /// Builds a fresh `created` container rooted at `container_root`. Nothing
    /// is written to disk.
    pub fn new(container_id: &str, config: &ContainerConfig, container_root: &Path) -> Self {
        let state = State::new(
            container_id,
            config,
            container_root.join(Self::ROOTFS_PATH),
        );

        Self {
            state,
            root: container_root.to_path_buf(),
        }
    }

    pub fn id(&self) -> &str {
        &self.state.id
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn can_start(&self) -> bool {
        self.state.status.can_start()
    }

    pub fn rootfs(&self) -> &Path {
        &self.state.rootfs
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(Self::LOGS_PATH)
    }

    pub fn log_path(&self) -> PathBuf {
        self.logs_dir().join(Self::LOG_FILE)
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.state.config
    }

    pub fn pid(&self) -> Option<Pid> {
        self.state.pid.map(Pid::from_raw)
    }

    pub fn set_pid(&mut self, pid: i32) -> &mut Self {
        self.state.pid = Some(pid);
        self
    }

    pub fn clear_pid(&mut self) -> &mut Self {
        self.state.pid = None;
        self
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.state.created
    }

    pub fn status(&self) -> ContainerStatus {
        self.state.status
    }

    pub fn set_status(&mut self, status: ContainerStatus) -> &mut Self {
        self.state.status = status;
        self
    }

    /// Demotes a `running` record whose process is gone to `stopped`.
    /// Returns whether the state changed and needs saving.
    pub fn refresh_status(&mut self) -> bool {
        if self.status() != ContainerStatus::Running {
            return false;
        }

        match self.pid() {
            Some(pid) if utils::is_process_alive(pid) => false,
            pid => {
                tracing::debug!(id = self.id(), ?pid, "container process is gone");
                self.set_status(ContainerStatus::Stopped).clear_pid();
                true
            }
        }
    }

    pub fn refresh_state(&mut self) -> Result<&mut Self, LibdockliteError> {
        let state = State::load(&self.root)?;
        self.state = state;

        Ok(self)
    }

    /// Loads the record in `container_root` and reconciles it with the
    /// process table. A corrected record is written back.
    pub fn load(container_root: PathBuf) -> Result<Self, LibdockliteError> {
        let state = State::load(&container_root)?;
        let mut container = Self {
            state,
            root: container_root,
        };
        if container.refresh_status() {
            container.save()?;
        }
        Ok(container)
    }

    pub fn save(&self) -> Result<(), LibdockliteError> {
        tracing::debug!("Save container status: {:?} in {:?}", self.state, self.root);
        self.state.save(&self.root)?;

        Ok(())
    }

    pub fn lock(&self) -> Result<StateLock, LibdockliteError> {
        Ok(StateLock::acquire(&self.root)?)
    }
}
