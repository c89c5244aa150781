//! Information about status and state of the container
use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::config::{ContainerConfig, Mapping};

/// Indicates status of the container
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    // The container directories and record exist but nothing was started yet
    #[default]
    Created,
    // A supervised process group was spawned and has not been stopped
    Running,
    // The process group was stopped or was found dead
    Stopped,
}

impl ContainerStatus {
    pub fn can_start(&self) -> bool {
        matches!(self, ContainerStatus::Created | ContainerStatus::Stopped)
    }

    pub fn can_stop(&self) -> bool {
        matches!(self, ContainerStatus::Running)
    }
}

impl Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let print = match *self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };

        write!(f, "{print}")
    }
}

impl FromStr for ContainerStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            other => Err(format!("unknown container status {other:?}")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to open container state file {state_file_path:?}")]
    OpenStateFile {
        state_file_path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write container state file {state_file_path:?}")]
    WriteStateFile {
        state_file_path: PathBuf,
        source: std::io::Error,
    },
}

type Result<T> = std::result::Result<T, StateError>;

/// Stores the state information of the container
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    // ID is the container ID
    pub id: String,
    // Human readable name copied from the config
    pub name: String,
    // Process group leader spawned by the supervisor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<i32>,
    pub status: ContainerStatus,
    // Directory presented as / inside the container
    pub rootfs: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    // Config captured when the container was created
    pub config: ContainerConfig,
}

impl State {
    const STATE_FILE_PATH: &'static str = "state.txt";
    const TMP_STATE_FILE_PATH: &'static str = "state.txt.tmp";

    pub fn new(container_id: &str, config: &ContainerConfig, rootfs: PathBuf) -> Self {
        Self {
            id: container_id.to_string(),
            name: config.name.clone(),
            pid: None,
            status: ContainerStatus::Created,
            rootfs,
            created: Some(Utc::now()),
            config: config.clone(),
        }
    }

    /// Renders the record as `key=value` lines. List fields use one line
    /// per entry.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        let mut line = |key: &str, value: &dyn Display| {
            out.push_str(&format!("{key}={value}\n"));
        };

        line("id", &self.id);
        line("name", &self.name);
        line("pid", &self.pid.unwrap_or(0));
        line("status", &self.status);
        line("rootfs", &self.rootfs.display());
        line("image", &self.config.image);
        line("command", &self.config.command);
        line("workdir", &self.config.workdir);
        if let Some(created) = self.created {
            line("created", &created.to_rfc3339());
        }
        for port in &self.config.ports {
            line("port", port);
        }
        for volume in &self.config.volumes {
            line("volume", volume);
        }
        for (key, value) in &self.config.env {
            line("env", &format!("{key}={value}"));
        }

        out
    }

    /// Parses a record produced by [`State::encode`]. Unknown keys and
    /// malformed lines are skipped, absent keys keep their defaults.
    pub fn decode(content: &str) -> Self {
        let mut state = Self::default();
        let mut status_seen = false;

        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key {
                "id" => state.id = value.to_owned(),
                "name" => state.name = value.to_owned(),
                "pid" => state.pid = value.parse::<i32>().ok().filter(|pid| *pid > 0),
                "status" => match value.parse() {
                    Ok(status) => {
                        state.status = status;
                        status_seen = true;
                    }
                    Err(err) => tracing::warn!(%err, "treating container as created"),
                },
                "rootfs" => state.rootfs = PathBuf::from(value),
                "image" => state.config.image = value.to_owned(),
                "command" => state.config.command = value.to_owned(),
                "workdir" => state.config.workdir = value.to_owned(),
                "created" => {
                    state.created = DateTime::parse_from_rfc3339(value)
                        .map(|t| t.with_timezone(&Utc))
                        .ok()
                }
                "port" => state.config.ports.extend(Mapping::parse(value)),
                "volume" => state.config.volumes.extend(Mapping::parse(value)),
                "env" => {
                    if let Some((k, v)) = value.split_once('=') {
                        state.config.env.push((k.to_owned(), v.to_owned()));
                    }
                }
                _ => {}
            }
        }

        if !status_seen {
            tracing::debug!(id = %state.id, "no status recorded, assuming created");
        }
        state.config.name = state.name.clone();
        state
    }

    /// Replaces the record in `container_root` by writing a temporary file
    /// and renaming it over `state.txt`.
    #[instrument(level = "trace", skip(self))]
    pub fn save(&self, container_root: &Path) -> Result<()> {
        let state_file_path = Self::file_path(container_root);
        let tmp_file_path = container_root.join(Self::TMP_STATE_FILE_PATH);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_file_path)
            .map_err(|err| {
                tracing::error!(
                    state_file_path = ?tmp_file_path,
                    err = %err,
                    "failed to open container state file",
                );
                StateError::OpenStateFile {
                    state_file_path: tmp_file_path.to_owned(),
                    source: err,
                }
            })?;

        file.write_all(self.encode().as_bytes())
            .and_then(|_| file.sync_all())
            .and_then(|_| fs::rename(&tmp_file_path, &state_file_path))
            .map_err(|err| {
                tracing::error!(
                    ?state_file_path,
                    %err,
                    "failed to write container state file",
                );
                StateError::WriteStateFile {
                    state_file_path: state_file_path.to_owned(),
                    source: err,
                }
            })?;

        Ok(())
    }

    pub fn load(container_root: &Path) -> Result<Self> {
        let state_file_path = Self::file_path(container_root);
        let content = fs::read_to_string(&state_file_path).map_err(|err| {
            tracing::error!(
                ?state_file_path,
                %err,
                "failed to open container state file",
            );
            StateError::OpenStateFile {
                state_file_path: state_file_path.to_owned(),
                source: err,
            }
        })?;

        Ok(Self::decode(&content))
    }

    /// Returns the path to the state file for the provided `container_root`.
    ///
    /// ```
    /// # use std::path::Path;
    /// # use libdocklite::container::State;
    ///
    /// let container_root = Path::new("/var/docklite/containers/0123");
    /// let state_file = State::file_path(&container_root);
    /// assert_eq!(state_file.to_str(), Some("/var/docklite/containers/0123/state.txt"));
    /// ```
    pub fn file_path(container_root: &Path) -> PathBuf {
        container_root.join(Self::STATE_FILE_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn sample_config(command: &str, workdir: &str) -> ContainerConfig {
        ContainerConfig {
            name: "web".to_owned(),
            image: "alpine".to_owned(),
            command: command.to_owned(),
            workdir: workdir.to_owned(),
            ports: vec![Mapping::new("8080", "80")],
            volumes: vec![Mapping::new("/srv/www", "/var/www")],
            env: vec![("MODE".to_owned(), "a=b".to_owned())],
        }
    }

    #[test]
    fn test_created_status() {
        let cstatus = ContainerStatus::default();
        assert_eq!(cstatus, ContainerStatus::Created);
        assert!(cstatus.can_start());
        assert!(!cstatus.can_stop());
    }

    #[test]
    fn test_running_status() {
        let cstatus = ContainerStatus::Running;
        assert!(!cstatus.can_start());
        assert!(cstatus.can_stop());
    }

    #[test]
    fn test_stopped_status() {
        let cstatus = ContainerStatus::Stopped;
        assert!(cstatus.can_start());
        assert!(!cstatus.can_stop());
    }

    #[test]
    fn test_status_text() {
        for status in [
            ContainerStatus::Created,
            ContainerStatus::Running,
            ContainerStatus::Stopped,
        ] {
            assert_eq!(status.to_string().parse::<ContainerStatus>(), Ok(status));
        }
        assert!("paused".parse::<ContainerStatus>().is_err());
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        for (command, workdir) in [
            ("", ""),
            ("sleep 100", ""),
            ("", "/srv"),
            ("python3 -m http.server", "/srv"),
        ] {
            let mut state = State::new(
                "4f2a",
                &sample_config(command, workdir),
                tmp.path().join("rootfs"),
            );
            state.pid = Some(4242);
            state.status = ContainerStatus::Running;
            state.save(tmp.path())?;

            let loaded = State::load(tmp.path())?;
            assert_eq!(loaded, state);
            assert_eq!(loaded.config.command(), state.config.command());
            assert_eq!(loaded.config.workdir(), state.config.workdir());
        }
        assert!(!tmp.path().join(State::TMP_STATE_FILE_PATH).exists());
        Ok(())
    }

    #[test]
    fn test_decode_defaults() {
        let state = State::decode("id=abc\nfoo=bar\ngarbage\npid=0\nstatus=bogus\n");
        assert_eq!(state.id, "abc");
        assert_eq!(state.pid, None);
        assert_eq!(state.status, ContainerStatus::Created);
        assert_eq!(state.created, None);
        assert!(state.config.ports.is_empty());
        assert_eq!(state.config.command(), None);
    }

    #[test]
    fn test_decode_ignores_key_order() {
        let state = State::decode("status=stopped\nname=db\npid=-3\nid=xyz\n");
        assert_eq!(state.id, "xyz");
        assert_eq!(state.name, "db");
        assert_eq!(state.config.name, "db");
        assert_eq!(state.status, ContainerStatus::Stopped);
        assert_eq!(state.pid, None);
    }

    #[test]
    fn test_encode_format() {
        let mut state = State::new("abc", &sample_config("ls", ""), PathBuf::from("/r"));
        state.created = None;
        assert_eq!(
            state.encode(),
            "id=abc\nname=web\npid=0\nstatus=created\nrootfs=/r\nimage=alpine\n\
             command=ls\nworkdir=\nport=8080:80\nvolume=/srv/www:/var/www\nenv=MODE=a=b\n"
        );
    }

    #[test]
    fn test_load_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let err = State::load(tmp.path()).unwrap_err();
        assert!(matches!(err, StateError::OpenStateFile { .. }));
    }
}
