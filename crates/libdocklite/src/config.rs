//! Declarative container configuration
//!
//! The configuration file is read line by line. A scalar (`name`, `image`,
//! `command`, `workdir`) is declared wherever its key appears followed by `:`
//! or `=` and a double-quoted value, so both JSON-like and TOML-like files
//! work, including several keys on one line:
//!
//! ```text
//! {
//!     "name": "web",
//!     "image": "alpine",
//!     "ports": [
//!         "8080:80"
//!     ],
//!     "volumes": ["/srv/data:/data"]
//! }
//! ```
//!
//! `ports`, `env` and `volumes` open a list section that collects quoted
//! entries until the next scalar or section. Anything else is ignored.
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Byte capacity of the `name` field, including the terminator slot
pub const MAX_NAME: usize = 256;
/// Byte capacity of every other string field, including the terminator slot
pub const MAX_PATH: usize = 4096;
pub const MAX_PORTS: usize = 32;
pub const MAX_ENV: usize = 64;
pub const MAX_VOLUMES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to open config file {path:?}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
}

type Result<T> = std::result::Result<T, ConfigError>;

/// A `host:container` pair taken from the `ports` or `volumes` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    pub host: String,
    pub container: String,
}

impl Mapping {
    pub fn new<H: Into<String>, C: Into<String>>(host: H, container: C) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
        }
    }

    /// Splits `host:container` at the first colon.
    ///
    /// ```
    /// # use libdocklite::config::Mapping;
    /// assert_eq!(Mapping::parse("8080:80"), Some(Mapping::new("8080", "80")));
    /// assert_eq!(Mapping::parse("8080"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        s.split_once(':')
            .map(|(host, container)| Self::new(host, container))
    }
}

impl Display for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.container)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerConfig {
    pub name: String,
    pub image: String,
    /// Empty means an interactive shell is started instead.
    pub command: String,
    pub workdir: String,
    pub ports: Vec<Mapping>,
    pub volumes: Vec<Mapping>,
    pub env: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Ports,
    Env,
    Volumes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    Name,
    Image,
    Command,
    Workdir,
}

enum Key {
    Scalar(Scalar),
    Section(Section),
}

impl Key {
    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "name" => Key::Scalar(Scalar::Name),
            "image" => Key::Scalar(Scalar::Image),
            "command" => Key::Scalar(Scalar::Command),
            "workdir" => Key::Scalar(Scalar::Workdir),
            "ports" => Key::Section(Section::Ports),
            "env" => Key::Section(Section::Env),
            "volumes" => Key::Section(Section::Volumes),
            _ => return None,
        })
    }
}

impl ContainerConfig {
    /// Reads and parses the configuration file at `path`. Only a failure to
    /// read the file is an error; malformed lines are skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| {
            tracing::error!(?path, %err, "failed to open config file");
            ConfigError::Open {
                path: path.to_owned(),
                source: err,
            }
        })?;

        let config = Self::parse(&content);
        tracing::debug!(?path, ?config, "loaded container config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();
        let mut section = Section::None;

        for line in content.lines() {
            let mut tokens = tokenize(line).into_iter().peekable();
            while let Some((token, after)) = tokens.next() {
                if !is_keyed(after) {
                    if let Token::Quoted(item) = token {
                        config.push_item(section, item);
                    }
                    continue;
                }

                let value = match tokens.peek() {
                    Some((Token::Quoted(value), _)) => Some(*value),
                    _ => None,
                };
                match Key::from_token(token.text()) {
                    Some(Key::Section(next)) => section = next,
                    Some(Key::Scalar(scalar)) => {
                        section = Section::None;
                        if let Some(value) = value {
                            config.set_scalar(scalar, value);
                            tokens.next();
                        }
                    }
                    // `"KEY": "value"` inside a list section
                    None => {
                        if let Some(value) = value {
                            if !token.text().is_empty() {
                                config.push_pair(section, token.text(), value);
                            }
                            tokens.next();
                        }
                    }
                }
            }
        }

        config
    }

    pub fn command(&self) -> Option<&str> {
        non_empty(&self.command)
    }

    pub fn workdir(&self) -> Option<&str> {
        non_empty(&self.workdir)
    }

    fn set_scalar(&mut self, scalar: Scalar, value: &str) {
        match scalar {
            Scalar::Name => self.name = bounded("name", value, MAX_NAME),
            Scalar::Image => self.image = bounded("image", value, MAX_PATH),
            Scalar::Command => self.command = bounded("command", value, MAX_PATH),
            Scalar::Workdir => self.workdir = bounded("workdir", value, MAX_PATH),
        }
    }

    fn push_item(&mut self, section: Section, item: &str) {
        let split = match section {
            Section::None => return,
            Section::Env => item.split_once('=').or_else(|| item.split_once(':')),
            _ => item.split_once(':'),
        };
        if let Some((key, value)) = split {
            self.push_pair(section, key, value);
        }
    }

    fn push_pair(&mut self, section: Section, key: &str, value: &str) {
        let key = bounded("entry", key, MAX_PATH);
        let value = bounded("entry", value, MAX_PATH);
        match section {
            Section::Ports if self.ports.len() < MAX_PORTS => {
                self.ports.push(Mapping::new(key, value))
            }
            Section::Volumes if self.volumes.len() < MAX_VOLUMES => {
                self.volumes.push(Mapping::new(key, value))
            }
            Section::Env if self.env.len() < MAX_ENV => self.env.push((key, value)),
            Section::None => {}
            _ => tracing::warn!(?section, %key, "list capacity reached, entry dropped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Quoted(&'a str),
    Bare(&'a str),
}

impl<'a> Token<'a> {
    fn text(self) -> &'a str {
        match self {
            Token::Quoted(text) | Token::Bare(text) => text,
        }
    }
}

fn is_bare(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Splits a line into quoted strings and bare words, each paired with the
/// text that follows it. Punctuation between tokens is dropped and an
/// unterminated quote ends the line.
fn tokenize(line: &str) -> Vec<(Token<'_>, &str)> {
    let mut tokens = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find(|c: char| c == '"' || is_bare(c)) {
        rest = &rest[start..];
        if let Some(quoted) = rest.strip_prefix('"') {
            let Some(end) = quoted.find('"') else {
                break;
            };
            rest = &quoted[end + 1..];
            tokens.push((Token::Quoted(&quoted[..end]), rest));
        } else {
            let end = rest.find(|c: char| !is_bare(c)).unwrap_or(rest.len());
            let (word, after) = rest.split_at(end);
            rest = after;
            tokens.push((Token::Bare(word), rest));
        }
    }
    tokens
}

/// A token names a key when `:` or `=` follows it.
fn is_keyed(after: &str) -> bool {
    matches!(after.trim_start().chars().next(), Some(':' | '='))
}

/// Truncates to at most `capacity - 1` bytes on a character boundary.
fn bounded(field: &str, value: &str, capacity: usize) -> String {
    let limit = capacity - 1;
    if value.len() <= limit {
        return value.to_owned();
    }

    let mut end = limit;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    tracing::warn!(field, limit, "value too long, truncated");
    value[..end].to_owned()
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_parse_json_style() {
        let content = r#"{
            "name": "web",
            "image": "alpine:3.19",
            "command": "python3 -m http.server 8000",
            "workdir": "/srv",
            "ports": [
                "8080:8000",
                "9090:90"
            ],
            "env": {
                "PATH": "/usr/bin:/bin",
                "MODE": "prod"
            },
            "volumes": [
                "/home/user/www:/srv"
            ]
        }"#;

        let config = ContainerConfig::parse(content);
        assert_eq!(config.name, "web");
        assert_eq!(config.image, "alpine:3.19");
        assert_eq!(config.command(), Some("python3 -m http.server 8000"));
        assert_eq!(config.workdir(), Some("/srv"));
        assert_eq!(
            config.ports,
            vec![Mapping::new("8080", "8000"), Mapping::new("9090", "90")]
        );
        assert_eq!(
            config.env,
            vec![
                ("PATH".to_owned(), "/usr/bin:/bin".to_owned()),
                ("MODE".to_owned(), "prod".to_owned())
            ]
        );
        assert_eq!(config.volumes, vec![Mapping::new("/home/user/www", "/srv")]);
    }

    #[test]
    fn test_parse_toml_style() {
        let content = r#"
            name = "db"
            image = "debian"
            ports = ["5432:5432", "5433:5433"]
            env = [
                "PGDATA=/var/lib/pg"
            ]
        "#;

        let config = ContainerConfig::parse(content);
        assert_eq!(config.name, "db");
        assert_eq!(config.image, "debian");
        assert_eq!(config.command(), None);
        assert_eq!(config.workdir(), None);
        assert_eq!(config.ports.len(), 2);
        assert_eq!(
            config.env,
            vec![("PGDATA".to_owned(), "/var/lib/pg".to_owned())]
        );
    }

    #[test]
    fn test_parse_keys_after_brace() {
        let content = "{ \"name\": \"web\",\n  \"image\": \"alpine\",\n  \"command\": \"sleep 1\" }";

        let config = ContainerConfig::parse(content);
        assert_eq!(config.name, "web");
        assert_eq!(config.image, "alpine");
        assert_eq!(config.command(), Some("sleep 1"));
    }

    #[test]
    fn test_parse_single_line() {
        let content = r#"{"name": "web", "command": "sleep 1", "ports": ["8080:80", "9090:90"], "env": {"MODE": "prod"}, "workdir": "/srv"}"#;

        let config = ContainerConfig::parse(content);
        assert_eq!(config.name, "web");
        assert_eq!(config.command(), Some("sleep 1"));
        assert_eq!(
            config.ports,
            vec![Mapping::new("8080", "80"), Mapping::new("9090", "90")]
        );
        assert_eq!(config.env, vec![("MODE".to_owned(), "prod".to_owned())]);
        assert_eq!(config.workdir(), Some("/srv"));
    }

    #[test]
    fn test_value_text_is_not_a_key() {
        let config = ContainerConfig::parse(r#"command = "env name=web image: alpine""#);
        assert_eq!(config.name, "");
        assert_eq!(config.image, "");
        assert_eq!(config.command(), Some("env name=web image: alpine"));
    }

    #[test]
    fn test_scalar_ends_section() {
        let content = r#"
            "ports": [
                "80:80"
            ]
            "command": "sleep 100"
            "10:10"
        "#;

        let config = ContainerConfig::parse(content);
        assert_eq!(config.ports, vec![Mapping::new("80", "80")]);
        assert_eq!(config.command, "sleep 100");
    }

    #[test]
    fn test_ignores_garbage() {
        let content = r#"
            # a comment
            this is not a config line
            "unterminated
            "volumes": [
                "no-separator",
                /unquoted:/path
            ]
            "name" "missing separator"
        "#;

        let config = ContainerConfig::parse(content);
        assert_eq!(config, ContainerConfig::default());
    }

    #[test]
    fn test_entries_outside_section_are_ignored() {
        let config = ContainerConfig::parse("\"8080:80\"\n\"KEY\": \"value\"\n");
        assert!(config.ports.is_empty());
        assert!(config.env.is_empty());
    }

    #[test]
    fn test_truncates_long_values() {
        let long_name = "n".repeat(MAX_NAME * 2);
        let long_command = "é".repeat(MAX_PATH);
        let content = format!("name: \"{long_name}\"\ncommand: \"{long_command}\"\n");

        let config = ContainerConfig::parse(&content);
        assert_eq!(config.name.len(), MAX_NAME - 1);
        assert!(config.command.len() <= MAX_PATH - 1);
        assert!(config.command.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_list_capacity() {
        let mut content = String::from("ports = [\n");
        for port in 0..(MAX_PORTS + 8) {
            content.push_str(&format!("\"{port}:{port}\",\n"));
        }
        content.push_str("]\n");

        let config = ContainerConfig::parse(&content);
        assert_eq!(config.ports.len(), MAX_PORTS);
        assert_eq!(config.ports[MAX_PORTS - 1], Mapping::new("31", "31"));
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("web.docklite");
        fs::write(&path, "\"name\": \"web\"\n\"command\": \"\"\n")?;

        let config = ContainerConfig::load(&path)?;
        assert_eq!(config.name, "web");
        assert_eq!(config.command(), None);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing.docklite");
        let err = ContainerConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Open { path: p, .. } if p == path));
    }
}
