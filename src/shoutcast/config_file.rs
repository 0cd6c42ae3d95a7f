use crate::error::{Error, Result, ValidationErrors};
use crate::server::validation::{INVALID_CHARACTERS, has_line_break};
use crate::server::{Server, ServerData, ServerId, Visibility};
use std::path::{Path, PathBuf};

/// Line terminator required by the SHOUTcast server
pub const LINE_ENDING: &str = "\r\n";

/// Extension of generated configuration files
pub const CONFIG_EXTENSION: &str = "config";

pub mod keys {
    pub const SCREEN_LOG: &str = "screenlog";
    pub const PORT_BASE: &str = "portbase";
    pub const MAX_USER: &str = "maxuser";
    pub const PASSWORD: &str = "password";
    pub const ADMIN_PASSWORD: &str = "adminpassword";
    pub const LOG_FILE: &str = "logfile";
    pub const W3C_LOG: &str = "w3clog";
    pub const PUBLIC_SERVER: &str = "publicserver";
}

const PUBLIC_ALWAYS: &str = "always";
const PUBLIC_NEVER: &str = "never";

/// Path of the configuration file for a server inside `configs_dir`
pub fn config_path(configs_dir: impl AsRef<Path>, id: ServerId) -> PathBuf {
    configs_dir
        .as_ref()
        .join(format!("{}.{}", id, CONFIG_EXTENSION))
}

/// A SHOUTcast configuration as an ordered list of `key=value` pairs.
///
/// # Examples
///
/// ```
/// use galena::shoutcast::ConfigFile;
///
/// let file = ConfigFile::parse("portbase=8000\r\nmaxuser=32\r\npublicserver=never\r\n").unwrap();
/// assert_eq!(file.get("portbase"), Some("8000"));
///
/// let data = file.to_server_data().unwrap();
/// assert_eq!(data.port_base, 8000);
/// assert_eq!(data.max_users, 32);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    entries: Vec<(String, String)>,
}

impl ConfigFile {
    /// Map a server onto the SHOUTcast key vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a password holds a line break, since
    /// it would be written as extra directives.
    pub fn from_server(server: &Server) -> Result<Self> {
        let mut errors = ValidationErrors::new();
        if has_line_break(&server.password) {
            errors.add("password", INVALID_CHARACTERS);
        }
        if has_line_break(&server.admin_password) {
            errors.add("adminPassword", INVALID_CHARACTERS);
        }
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        let public = match server.visibility {
            Visibility::Public => PUBLIC_ALWAYS,
            Visibility::Private => PUBLIC_NEVER,
        };

        let entries = vec![
            (keys::SCREEN_LOG, "1".to_string()),
            (keys::PORT_BASE, server.port_base.to_string()),
            (keys::MAX_USER, server.max_users.to_string()),
            (keys::PASSWORD, server.password.clone()),
            (keys::ADMIN_PASSWORD, server.admin_password.clone()),
            (keys::LOG_FILE, String::new()),
            (keys::W3C_LOG, String::new()),
            (keys::PUBLIC_SERVER, public.to_string()),
        ];

        Ok(Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        })
    }

    /// Parse `key=value` lines.
    ///
    /// Blank lines and lines starting with `#` or `;` are skipped. Both LF
    /// and CRLF terminators are accepted. Whitespace around the key is
    /// ignored; the value is everything after the first `=`, byte for byte.
    /// Keys outside the known vocabulary are kept so callers can inspect them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] for a line without `=` or with a key
    /// that is not a word.
    pub fn parse(content: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                Error::ConfigParse(format!("line {}: expected key=value", index + 1))
            })?;
            let key = key.trim();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(Error::ConfigParse(format!(
                    "line {}: invalid key '{}'",
                    index + 1,
                    key
                )));
            }

            entries.push((key.to_string(), value.to_string()));
        }

        Ok(Self { entries })
    }

    /// Value for a key; the last occurrence wins
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Recover server attributes from the file.
    ///
    /// The format carries neither name nor identity, so those stay empty.
    /// Missing numeric keys become zero and fail validation later.
    pub fn to_server_data(&self) -> Result<ServerData> {
        let number = |key: &str| -> Result<i64> {
            match self.get(key) {
                None => Ok(0),
                Some(v) if v.trim().is_empty() => Ok(0),
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| Error::ConfigParse(format!("{} is not a number: '{}'", key, v))),
            }
        };
        let text = |key: &str| self.get(key).unwrap_or_default().to_string();

        let visibility = match self.get(keys::PUBLIC_SERVER) {
            Some(v) if v.trim().eq_ignore_ascii_case(PUBLIC_ALWAYS) => Visibility::Public,
            _ => Visibility::Private,
        };

        Ok(ServerData {
            port_base: number(keys::PORT_BASE)?,
            max_users: number(keys::MAX_USER)?,
            password: text(keys::PASSWORD),
            admin_password: text(keys::ADMIN_PASSWORD),
            visibility,
            ..ServerData::default()
        })
    }

    /// Render with CRLF terminators, including after the last line
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}={}{}", k, v, LINE_ENDING))
            .collect()
    }

    /// Replace the file at `path` with this configuration
    #[tracing::instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        tokio::fs::write(path.as_ref(), self.render()).await?;
        tracing::debug!(entries = self.entries.len(), "Wrote server configuration file");
        Ok(())
    }

    /// Read and parse the file at `path`
    pub async fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::parse(&content)
    }
}
