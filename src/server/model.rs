// src/server/model.rs
use crate::error::{Error, Result};
use crate::server::validation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a configured server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(Uuid);

impl ServerId {
    // Only the repository assigns identities
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ServerId {
    type Err = Error;

    /// Parse an ID taken from a request path.
    ///
    /// A string that is not a UUID cannot address any server, so it is
    /// reported as not found rather than as a validation failure.
    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| Error::ServerNotFound(s.to_string()))
    }
}

/// Whether the instance announces itself in the public directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// A validated server configuration with an assigned identity.
///
/// Values of this type only come out of [`ServerData::into_server`] or the
/// store, so every field already satisfies the validation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: ServerId,
    pub name: String,
    pub port_base: u16,
    pub password: String,
    pub admin_password: String,
    pub max_users: u16,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Server {
    /// The full attribute set of this server, without its identity
    pub fn data(&self) -> ServerData {
        ServerData {
            id: None,
            name: self.name.clone(),
            port_base: i64::from(self.port_base),
            password: self.password.clone(),
            admin_password: self.admin_password.clone(),
            max_users: i64::from(self.max_users),
            visibility: self.visibility,
        }
    }
}

/// Server attributes as submitted by a caller.
///
/// Every attribute defaults to an empty value so that a missing field shows
/// up as a field violation instead of a parse failure. Unknown fields are
/// rejected. An `id` may be present in a request body but is never used.
///
/// # Examples
///
/// ```
/// use galena::server::{ServerData, Visibility};
///
/// let data = ServerData::new("Rock FM", 8000)
///     .with_passwords("listen", "admin")
///     .with_max_users(64)
///     .with_visibility(Visibility::Private);
///
/// assert!(data.validate().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ServerData {
    #[serde(skip_serializing)]
    pub id: Option<String>,
    pub name: String,
    pub port_base: i64,
    pub password: String,
    pub admin_password: String,
    pub max_users: i64,
    pub visibility: Visibility,
}

impl Default for ServerData {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            port_base: 0,
            password: String::new(),
            admin_password: String::new(),
            max_users: 0,
            visibility: Visibility::Public,
        }
    }
}

impl ServerData {
    /// Start building server data from its name and base port
    pub fn new(name: impl Into<String>, port_base: i64) -> Self {
        Self {
            name: name.into(),
            port_base,
            ..Self::default()
        }
    }

    pub fn with_passwords(
        mut self,
        password: impl Into<String>,
        admin_password: impl Into<String>,
    ) -> Self {
        self.password = password.into();
        self.admin_password = admin_password.into();
        self
    }

    pub fn with_max_users(mut self, max_users: i64) -> Self {
        self.max_users = max_users;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_port_base(mut self, port_base: i64) -> Self {
        self.port_base = port_base;
        self
    }

    /// Check every field; an empty result means the data is valid
    pub fn validate(&self) -> crate::error::ValidationErrors {
        validation::validate(self)
    }

    /// Validate and attach an identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] with every failing field.
    pub fn into_server(self, id: ServerId) -> Result<Server> {
        let violations = self.validate();
        if !violations.is_empty() {
            return Err(Error::Validation(violations));
        }

        // Ranges were checked above
        let port_base = u16::try_from(self.port_base)
            .map_err(|_| Error::Other(format!("port base {} out of range", self.port_base)))?;
        let max_users = u16::try_from(self.max_users)
            .map_err(|_| Error::Other(format!("max users {} out of range", self.max_users)))?;

        Ok(Server {
            id,
            name: self.name,
            port_base,
            password: self.password,
            admin_password: self.admin_password,
            max_users,
            visibility: self.visibility,
        })
    }
}

/// A server as reported to callers: its configuration plus liveness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerView {
    #[serde(flatten)]
    pub server: Server,
    pub is_running: bool,
}

impl ServerView {
    pub fn new(server: Server, is_running: bool) -> Self {
        Self { server, is_running }
    }

    pub fn id(&self) -> ServerId {
        self.server.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_data_rejects_unknown_fields() {
        let result: std::result::Result<ServerData, _> = serde_json::from_value(json!({
            "name": "Rock",
            "portBase": 8000,
            "maxusers": 10
        }));
        assert!(result.is_err());
    }

    #[test]
    fn server_data_defaults_missing_fields() {
        let data: ServerData = serde_json::from_value(json!({ "name": "Rock" })).unwrap();
        assert_eq!(data.port_base, 0);
        assert_eq!(data.visibility, Visibility::Public);

        let violations = data.validate();
        assert!(violations.contains("portBase"));
        assert!(violations.contains("password"));
        assert!(!violations.contains("name"));
    }

    #[test]
    fn server_data_accepts_and_keeps_submitted_id_out_of_output() {
        let data: ServerData = serde_json::from_value(json!({
            "id": "not-used",
            "name": "Rock",
            "visibility": "private"
        }))
        .unwrap();
        assert_eq!(data.id.as_deref(), Some("not-used"));
        assert_eq!(data.visibility, Visibility::Private);

        let out = serde_json::to_value(&data).unwrap();
        assert!(out.get("id").is_none());
    }

    #[test]
    fn into_server_narrows_integers() {
        let id = ServerId::new();
        let server = ServerData::new("Rock", 8002)
            .with_passwords("a", "b")
            .with_max_users(65534)
            .into_server(id)
            .unwrap();
        assert_eq!(server.id, id);
        assert_eq!(server.port_base, 8002);
        assert_eq!(server.max_users, 65534);
        assert_eq!(server.data().port_base, 8002);
    }

    #[test]
    fn server_id_parse_failure_is_not_found() {
        let err = "nope".parse::<ServerId>().unwrap_err();
        assert!(matches!(err, Error::ServerNotFound(ref s) if s == "nope"));

        let id = ServerId::new();
        assert_eq!(id.to_string().parse::<ServerId>().unwrap(), id);
    }

    #[test]
    fn view_flattens_server_fields() {
        let server = ServerData::new("Rock", 8000)
            .with_passwords("a", "b")
            .with_max_users(1)
            .into_server(ServerId::new())
            .unwrap();
        let json = serde_json::to_value(ServerView::new(server.clone(), true)).unwrap();
        assert_eq!(json["id"], server.id.to_string());
        assert_eq!(json["portBase"], 8000);
        assert_eq!(json["isRunning"], true);
        assert_eq!(json["visibility"], "public");
    }
}
