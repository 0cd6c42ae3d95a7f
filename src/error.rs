/// Error handling module for Galena.
///
/// This module defines the error types used throughout the library.
/// Every failure carries enough structure for the request layer to tell
/// apart a caller mistake (validation, not found), an ordering problem
/// (conflict) and an infrastructure fault.
///
/// # Example
///
/// ```
/// use galena::error::{Error, ErrorKind, Result};
///
/// fn handle_error(result: Result<()>) {
///     match result {
///         Ok(_) => println!("Operation succeeded"),
///         Err(Error::Validation(fields)) => {
///             for (field, message) in fields.iter() {
///                 println!("{}: {}", field, message);
///             }
///         }
///         Err(e) if e.kind() == ErrorKind::Conflict => println!("Try again later: {}", e),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Field-level violations collected while validating server data.
///
/// Keys are the JSON field names (`portBase`, `maxUsers`, ...), values are
/// human-readable messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    /// Create an empty set of violations
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding a single violation
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a violation for a field, replacing any earlier one
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Message recorded for a field, if any
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Iterate violations ordered by field name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Field names that failed
    pub fn fields(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Broad classification of an [`Error`].
///
/// The request layer maps each kind to a distinct response; the core only
/// guarantees that every error falls into exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The submitted data is invalid; fixable by the caller
    Validation,
    /// The addressed server does not exist
    NotFound,
    /// The operation is not allowed in the current lifecycle state
    Conflict,
    /// Store, filesystem, process or configuration failure
    Infrastructure,
}

/// Errors that can occur in the galena library.
#[derive(Error, Debug)]
pub enum Error {
    /// Server data failed validation or a uniqueness check.
    ///
    /// This error occurs when:
    /// - A required field is empty
    /// - A number is outside its allowed range
    /// - The base port is already used by another server
    #[error("Invalid model data: {0}")]
    Validation(ValidationErrors),

    /// Requested server does not exist in the store.
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    /// The server is already running.
    ///
    /// This error occurs when:
    /// - Attempting to start a server that's already running
    #[error("Server already running")]
    AlreadyRunning,

    /// The server is not running.
    ///
    /// This error occurs when:
    /// - Attempting to stop a server that's not running
    #[error("Server not running")]
    NotRunning,

    /// The server is running, so its configuration is locked.
    ///
    /// Carries the refused action (`updated`, `removed`).
    #[error("Server running. Cannot be {0}")]
    ServerRunning(String),

    /// Error when spawning or signalling a server process.
    #[error("Server process error: {0}")]
    Process(String),

    /// The document store failed to read or write.
    #[error("Store error: {0}")]
    Store(String),

    /// Filesystem failure, e.g. while writing a server configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration file or string.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration parsed but contains unusable values.
    ///
    /// This error occurs when:
    /// - The server executable doesn't exist or isn't a file
    /// - The configuration directory doesn't exist
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Error in serializing or deserializing data.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Any other error not covered by the above categories.
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Classify this error for callers that only care about the remedy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::ServerNotFound(_) => ErrorKind::NotFound,
            Error::AlreadyRunning | Error::NotRunning | Error::ServerRunning(_) => {
                ErrorKind::Conflict
            }
            Error::Process(_)
            | Error::Store(_)
            | Error::Io(_)
            | Error::ConfigParse(_)
            | Error::ConfigInvalid(_)
            | Error::Serialization(_)
            | Error::Other(_) => ErrorKind::Infrastructure,
        }
    }

    /// Short name of the variant, reported to HTTP clients as `errorType`
    pub fn type_name(&self) -> &'static str {
        match self {
            Error::Validation(_) => "ValidationError",
            Error::ServerNotFound(_) => "NotFoundError",
            Error::AlreadyRunning | Error::NotRunning | Error::ServerRunning(_) => "ConflictError",
            _ => "InfrastructureError",
        }
    }

    /// Field violations carried by a validation error
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Error::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type for galena operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct_per_family() {
        assert_eq!(
            Error::Validation(ValidationErrors::single("name", "Name is required")).kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::ServerNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::AlreadyRunning.kind(), ErrorKind::Conflict);
        assert_eq!(Error::NotRunning.kind(), ErrorKind::Conflict);
        assert_eq!(Error::ServerRunning("removed".into()).kind(), ErrorKind::Conflict);
        assert_eq!(Error::Store("down".into()).kind(), ErrorKind::Infrastructure);
        assert_eq!(
            Error::Io(std::io::Error::other("disk full")).kind(),
            ErrorKind::Infrastructure
        );
    }

    #[test]
    fn validation_errors_display_and_serialize() {
        let mut errors = ValidationErrors::new();
        errors.add("portBase", "Invalid port base");
        errors.add("name", "Name is required");

        assert_eq!(
            errors.to_string(),
            "name: Name is required; portBase: Invalid port base"
        );
        assert_eq!(errors.fields(), vec!["name", "portBase"]);

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["portBase"], "Invalid port base");
    }
}
