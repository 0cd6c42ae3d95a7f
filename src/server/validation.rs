use crate::error::ValidationErrors;
use crate::server::ServerData;

/// Lowest base port a server may use
pub const MIN_PORT_BASE: i64 = 8000;
/// Highest base port; the instance also binds `port_base + 1`
pub const MAX_PORT_BASE: i64 = 65534;
pub const MIN_MAX_USERS: i64 = 1;
pub const MAX_MAX_USERS: i64 = 65534;

/// Message for text that would break the line-oriented config file
pub const INVALID_CHARACTERS: &str = "Invalid characters";

/// Whether `value` holds a line break; such values cannot be written as one `key=value` line
pub fn has_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

/// Validates server data.
///
/// Checks structure and ranges only; existence and port uniqueness are the
/// repository's concern. Returns an empty set when the data is valid.
pub fn validate(data: &ServerData) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if data.name.is_empty() {
        errors.add("name", "Name is required");
    } else if has_line_break(&data.name) {
        errors.add("name", INVALID_CHARACTERS);
    }

    if !(MIN_PORT_BASE..=MAX_PORT_BASE).contains(&data.port_base) || data.port_base % 2 != 0 {
        errors.add("portBase", "Invalid port base");
    }

    if data.password.is_empty() {
        errors.add("password", "Password is required");
    } else if has_line_break(&data.password) {
        errors.add("password", INVALID_CHARACTERS);
    }

    if data.admin_password.is_empty() {
        errors.add("adminPassword", "Admin password is required");
    } else if has_line_break(&data.admin_password) {
        errors.add("adminPassword", INVALID_CHARACTERS);
    }

    if !(MIN_MAX_USERS..=MAX_MAX_USERS).contains(&data.max_users) {
        errors.add("maxUsers", "Invalid max users");
    }

    errors
}
