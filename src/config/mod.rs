//! Configuration module for Galena.
//!
//! This module handles parsing, validation, and access to the process-wide
//! settings: where the HTTP API listens, where servers are stored and how
//! SHOUTcast processes are launched. Configurations are JSON files.
//!
//! # Examples
//!
//! Loading a configuration from a file:
//!
//! ```no_run
//! use galena::config::Config;
//!
//! let config = Config::from_file("config.json").unwrap();
//! println!("API will listen on {}", config.bind_address());
//! ```
//!
//! Creating a configuration programmatically:
//!
//! ```
//! use galena::config::{Config, ShoutcastSettings};
//! use std::path::PathBuf;
//!
//! let config = Config {
//!     port: 8080,
//!     shoutcast: ShoutcastSettings {
//!         bin_path: PathBuf::from("/opt/shoutcast/sc_serv"),
//!         ..ShoutcastSettings::default()
//!     },
//!     ..Config::default()
//! };
//! assert_eq!(config.bind_address(), "127.0.0.1:8080");
//! ```
mod parser;
pub mod validator;

pub use parser::{Config, DEFAULT_WORKERS, ShoutcastSettings};
pub use validator::{validate_config, validate_shoutcast_settings};
