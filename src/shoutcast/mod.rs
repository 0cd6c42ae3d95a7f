//! SHOUTcast configuration file support.
//!
//! The external `sc_serv` process reads a flat `key=value` file with CRLF
//! line endings. This module maps a [`Server`](crate::server::Server) onto
//! that vocabulary, writes it, and parses it back for diagnostics.
//!
//! # Examples
//!
//! ```
//! use galena::shoutcast::ConfigFile;
//!
//! let file = ConfigFile::parse("portbase=8000\r\npublicserver=never\r\n").unwrap();
//! assert_eq!(file.get("publicserver"), Some("never"));
//! ```
pub mod config_file;

pub use config_file::{ConfigFile, config_path};
