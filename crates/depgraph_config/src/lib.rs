//! Parsing and validation of `depgraph.toml` configuration files.
//!
//! The file is optional: every field has a default, and
//! [`load_config_or_default`] returns the defaults when no file exists.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_config_or_default, CONFIG_FILE};
pub use types::*;
