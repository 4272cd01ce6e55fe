//! # assetsync configuration
//!
//! Typed configuration for the sync service, loaded from a TOML file.
//!
//! ## Features
//!
//! - Every section optional, with defaults matching the production setup
//! - Named profiles (`[profiles.<name>]`) deep-merged over the base document
//! - `{env:VAR}` and `{file:path}` references for secrets
//! - `ASSETSYNC_*` environment overrides, then caller overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assetsync_config::{ConfigLoader, LoadOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load(&LoadOptions::default())?;
//!     config.validate()?;
//!     println!("watching {}", config.asset_directory.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod loader;
mod references;

pub use config::*;
pub use error::{ConfigError, ReferenceError, Result};
pub use loader::*;
pub use references::{merge_toml_values, process_references, resolve_path};
