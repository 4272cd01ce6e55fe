//! Value references and table merging for the TOML document.
//!
//! Any string value of the exact form `{env:VAR}` or `{file:path}` is
//! replaced before the document is deserialized:
//!
//! ```toml
//! [catalog]
//! access_token = "{env:CONTENTFUL_MANAGEMENT_TOKEN}"
//! space_id = "{file:~/.secrets/contentful-space}"
//! ```
//!
//! - `{env:VAR}` must name a set variable
//! - `{file:path}` loads a `.toml` file as structured data, any other file as
//!   its trimmed text; relative paths resolve against the config file's
//!   directory and `~/` expands to the home directory

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ReferenceError;

const FILE_REF_PREFIX: &str = "{file:";
const ENV_REF_PREFIX: &str = "{env:";
const REF_SUFFIX: &str = "}";

/// Resolve a referenced path relative to `base_dir`.
pub fn resolve_path(path: &str, base_dir: &Path) -> PathBuf {
    if path.starts_with('/') {
        return PathBuf::from(path);
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    base_dir.join(path)
}

fn extract<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    s.strip_prefix(prefix)?.strip_suffix(REF_SUFFIX)
}

fn read_file_as_value(path: &Path) -> Result<toml::Value, ReferenceError> {
    if !path.exists() {
        return Err(ReferenceError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| ReferenceError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| ReferenceError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    } else {
        Ok(toml::Value::String(content.trim().to_string()))
    }
}

/// Replace every `{file:..}` and `{env:..}` string in `value`.
///
/// All failures are collected rather than stopping at the first.
pub fn process_references(
    value: &mut toml::Value,
    base_dir: &Path,
) -> Result<(), Vec<ReferenceError>> {
    let mut errors = Vec::new();
    process_recursive(value, base_dir, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn process_recursive(value: &mut toml::Value, base_dir: &Path, errors: &mut Vec<ReferenceError>) {
    match value {
        toml::Value::String(s) => {
            if let Some(file_path) = extract(s, FILE_REF_PREFIX) {
                let resolved = resolve_path(file_path, base_dir);
                debug!(reference = file_path, resolved = %resolved.display(), "resolving file reference");

                match read_file_as_value(&resolved) {
                    Ok(file_value) => *value = file_value,
                    Err(e) => {
                        warn!("Failed to load file reference {}: {}", file_path, e);
                        errors.push(e);
                    }
                }
            } else if let Some(var_name) = extract(s, ENV_REF_PREFIX) {
                debug!(var = var_name, "resolving env reference");

                match std::env::var(var_name) {
                    Ok(env_value) => *value = toml::Value::String(env_value),
                    Err(_) => {
                        warn!("Environment variable not found: {}", var_name);
                        errors.push(ReferenceError::EnvVarNotFound {
                            var_name: var_name.to_string(),
                        });
                    }
                }
            }
        }
        toml::Value::Array(arr) => {
            for item in arr.iter_mut() {
                process_recursive(item, base_dir, errors);
            }
        }
        toml::Value::Table(table) => {
            for (_key, val) in table.iter_mut() {
                process_recursive(val, base_dir, errors);
            }
        }
        _ => {}
    }
}

/// Deep-merge `source` into `target`.
///
/// Tables merge key by key; any other value in `source`, arrays included,
/// replaces the one in `target`.
pub fn merge_toml_values(target: &mut toml::Value, source: &toml::Value) {
    match (target, source) {
        (toml::Value::Table(target_table), toml::Value::Table(source_table)) => {
            for (key, source_value) in source_table {
                if let Some(target_value) = target_table.get_mut(key) {
                    merge_toml_values(target_value, source_value);
                } else {
                    target_table.insert(key.clone(), source_value.clone());
                }
            }
        }
        (target, source) => {
            *target = source.clone();
        }
    }
}
