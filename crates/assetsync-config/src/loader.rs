//! Loading configuration from file, environment and caller overrides.
//!
//! Precedence, lowest first: defaults, config file, selected profile,
//! `ASSETSYNC_*` environment variables, [`ConfigOverrides`].

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::error::{ConfigError, Result};
use crate::references::{merge_toml_values, process_references};

/// Environment variable selecting a profile when none is passed explicitly.
pub const PROFILE_ENV: &str = "ASSETSYNC_PROFILE";

/// When set, the default config file is not consulted.
pub const TEST_MODE_ENV: &str = "ASSETSYNC_TEST_MODE";

/// Values supplied by the caller, typically from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Watched root.
    pub asset_directory: Option<PathBuf>,
    /// Log level.
    pub log_level: Option<String>,
    /// Log directory.
    pub log_directory: Option<PathBuf>,
}

/// Inputs to [`ConfigLoader::load`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file; must exist when given.
    pub config_file: Option<PathBuf>,
    /// Profile to overlay; falls back to `ASSETSYNC_PROFILE`.
    pub profile: Option<String>,
    /// Highest-precedence values.
    pub overrides: ConfigOverrides,
}

/// Loads [`SyncConfig`].
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with precedence: defaults < file < profile < env < overrides
    pub fn load(options: &LoadOptions) -> Result<SyncConfig> {
        let profile = options
            .profile
            .clone()
            .or_else(|| std::env::var(PROFILE_ENV).ok().filter(|p| !p.is_empty()));

        let mut config = match Self::config_path(options.config_file.clone())? {
            Some(path) => {
                info!(path = %path.display(), "loading configuration");
                Self::load_from_file(&path, profile.as_deref())?
            }
            None => {
                if let Some(name) = profile {
                    return Err(ConfigError::UnknownProfile(name));
                }
                debug!("no config file found, using defaults");
                SyncConfig::default()
            }
        };

        Self::apply_env(&mut config)?;
        Self::apply_overrides(&mut config, &options.overrides);
        Ok(config)
    }

    /// Parse a config file, overlaying `profile` and resolving references.
    pub fn load_from_file(path: &Path, profile: Option<&str>) -> Result<SyncConfig> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, path, base_dir, profile)
    }

    /// Parse TOML text. `path` is only used in error messages.
    pub fn parse(
        content: &str,
        path: &Path,
        base_dir: &Path,
        profile: Option<&str>,
    ) -> Result<SyncConfig> {
        let parse_err = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let mut document: toml::Value =
            toml::from_str(content).map_err(|e| parse_err(e.to_string()))?;

        let profiles = match &mut document {
            toml::Value::Table(table) => table.remove("profiles"),
            _ => None,
        };

        if let Some(name) = profile {
            let overlay = profiles
                .as_ref()
                .and_then(|p| p.get(name))
                .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?;
            debug!(profile = name, "applying profile");
            merge_toml_values(&mut document, overlay);
        }

        process_references(&mut document, base_dir).map_err(ConfigError::References)?;

        document
            .try_into::<SyncConfig>()
            .map_err(|e| parse_err(e.to_string()))
    }

    /// Default config file: `<config dir>/assetsync/config.toml`.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("assetsync").join("config.toml"))
    }

    /// Write an example config file.
    pub fn create_example(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, EXAMPLE_CONFIG).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn config_path(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::Read {
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                    path,
                });
            }
            return Ok(Some(path));
        }

        if std::env::var(TEST_MODE_ENV).is_ok() {
            return Ok(None);
        }

        Ok(Self::default_config_path().ok().filter(|p| p.exists()))
    }

    fn apply_env(config: &mut SyncConfig) -> Result<()> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        if let Some(dir) = var("ASSETSYNC_ASSET_DIRECTORY") {
            config.asset_directory = PathBuf::from(dir);
        }
        if let Some(space) = var("ASSETSYNC_SPACE_ID") {
            config.catalog.space_id = space;
        }
        if let Some(env) = var("ASSETSYNC_ENVIRONMENT") {
            config.catalog.environment = env;
        }
        if let Some(token) = var("ASSETSYNC_ACCESS_TOKEN") {
            config.catalog.access_token = token;
        }
        if let Some(overlay) = var("ASSETSYNC_OVERLAY_PATH") {
            config.watermark.overlay_path = Some(PathBuf::from(overlay));
        }
        if let Some(level) = var("ASSETSYNC_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(dir) = var("ASSETSYNC_LOG_DIR") {
            config.logging.directory = Some(PathBuf::from(dir));
        }
        if let Some(ms) = var("ASSETSYNC_DEBOUNCE_MS") {
            config.watch.debounce_ms = ms.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "ASSETSYNC_DEBOUNCE_MS".to_string(),
                message: format!("'{}' is not a number of milliseconds", ms),
            })?;
        }
        Ok(())
    }

    fn apply_overrides(config: &mut SyncConfig, overrides: &ConfigOverrides) {
        if let Some(dir) = &overrides.asset_directory {
            config.asset_directory = dir.clone();
        }
        if let Some(level) = &overrides.log_level {
            config.logging.level = level.clone();
        }
        if let Some(dir) = &overrides.log_directory {
            config.logging.directory = Some(dir.clone());
        }
    }
}

const EXAMPLE_CONFIG: &str = r#"# assetsync configuration
# Location: ~/.config/assetsync/config.toml

# Directory tree to keep in sync
asset_directory = "/home/user/Pictures/catalog"

[naming]
# Files whose names start with the marker are synced
marker = "$"
extensions = ["jpg"]
# Suffix of generated watermarked copies (never synced themselves)
generated_suffix = "-watermarked"

[watermark]
# Generated copies are written below <asset_directory>/<output_dir>
output_dir = "watermarked"
overlay_path = "/home/user/.config/assetsync/overlay.png"
quality = 88
landscape_ratio = 0.387
portrait_ratio = 0.749

[catalog]
space_id = "your-space-id"
environment = "master"
# Keep the token out of the file
access_token = "{env:CONTENTFUL_MANAGEMENT_TOKEN}"
locale = "en-US"

[watch]
debounce_ms = 100

[logging]
level = "info"
# directory = "/var/log/assetsync"

# Profiles are merged over the settings above when selected with
# --profile or ASSETSYNC_PROFILE
[profiles.development]
asset_directory = "/home/user/Pictures/catalog-dev"
catalog = { environment = "development" }
logging = { level = "debug" }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BASE: &str = r#"
asset_directory = "/srv/assets"

[catalog]
space_id = "space"
environment = "master"

[profiles.development]
asset_directory = "/srv/dev-assets"
catalog = { environment = "development" }
"#;

    #[test]
    fn test_parse_without_profile_ignores_profiles() {
        let config = ConfigLoader::parse(BASE, Path::new("c.toml"), Path::new("."), None).unwrap();

        assert_eq!(config.asset_directory, PathBuf::from("/srv/assets"));
        assert_eq!(config.catalog.environment, "master");
    }

    #[test]
    fn test_parse_with_profile_overlays() {
        let config = ConfigLoader::parse(
            BASE,
            Path::new("c.toml"),
            Path::new("."),
            Some("development"),
        )
        .unwrap();

        assert_eq!(config.asset_directory, PathBuf::from("/srv/dev-assets"));
        assert_eq!(config.catalog.environment, "development");
        assert_eq!(config.catalog.space_id, "space");
    }

    #[test]
    fn test_unknown_profile() {
        let err = ConfigLoader::parse(BASE, Path::new("c.toml"), Path::new("."), Some("prod"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile(ref p) if p == "prod"));
    }

    #[test]
    fn test_type_mismatch_is_parse_error() {
        let err = ConfigLoader::parse(
            "[watch]\ndebounce_ms = \"soon\"",
            Path::new("c.toml"),
            Path::new("."),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_example_config_parses() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        ConfigLoader::create_example(&path).unwrap();

        std::env::set_var("CONTENTFUL_MANAGEMENT_TOKEN_EXAMPLE_TEST", "x");
        let content = std::fs::read_to_string(&path)
            .unwrap()
            .replace(
                "{env:CONTENTFUL_MANAGEMENT_TOKEN}",
                "{env:CONTENTFUL_MANAGEMENT_TOKEN_EXAMPLE_TEST}",
            );
        let config = ConfigLoader::parse(&content, &path, temp.path(), Some("development")).unwrap();
        std::env::remove_var("CONTENTFUL_MANAGEMENT_TOKEN_EXAMPLE_TEST");

        assert_eq!(config.catalog.access_token, "x");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.watermark.quality, 88);
    }
}
