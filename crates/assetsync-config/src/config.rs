//! Configuration model.

use assetsync_core::NamingConvention;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Top-level configuration of the sync service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Watched root directory.
    pub asset_directory: PathBuf,

    /// File naming rules.
    pub naming: NamingConfig,

    /// Watermark transform settings.
    pub watermark: WatermarkConfig,

    /// Remote catalog connection.
    pub catalog: CatalogConfig,

    /// File watcher tuning.
    pub watch: WatchConfig,

    /// Log output.
    pub logging: LoggingConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            asset_directory: PathBuf::from("."),
            naming: NamingConfig::default(),
            watermark: WatermarkConfig::default(),
            catalog: CatalogConfig::default(),
            watch: WatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Which files take part in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Reserved leading character, a single character.
    pub marker: String,
    /// Image extensions, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Suffix of generated copies.
    pub generated_suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            marker: "$".to_string(),
            extensions: vec!["jpg".to_string()],
            generated_suffix: "-watermarked".to_string(),
        }
    }
}

/// Settings of the watermark transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Directory below the root receiving generated copies; skipped by scans.
    pub output_dir: String,
    /// PNG overlay image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_path: Option<PathBuf>,
    /// JPEG quality of the generated copy.
    pub quality: u8,
    /// Overlay width as a share of the image width, landscape and square.
    pub landscape_ratio: f32,
    /// Overlay width as a share of the image width, portrait.
    pub portrait_ratio: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            output_dir: "watermarked".to_string(),
            overlay_path: None,
            quality: 88,
            landscape_ratio: 0.387,
            portrait_ratio: 0.749,
        }
    }
}

/// Connection to the Contentful management API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Space identifier.
    pub space_id: String,
    /// Environment within the space.
    pub environment: String,
    /// Management API token.
    pub access_token: String,
    /// Locale of the asset fields.
    pub locale: String,
    /// Management API base URL.
    pub api_url: String,
    /// Upload API base URL.
    pub upload_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Pause after triggering asset processing.
    pub processing_wait_ms: u64,
    /// Page size when listing assets.
    pub page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            space_id: String::new(),
            environment: "master".to_string(),
            access_token: String::new(),
            locale: "en-US".to_string(),
            api_url: "https://api.contentful.com".to_string(),
            upload_url: "https://upload.contentful.com".to_string(),
            timeout_secs: 30,
            processing_wait_ms: 2000,
            page_size: 100,
        }
    }
}

impl CatalogConfig {
    /// Whether credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.space_id.trim().is_empty() && !self.access_token.trim().is_empty()
    }
}

/// File watcher tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Debounce window for filesystem events.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

/// Log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level.
    pub level: String,
    /// Directory for daily rolling log files; console only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl SyncConfig {
    /// Check value ranges and that the watched root exists.
    pub fn validate(&self) -> Result<()> {
        if self.naming.marker.chars().count() != 1 {
            return Err(ConfigError::invalid(
                "naming.marker",
                "must be exactly one character",
            ));
        }
        if self.naming.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "naming.extensions",
                "at least one extension is required",
            ));
        }
        if !(1..=100).contains(&self.watermark.quality) {
            return Err(ConfigError::invalid(
                "watermark.quality",
                "must be between 1 and 100",
            ));
        }
        for (field, ratio) in [
            ("watermark.landscape_ratio", self.watermark.landscape_ratio),
            ("watermark.portrait_ratio", self.watermark.portrait_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(ConfigError::invalid(field, "must be in (0, 1]"));
            }
        }
        if !self.asset_directory.is_dir() {
            return Err(ConfigError::invalid(
                "asset_directory",
                format!("{} is not a directory", self.asset_directory.display()),
            ));
        }
        Ok(())
    }

    /// Naming convention described by the `[naming]` section.
    pub fn naming_convention(&self) -> NamingConvention {
        NamingConvention::new(
            self.naming.marker.chars().next().unwrap_or('$'),
            self.naming.extensions.clone(),
            self.naming.generated_suffix.clone(),
        )
    }

    /// Copy with secrets replaced, for display.
    pub fn masked(&self) -> Self {
        let mut config = self.clone();
        if !config.catalog.access_token.is_empty() {
            config.catalog.access_token = "********".to_string();
        }
        config
    }

    /// The configuration as TOML, secrets masked.
    pub fn display_as_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.masked()).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// The configuration as JSON, secrets masked.
    pub fn display_as_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.masked())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config(temp: &TempDir) -> SyncConfig {
        SyncConfig {
            asset_directory: temp.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.naming.marker, "$");
        assert_eq!(config.naming.extensions, vec!["jpg"]);
        assert_eq!(config.watermark.output_dir, "watermarked");
        assert_eq!(config.watermark.quality, 88);
        assert_eq!(config.catalog.environment, "master");
        assert_eq!(config.watch.debounce_ms, 100);
        assert!(!config.catalog.is_configured());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SyncConfig = toml::from_str(
            r#"
asset_directory = "/srv/assets"

[catalog]
space_id = "space"
"#,
        )
        .unwrap();

        assert_eq!(config.asset_directory, PathBuf::from("/srv/assets"));
        assert_eq!(config.catalog.space_id, "space");
        assert_eq!(config.catalog.locale, "en-US");
        assert_eq!(config.naming, NamingConfig::default());
    }

    #[test]
    fn test_validate_accepts_defaults_with_existing_root() {
        let temp = TempDir::new().unwrap();
        assert!(valid_config(&temp).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let temp = TempDir::new().unwrap();

        let mut config = valid_config(&temp);
        config.naming.marker = String::new();
        assert!(config.validate().is_err());

        let mut config = valid_config(&temp);
        config.naming.marker = "$$".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config(&temp);
        config.naming.extensions.clear();
        assert!(config.validate().is_err());

        let mut config = valid_config(&temp);
        config.watermark.quality = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config(&temp);
        config.watermark.portrait_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = valid_config(&temp);
        config.asset_directory = temp.path().join("missing");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("asset_directory"));
    }

    #[test]
    fn test_naming_convention_from_config() {
        let mut config = SyncConfig::default();
        config.naming.marker = "#".to_string();
        config.naming.extensions = vec!["JPEG".to_string()];

        let naming = config.naming_convention();
        assert!(naming.is_qualifying("#Leaf.jpeg"));
        assert!(!naming.is_qualifying("$Leaf.jpeg"));
    }

    #[test]
    fn test_display_masks_token() {
        let mut config = SyncConfig::default();
        config.catalog.access_token = "CFPAT-secret".to_string();

        let toml = config.display_as_toml().unwrap();
        let json = config.display_as_json().unwrap();
        assert!(!toml.contains("CFPAT-secret"));
        assert!(!json.contains("CFPAT-secret"));
        assert!(toml.contains("********"));
    }
}
