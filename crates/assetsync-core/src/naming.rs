//! File naming convention for sync subjects.
//!
//! A file takes part in sync when its name starts with the reserved marker and
//! carries one of the image extensions, e.g. `$Fern-Green leaves.jpg`. The
//! remainder of the name encodes the catalog display name and description,
//! separated by hyphens.

use serde::{Deserialize, Serialize};

/// Display name and description parsed from a file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedName {
    /// Text before the first hyphen.
    pub display_name: String,
    /// Text between the first and second hyphen, empty when there is none.
    pub description: String,
}

/// Rules deciding which files are sync subjects and how their names parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    marker: char,
    extensions: Vec<String>,
    generated_suffix: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::new('$', vec!["jpg".to_string()], "-watermarked")
    }
}

impl NamingConvention {
    /// Create a convention. Extensions are matched case-insensitively and may
    /// be given with or without a leading dot.
    pub fn new(marker: char, extensions: Vec<String>, generated_suffix: impl Into<String>) -> Self {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self {
            marker,
            extensions,
            generated_suffix: generated_suffix.into(),
        }
    }

    /// Reserved leading character.
    pub fn marker(&self) -> char {
        self.marker
    }

    /// Suffix appended to the stem of generated copies.
    pub fn generated_suffix(&self) -> &str {
        &self.generated_suffix
    }

    /// Whether the extension of `file_name` is one of the image extensions.
    pub fn has_image_extension(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            }
            _ => false,
        }
    }

    /// Marker present and image extension.
    pub fn is_qualifying(&self, file_name: &str) -> bool {
        file_name
            .strip_prefix(self.marker)
            .is_some_and(|rest| self.has_image_extension(rest))
    }

    /// Whether the file is a copy produced by the image transform.
    pub fn is_generated(&self, file_name: &str) -> bool {
        !self.generated_suffix.is_empty() && stem(file_name).ends_with(&self.generated_suffix)
    }

    /// Qualifying and not a generated copy: the file is a primary sync subject.
    pub fn is_sync_subject(&self, file_name: &str) -> bool {
        self.is_qualifying(file_name) && !self.is_generated(file_name)
    }

    /// Name of the generated copy for `file_name`: same stem plus the suffix.
    pub fn generated_file_name(&self, file_name: &str) -> String {
        match file_name.rsplit_once('.') {
            Some((stem, ext)) => format!("{}{}.{}", stem, self.generated_suffix, ext),
            None => format!("{}{}", file_name, self.generated_suffix),
        }
    }

    /// Split a file name into display name and description.
    ///
    /// The marker and the extension are stripped; the remainder is split on the
    /// first hyphen, and the description ends at the next hyphen. Anything after
    /// a second hyphen is dropped.
    pub fn parse(&self, file_name: &str) -> ParsedName {
        let name = file_name.strip_prefix(self.marker).unwrap_or(file_name);
        let name = stem(name);

        match name.split_once('-') {
            None => ParsedName {
                display_name: name.to_string(),
                description: String::new(),
            },
            Some((display_name, rest)) => {
                let description = rest.split('-').next().unwrap_or_default();
                ParsedName {
                    display_name: display_name.to_string(),
                    description: description.to_string(),
                }
            }
        }
    }
}

fn stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}
