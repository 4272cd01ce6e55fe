//! Contracts for the external collaborators of the sync engine.
//!
//! The engine decides *which* operation should fire; these traits are how the
//! orchestration layer carries it out. Implementations must be `Send + Sync`
//! and usable as trait objects.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{RemoteOperationError, TransformError};
use crate::types::{IdentityToken, RecordRef};

/// Remote asset catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Create a record and return its reference. The identifier of the
    /// returned reference becomes the identity token of the image.
    async fn create_record(
        &self,
        display_name: &str,
        description: &str,
        file_name: &str,
    ) -> Result<RecordRef, RemoteOperationError>;

    /// Change the display name and description of a record.
    async fn update_name(
        &self,
        token: &IdentityToken,
        display_name: &str,
        description: &str,
    ) -> Result<(), RemoteOperationError>;

    /// Delete a record.
    async fn delete_record(&self, token: &IdentityToken) -> Result<(), RemoteOperationError>;

    /// Replace the asset payload of a record.
    async fn upload_asset(
        &self,
        token: &IdentityToken,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), RemoteOperationError>;

    /// All records currently known to the catalog.
    async fn list_records(&self) -> Result<Vec<RecordRef>, RemoteOperationError>;
}

/// Result of transforming an image into its published copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// Bytes of the source image as read by the transform.
    pub original_bytes: Vec<u8>,
    /// Encoded bytes of the generated copy (also written to disk).
    pub transformed_bytes: Vec<u8>,
    /// Absolute path of the generated copy.
    pub transformed_path: PathBuf,
    /// Path of the generated copy relative to the watched root.
    pub transformed_relative_path: PathBuf,
    /// File name of the generated copy.
    pub transformed_file_name: String,
}

/// Produces the published copy of an image (e.g. with a visible mark).
#[async_trait]
pub trait ImageTransform: Send + Sync {
    /// Transform the image at `path` and write the generated copy to disk.
    async fn transform(
        &self,
        path: &Path,
        file_name: &str,
        relative_path: &Path,
    ) -> Result<TransformOutput, TransformError>;
}
