//! # assetsync core
//!
//! Shared vocabulary for the assetsync workspace: the mirror record type, the
//! file naming convention, the identity codec that embeds a catalog record
//! identifier inside an image's EXIF block, and the traits that describe the
//! external collaborators (remote catalog, image transform).
//!
//! Higher-level crates depend on these abstractions; concrete implementations
//! live in `assetsync-catalog` and `assetsync-watermark`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod identity;
pub mod naming;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use error::{MetadataError, RemoteAction, RemoteOperationError, TransformError};
pub use identity::{IdentityCodec, TOKEN_MARKER};
pub use naming::{NamingConvention, ParsedName};
pub use traits::{CatalogClient, ImageTransform, TransformOutput};
pub use types::{IdentityToken, ImageRecord, RecordRef};
