//! Remote asset catalog backed by the Contentful Content Management API.
//!
//! [`ContentfulClient`] implements [`assetsync_core::CatalogClient`]: asset
//! ids are the identity tokens embedded in the images, asset titles are their
//! display names.

#![warn(missing_docs)]

mod client;
pub mod error;
mod wire;

pub use client::ContentfulClient;
pub use error::{CatalogError, Result};
