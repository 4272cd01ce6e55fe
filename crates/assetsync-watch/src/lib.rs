//! # assetsync file state reconciliation engine
//!
//! Keeps a tree of marker-named images in step with a remote catalog, using
//! an identity token embedded in each image as the durable link.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────┐    ┌──────────────────┐    ┌──────────────────┐
//! │ InventoryScanner │───▶│      Mirror      │◀───│  EventClassifier │◀── NotifyBackend
//! └──────────────────┘    └──────────────────┘    └──────────────────┘
//!                                  │                       │ SyncEvent
//!                                  ▼                       ▼
//!                         ┌──────────────────┐    ┌──────────────────┐
//!                         │   reconcile::plan│    │  OperationGuard  │
//!                         └──────────────────┘    └──────────────────┘
//!                                  │                       │
//!                                  └──────────┬────────────┘
//!                                             ▼
//!                                    ┌──────────────────┐
//!                                    │   SyncHandler    │──▶ CatalogClient / ImageTransform
//!                                    └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assetsync_core::test_support::{MockCatalogClient, MockImageTransform};
//! use assetsync_watch::{EngineOptions, SyncEngine, SyncHandler, SyncService};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> assetsync_watch::Result<()> {
//! let engine = SyncEngine::initialize("/srv/assets", EngineOptions::default()).await?;
//! let handler = SyncHandler::new(
//!     engine,
//!     Arc::new(MockCatalogClient::new()),
//!     Arc::new(MockImageTransform::new("/srv/assets")),
//! );
//! let service = SyncService::new(handler);
//! service.reconcile().await?;
//! service
//!     .watch_until(Duration::from_millis(100), async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod backends;
mod classifier;
mod engine;
pub mod error;
mod events;
mod file_scanner;
mod filter;
mod guard;
pub mod handlers;
mod mirror;
pub mod reconcile;
mod service;

#[cfg(test)]
mod test_images;

pub use backends::NotifyBackend;
pub use classifier::EventClassifier;
pub use engine::{EngineOptions, SyncEngine};
pub use error::{Error, Result};
pub use events::{ChangeKind, RawChange, SyncEvent, SyncEventKind};
pub use file_scanner::{InventoryScanner, ScanReport, SkippedFile};
pub use filter::{NoExclusion, PathExclusion, ReservedRootDir};
pub use guard::{InFlight, OperationGuard};
pub use handlers::SyncHandler;
pub use mirror::Mirror;
pub use reconcile::{ReconcileAction, ReconcileSummary};
pub use service::SyncService;
