//! Mock Implementations for Testing
//!
//! In-memory stand-ins for [`CatalogClient`] and [`ImageTransform`]. Both are:
//!
//! - **Observable**: every call is recorded for assertions
//! - **Configurable**: individual operations can be made to fail
//! - **Cheap to clone**: clones share state, so a test can keep a handle
//!   after passing the mock to the engine
//!
//! # Examples
//!
//! ```rust,ignore
//! use assetsync_core::test_support::{CatalogCall, MockCatalogClient};
//! use assetsync_core::CatalogClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = MockCatalogClient::new();
//! let record = catalog.create_record("Fern", "Green", "$Fern-Green.jpg").await?;
//!
//! assert_eq!(record.id, "asset-1");
//! assert!(matches!(catalog.calls()[0], CatalogCall::Create { .. }));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{RemoteAction, RemoteOperationError, TransformError};
use crate::naming::NamingConvention;
use crate::traits::{CatalogClient, ImageTransform, TransformOutput};
use crate::types::{IdentityToken, RecordRef};

// ============================================================================
// Mock Catalog Client
// ============================================================================

/// A call received by [`MockCatalogClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    /// `create_record`
    Create {
        /// Display name sent.
        display_name: String,
        /// Description sent.
        description: String,
        /// File name sent.
        file_name: String,
    },
    /// `update_name`
    UpdateName {
        /// Target record.
        token: String,
        /// New display name.
        display_name: String,
        /// New description.
        description: String,
    },
    /// `delete_record`
    Delete {
        /// Target record.
        token: String,
    },
    /// `upload_asset`
    Upload {
        /// Target record.
        token: String,
        /// File name sent.
        file_name: String,
        /// Payload size.
        len: usize,
    },
    /// `list_records`
    List,
}

#[derive(Debug, Default)]
struct CatalogState {
    /// id -> display name
    records: BTreeMap<String, String>,
    /// Payloads by id, last upload wins
    uploads: BTreeMap<String, Vec<u8>>,
    calls: Vec<CatalogCall>,
    failing: HashSet<RemoteAction>,
    next_id: u64,
}

/// In-memory remote catalog.
///
/// Created records get sequential ids (`asset-1`, `asset-2`, ...).
#[derive(Debug, Clone, Default)]
pub struct MockCatalogClient {
    state: Arc<Mutex<CatalogState>>,
}

impl MockCatalogClient {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, as if it had been created in an earlier session
    pub fn with_record(self, id: &str, display_name: &str) -> Self {
        self.state
            .lock()
            .records
            .insert(id.to_string(), display_name.to_string());
        self
    }

    /// Make every call of `action` fail until cleared
    pub fn fail_on(&self, action: RemoteAction) {
        self.state.lock().failing.insert(action);
    }

    /// Stop failing `action`
    pub fn clear_failure(&self, action: RemoteAction) {
        self.state.lock().failing.remove(&action);
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<CatalogCall> {
        self.state.lock().calls.clone()
    }

    /// Current display name of a record
    pub fn display_name(&self, id: &str) -> Option<String> {
        self.state.lock().records.get(id).cloned()
    }

    /// Number of records held
    pub fn record_count(&self) -> usize {
        self.state.lock().records.len()
    }

    /// Last payload uploaded for a record
    pub fn uploaded(&self, id: &str) -> Option<Vec<u8>> {
        self.state.lock().uploads.get(id).cloned()
    }

    fn check(
        state: &CatalogState,
        action: RemoteAction,
        target: &str,
    ) -> Result<(), RemoteOperationError> {
        if state.failing.contains(&action) {
            Err(RemoteOperationError::new(action, target, "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogClient for MockCatalogClient {
    async fn create_record(
        &self,
        display_name: &str,
        description: &str,
        file_name: &str,
    ) -> Result<RecordRef, RemoteOperationError> {
        let mut state = self.state.lock();
        state.calls.push(CatalogCall::Create {
            display_name: display_name.to_string(),
            description: description.to_string(),
            file_name: file_name.to_string(),
        });
        Self::check(&state, RemoteAction::Create, file_name)?;

        state.next_id += 1;
        let id = format!("asset-{}", state.next_id);
        state.records.insert(id.clone(), display_name.to_string());
        Ok(RecordRef::new(id, display_name))
    }

    async fn update_name(
        &self,
        token: &IdentityToken,
        display_name: &str,
        description: &str,
    ) -> Result<(), RemoteOperationError> {
        let mut state = self.state.lock();
        state.calls.push(CatalogCall::UpdateName {
            token: token.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
        });
        Self::check(&state, RemoteAction::UpdateName, token.as_str())?;

        match state.records.get_mut(token.as_str()) {
            Some(name) => {
                *name = display_name.to_string();
                Ok(())
            }
            None => Err(RemoteOperationError::new(
                RemoteAction::UpdateName,
                token.as_str(),
                "no such record",
            )),
        }
    }

    async fn delete_record(&self, token: &IdentityToken) -> Result<(), RemoteOperationError> {
        let mut state = self.state.lock();
        state.calls.push(CatalogCall::Delete {
            token: token.to_string(),
        });
        Self::check(&state, RemoteAction::Delete, token.as_str())?;

        state.uploads.remove(token.as_str());
        match state.records.remove(token.as_str()) {
            Some(_) => Ok(()),
            None => Err(RemoteOperationError::new(
                RemoteAction::Delete,
                token.as_str(),
                "no such record",
            )),
        }
    }

    async fn upload_asset(
        &self,
        token: &IdentityToken,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), RemoteOperationError> {
        let mut state = self.state.lock();
        state.calls.push(CatalogCall::Upload {
            token: token.to_string(),
            file_name: file_name.to_string(),
            len: bytes.len(),
        });
        Self::check(&state, RemoteAction::Upload, token.as_str())?;

        state.uploads.insert(token.to_string(), bytes);
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<RecordRef>, RemoteOperationError> {
        let mut state = self.state.lock();
        state.calls.push(CatalogCall::List);
        Self::check(&state, RemoteAction::List, "catalog")?;

        Ok(state
            .records
            .iter()
            .map(|(id, name)| RecordRef::new(id.clone(), name.clone()))
            .collect())
    }
}

// ============================================================================
// Mock Image Transform
// ============================================================================

#[derive(Debug, Default)]
struct TransformState {
    calls: Vec<PathBuf>,
    failing: bool,
}

/// Transform that writes an unmodified copy of the source.
///
/// The copy lands under `<root>/<output_dir>/<relative dir>/` with the
/// generated file name of the naming convention, like the real watermarker.
#[derive(Debug, Clone)]
pub struct MockImageTransform {
    root: PathBuf,
    output_dir: String,
    naming: NamingConvention,
    state: Arc<Mutex<TransformState>>,
}

impl MockImageTransform {
    /// Create a transform writing below `root/watermarked`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_dir: "watermarked".to_string(),
            naming: NamingConvention::default(),
            state: Arc::new(Mutex::new(TransformState::default())),
        }
    }

    /// Make every call fail until cleared
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Source paths transformed so far
    pub fn calls(&self) -> Vec<PathBuf> {
        self.state.lock().calls.clone()
    }
}

#[async_trait]
impl ImageTransform for MockImageTransform {
    async fn transform(
        &self,
        path: &Path,
        file_name: &str,
        relative_path: &Path,
    ) -> Result<TransformOutput, TransformError> {
        {
            let mut state = self.state.lock();
            state.calls.push(path.to_path_buf());
            if state.failing {
                return Err(TransformError::Codec {
                    path: path.to_path_buf(),
                    message: "injected failure".to_string(),
                });
            }
        }

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| TransformError::Io { path, source }
        };

        let original_bytes = std::fs::read(path).map_err(io_err(path))?;

        let transformed_file_name = self.naming.generated_file_name(file_name);
        let parent = relative_path.parent().unwrap_or_else(|| Path::new(""));
        let transformed_relative_path = Path::new(&self.output_dir)
            .join(parent)
            .join(&transformed_file_name);
        let transformed_path = self.root.join(&transformed_relative_path);

        if let Some(dir) = transformed_path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err(dir))?;
        }
        std::fs::write(&transformed_path, &original_bytes).map_err(io_err(&transformed_path))?;

        Ok(TransformOutput {
            transformed_bytes: original_bytes.clone(),
            original_bytes,
            transformed_path,
            transformed_relative_path,
            transformed_file_name,
        })
    }
}
