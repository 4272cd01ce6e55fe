//! Inventory scanner building the initial mirror.

use assetsync_core::{IdentityCodec, ImageRecord, NamingConvention};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::filter::PathExclusion;

/// A qualifying file left out of the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// File that was skipped.
    pub path: PathBuf,
    /// Why.
    pub reason: String,
}

/// Result of a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// One record per readable sync subject, in depth-first, name order.
    pub records: Vec<ImageRecord>,
    /// Qualifying files that could not be read.
    pub skipped: Vec<SkippedFile>,
}

/// Build an [`ImageRecord`] from the bytes of a file.
pub(crate) fn record_from_bytes(root: &Path, path: PathBuf, bytes: &[u8]) -> ImageRecord {
    let token = IdentityCodec::read(bytes);
    let fingerprint = IdentityCodec::fingerprint(bytes);
    ImageRecord::new(root, path, token, fingerprint)
}

/// Walks the watched tree once.
///
/// Unreadable files are skipped and reported; an unlistable directory fails
/// the whole scan.
#[derive(Clone)]
pub struct InventoryScanner {
    naming: NamingConvention,
    exclusion: Arc<dyn PathExclusion>,
}

impl InventoryScanner {
    /// Create a scanner.
    pub fn new(naming: NamingConvention, exclusion: Arc<dyn PathExclusion>) -> Self {
        Self { naming, exclusion }
    }

    /// Scan `root` depth-first.
    pub async fn scan(&self, root: &Path) -> Result<ScanReport> {
        info!(root = %root.display(), "scanning inventory");

        let mut report = ScanReport::default();
        self.scan_directory_recursive(root, root, &mut report).await?;

        info!(
            records = report.records.len(),
            skipped = report.skipped.len(),
            "inventory scan complete"
        );
        Ok(report)
    }

    fn scan_directory_recursive<'a>(
        &'a self,
        root: &'a Path,
        dir_path: &'a Path,
        report: &'a mut ScanReport,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            trace!("Scanning directory: {:?}", dir_path);

            let scan_err = |source| Error::Scan {
                path: dir_path.to_path_buf(),
                source,
            };

            let mut entries = tokio::fs::read_dir(dir_path).await.map_err(scan_err)?;
            let mut paths = Vec::new();
            while let Some(entry) = entries.next_entry().await.map_err(scan_err)? {
                paths.push(entry.path());
            }
            paths.sort();

            for path in paths {
                if self.exclusion.is_excluded(root, &path) {
                    debug!(path = %path.display(), filter = self.exclusion.name(), "excluded");
                    continue;
                }

                if path.is_dir() {
                    self.scan_directory_recursive(root, &path, report).await?;
                    continue;
                }

                let is_subject = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| self.naming.is_sync_subject(n));
                if !is_subject {
                    continue;
                }

                match tokio::fs::read(&path).await {
                    Ok(bytes) => {
                        let record = record_from_bytes(root, path, &bytes);
                        trace!(file = %record.relative_path.display(), token = record.token_display(), "scanned");
                        report.records.push(record);
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable file");
                        report.skipped.push(SkippedFile {
                            path,
                            reason: e.to_string(),
                        });
                    }
                }
            }

            Ok(())
        })
    }
}

impl std::fmt::Debug for InventoryScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryScanner")
            .field("naming", &self.naming)
            .field("exclusion", &self.exclusion.name())
            .finish()
    }
}
