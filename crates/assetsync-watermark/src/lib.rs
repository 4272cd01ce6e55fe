//! Watermarking image transform.
//!
//! [`Watermarker`] produces the published copy of an image: the overlay mark
//! scaled relative to the image width and composited at the bottom-right
//! corner, re-encoded as JPEG below the reserved output directory.

#![warn(missing_docs)]

use assetsync_config::WatermarkConfig;
use assetsync_core::{ImageTransform, NamingConvention, TransformError, TransformOutput};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Applies the overlay mark to images below a root.
#[derive(Debug, Clone)]
pub struct Watermarker {
    root: PathBuf,
    output_dir: String,
    naming: NamingConvention,
    overlay: Option<Arc<RgbaImage>>,
    quality: u8,
    landscape_ratio: f64,
    portrait_ratio: f64,
}

impl Watermarker {
    /// Create a transform for the tree at `root`, loading the overlay once.
    ///
    /// Without an overlay the copy is only re-encoded.
    pub fn new(
        root: impl Into<PathBuf>,
        config: &WatermarkConfig,
        naming: NamingConvention,
    ) -> Result<Self, TransformError> {
        let overlay = match &config.overlay_path {
            Some(path) => Some(Arc::new(load_overlay(path)?)),
            None => {
                warn!("no overlay configured, published copies carry no mark");
                None
            }
        };

        Ok(Self {
            root: root.into(),
            output_dir: config.output_dir.clone(),
            naming,
            overlay,
            quality: config.quality.clamp(1, 100),
            landscape_ratio: f64::from(config.landscape_ratio),
            portrait_ratio: f64::from(config.portrait_ratio),
        })
    }

    /// `<stem><suffix>.jpg`
    pub fn output_file_name(&self, file_name: &str) -> String {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        format!("{}{}.jpg", stem, self.naming.generated_suffix())
    }

    /// Path of the copy relative to the root.
    pub fn output_relative_path(&self, file_name: &str, relative_path: &Path) -> PathBuf {
        let parent = relative_path.parent().unwrap_or_else(|| Path::new(""));
        Path::new(&self.output_dir)
            .join(parent)
            .join(self.output_file_name(file_name))
    }
}

fn load_overlay(path: &Path) -> Result<RgbaImage, TransformError> {
    let bytes = std::fs::read(path).map_err(|source| TransformError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let overlay = image::load_from_memory(&bytes).map_err(|e| TransformError::Codec {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(overlay.to_rgba8())
}

/// Width of the mark for an image of `width` x `height`.
fn mark_width(width: u32, height: u32, landscape_ratio: f64, portrait_ratio: f64) -> u32 {
    let ratio = if width >= height {
        landscape_ratio
    } else {
        portrait_ratio
    };
    ((width as f64 * ratio).round() as u32).max(1)
}

struct MarkParams {
    overlay: Option<Arc<RgbaImage>>,
    quality: u8,
    landscape_ratio: f64,
    portrait_ratio: f64,
}

/// Decode, mark and re-encode. CPU bound.
fn render(source: &[u8], params: &MarkParams) -> Result<Vec<u8>, String> {
    let base = image::load_from_memory(source).map_err(|e| e.to_string())?;
    let mut canvas = base.to_rgba8();
    let (width, height) = canvas.dimensions();

    if let Some(overlay) = &params.overlay {
        let mark_w = mark_width(width, height, params.landscape_ratio, params.portrait_ratio);
        let mark_h = ((overlay.height() as f64 * mark_w as f64 / overlay.width().max(1) as f64)
            .round() as u32)
            .max(1);
        let mark = imageops::resize(overlay.as_ref(), mark_w, mark_h, FilterType::Lanczos3);
        imageops::overlay(
            &mut canvas,
            &mark,
            width as i64 - mark_w as i64,
            height as i64 - mark_h as i64,
        );
    }

    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, params.quality)
        .encode_image(&rgb)
        .map_err(|e| e.to_string())?;
    Ok(out)
}

#[async_trait]
impl ImageTransform for Watermarker {
    async fn transform(
        &self,
        path: &Path,
        file_name: &str,
        relative_path: &Path,
    ) -> Result<TransformOutput, TransformError> {
        let original_bytes = tokio::fs::read(path)
            .await
            .map_err(|source| TransformError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let params = MarkParams {
            overlay: self.overlay.clone(),
            quality: self.quality,
            landscape_ratio: self.landscape_ratio,
            portrait_ratio: self.portrait_ratio,
        };
        let source = original_bytes.clone();
        let transformed_bytes = tokio::task::spawn_blocking(move || render(&source, &params))
            .await
            .map_err(|e| TransformError::Task(e.to_string()))?
            .map_err(|message| TransformError::Codec {
                path: path.to_path_buf(),
                message,
            })?;

        let transformed_relative_path = self.output_relative_path(file_name, relative_path);
        let transformed_path = self.root.join(&transformed_relative_path);
        if let Some(parent) = transformed_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| TransformError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&transformed_path, &transformed_bytes)
            .await
            .map_err(|source| TransformError::Io {
                path: transformed_path.clone(),
                source,
            })?;

        debug!(
            source = %relative_path.display(),
            copy = %transformed_relative_path.display(),
            size = transformed_bytes.len(),
            "watermarked copy written"
        );

        Ok(TransformOutput {
            original_bytes,
            transformed_bytes,
            transformed_file_name: self.output_file_name(file_name),
            transformed_path,
            transformed_relative_path,
        })
    }
}
