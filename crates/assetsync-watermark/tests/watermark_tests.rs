//! Watermarker against real images on disk.

use assetsync_config::WatermarkConfig;
use assetsync_core::{ImageTransform, NamingConvention, TransformError};
use assetsync_watermark::Watermarker;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_pixel(width, height, Rgb([20, 20, 200]));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    img.save_with_format(path, ImageFormat::Jpeg).unwrap();
}

fn write_overlay(path: &Path) {
    let img = RgbaImage::from_pixel(40, 20, Rgba([255, 0, 0, 255]));
    img.save_with_format(path, ImageFormat::Png).unwrap();
}

fn decode(bytes: &[u8]) -> RgbImage {
    image::load(Cursor::new(bytes), ImageFormat::Jpeg)
        .unwrap()
        .to_rgb8()
}

fn watermarker(root: &Path, overlay: Option<&Path>) -> Watermarker {
    let config = WatermarkConfig {
        overlay_path: overlay.map(Path::to_path_buf),
        ..WatermarkConfig::default()
    };
    Watermarker::new(root, &config, NamingConvention::default()).unwrap()
}

#[tokio::test]
async fn test_landscape_mark_in_bottom_right_corner() {
    let temp = TempDir::new().unwrap();
    let overlay = temp.path().join("mark.png");
    write_overlay(&overlay);
    let source = temp.path().join("plants/$Rose.jpg");
    write_jpeg(&source, 200, 100);

    let output = watermarker(temp.path(), Some(&overlay))
        .transform(&source, "$Rose.jpg", Path::new("plants/$Rose.jpg"))
        .await
        .unwrap();

    assert_eq!(output.original_bytes, std::fs::read(&source).unwrap());
    assert_eq!(output.transformed_file_name, "$Rose-watermarked.jpg");
    assert_eq!(
        output.transformed_relative_path,
        Path::new("watermarked/plants/$Rose-watermarked.jpg")
    );
    assert_eq!(
        output.transformed_path,
        temp.path().join("watermarked/plants/$Rose-watermarked.jpg")
    );
    assert_eq!(std::fs::read(&output.transformed_path).unwrap(), output.transformed_bytes);

    let copy = decode(&output.transformed_bytes);
    assert_eq!(copy.dimensions(), (200, 100));
    // Mark is 77x39 for a 200px wide landscape image
    let corner = copy.get_pixel(190, 95);
    assert!(corner[0] > 180 && corner[2] < 80, "corner pixel {:?}", corner);
    let clear = copy.get_pixel(10, 10);
    assert!(clear[2] > 150 && clear[0] < 80, "clear pixel {:?}", clear);
    let left_of_mark = copy.get_pixel(110, 95);
    assert!(left_of_mark[2] > 150, "left of mark {:?}", left_of_mark);
}

#[tokio::test]
async fn test_portrait_mark_uses_portrait_ratio() {
    let temp = TempDir::new().unwrap();
    let overlay = temp.path().join("mark.png");
    write_overlay(&overlay);
    let source = temp.path().join("$Fern.jpg");
    write_jpeg(&source, 100, 200);

    let output = watermarker(temp.path(), Some(&overlay))
        .transform(&source, "$Fern.jpg", Path::new("$Fern.jpg"))
        .await
        .unwrap();

    let copy = decode(&output.transformed_bytes);
    assert_eq!(copy.dimensions(), (100, 200));
    // 75px wide mark starts at x = 25
    assert!(copy.get_pixel(35, 195)[0] > 180);
    assert!(copy.get_pixel(10, 195)[2] > 150);
}

#[tokio::test]
async fn test_without_overlay_copy_is_reencoded() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("$Fern.jpg");
    write_jpeg(&source, 64, 48);

    let output = watermarker(temp.path(), None)
        .transform(&source, "$Fern.jpg", Path::new("$Fern.jpg"))
        .await
        .unwrap();

    let copy = decode(&output.transformed_bytes);
    assert_eq!(copy.dimensions(), (64, 48));
    assert!(copy.get_pixel(60, 44)[2] > 150);
}

#[tokio::test]
async fn test_undecodable_source_is_codec_error() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("$Broken.jpg");
    std::fs::write(&source, b"definitely not a jpeg").unwrap();

    let err = watermarker(temp.path(), None)
        .transform(&source, "$Broken.jpg", Path::new("$Broken.jpg"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransformError::Codec { .. }));
    assert!(!temp.path().join("watermarked").exists());
}

#[tokio::test]
async fn test_missing_source_is_io_error() {
    let temp = TempDir::new().unwrap();
    let err = watermarker(temp.path(), None)
        .transform(&temp.path().join("$Gone.jpg"), "$Gone.jpg", Path::new("$Gone.jpg"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransformError::Io { .. }));
}

#[test]
fn test_missing_overlay_fails_construction() {
    let temp = TempDir::new().unwrap();
    let config = WatermarkConfig {
        overlay_path: Some(temp.path().join("absent.png")),
        ..WatermarkConfig::default()
    };

    let err = Watermarker::new(temp.path(), &config, NamingConvention::default()).unwrap_err();
    assert!(matches!(err, TransformError::Io { .. }));
}
