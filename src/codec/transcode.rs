//! PNG to JPEG transcoding for cache assets
//!
//! Best effort only: any failure hands the original bytes back untouched.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, ImageFormat, RgbImage};
use log::{info, warn};

use crate::config::GatewayConfig;
use crate::storage::AssetKind;

const SOURCE_EXTENSION: &str = "png";
pub const TARGET_EXTENSION: &str = ".jpg";

/// Whether the compiled-in image codecs can decode PNG and encode JPEG.
///
/// Resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecCapability {
    available: bool,
}

impl CodecCapability {
    pub fn detect() -> Self {
        Self {
            available: ImageFormat::Png.reading_enabled() && ImageFormat::Jpeg.writing_enabled(),
        }
    }

    pub fn unavailable() -> Self {
        Self { available: false }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

/// Bytes to write plus the extension they should be written with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoded {
    pub bytes: Vec<u8>,
    /// Extension including the leading dot
    pub extension: String,
    pub converted: bool,
}

impl Transcoded {
    fn passthrough(bytes: Vec<u8>, extension: &str) -> Self {
        Self {
            bytes,
            extension: extension.to_string(),
            converted: false,
        }
    }
}

/// Convert PNG image assets to JPEG when transcoding is enabled.
///
/// Transparent pixels are composited onto white; the alpha channel is not kept.
pub fn maybe_transcode(
    bytes: Vec<u8>,
    source_ext: &str,
    kind: AssetKind,
    config: &GatewayConfig,
    capability: CodecCapability,
) -> Transcoded {
    let is_png = source_ext
        .trim_start_matches('.')
        .eq_ignore_ascii_case(SOURCE_EXTENSION);

    if kind != AssetKind::Image || !config.transcode_enabled || !is_png {
        return Transcoded::passthrough(bytes, source_ext);
    }

    if !capability.is_available() {
        return Transcoded::passthrough(bytes, source_ext);
    }

    match png_to_jpeg(&bytes, config.transcode_quality) {
        Ok(jpeg) => {
            info!(
                "Transcoded PNG to JPEG ({} -> {} bytes, quality {})",
                bytes.len(),
                jpeg.len(),
                config.transcode_quality
            );
            Transcoded {
                bytes: jpeg,
                extension: TARGET_EXTENSION.to_string(),
                converted: true,
            }
        }
        Err(e) => {
            warn!("PNG to JPEG transcoding failed, keeping original: {}", e);
            Transcoded::passthrough(bytes, source_ext)
        }
    }
}

fn png_to_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>, ImageError> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    let flattened = flatten_onto_white(&decoded);

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    DynamicImage::ImageRgb8(flattened).write_with_encoder(encoder)?;
    Ok(out)
}

/// Composite any alpha channel over an opaque white background
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(img: RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn config() -> GatewayConfig {
        GatewayConfig::with_primary_root("/srv/media")
    }

    #[test]
    fn transparent_png_becomes_white_jpeg() {
        let png = png_bytes(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0])));

        let out = maybe_transcode(
            png,
            ".png",
            AssetKind::Image,
            &config(),
            CodecCapability::detect(),
        );

        assert!(out.converted);
        assert_eq!(out.extension, ".jpg");
        let decoded = image::load_from_memory_with_format(&out.bytes, ImageFormat::Jpeg)
            .unwrap()
            .to_rgb8();
        let px = decoded.get_pixel(4, 4);
        assert!(px.0.iter().all(|c| *c > 245), "expected white, got {:?}", px);
    }

    #[test]
    fn non_png_is_passed_through() {
        let bytes = vec![0xff, 0xd8, 0xff, 0xe0, 1, 2, 3];

        let out = maybe_transcode(
            bytes.clone(),
            ".jpg",
            AssetKind::Image,
            &config(),
            CodecCapability::detect(),
        );

        assert!(!out.converted);
        assert_eq!(out.bytes, bytes);
        assert_eq!(out.extension, ".jpg");
    }

    #[test]
    fn videos_and_disabled_config_are_passed_through() {
        let png = png_bytes(RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255])));

        let video = maybe_transcode(
            png.clone(),
            ".png",
            AssetKind::Video,
            &config(),
            CodecCapability::detect(),
        );
        assert!(!video.converted);

        let mut disabled = config();
        disabled.transcode_enabled = false;
        let out = maybe_transcode(
            png.clone(),
            ".png",
            AssetKind::Image,
            &disabled,
            CodecCapability::detect(),
        );
        assert!(!out.converted);
        assert_eq!(out.bytes, png);
    }

    #[test]
    fn missing_codec_is_identity() {
        let png = png_bytes(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])));
        let out = maybe_transcode(
            png.clone(),
            "PNG",
            AssetKind::Image,
            &config(),
            CodecCapability::unavailable(),
        );
        assert!(!out.converted);
        assert_eq!(out.bytes, png);
        assert_eq!(out.extension, "PNG");
    }

    #[test]
    fn corrupt_png_falls_back_to_original() {
        let garbage = b"definitely not a png".to_vec();
        let out = maybe_transcode(
            garbage.clone(),
            ".png",
            AssetKind::Image,
            &config(),
            CodecCapability::detect(),
        );
        assert!(!out.converted);
        assert_eq!(out.bytes, garbage);
        assert_eq!(out.extension, ".png");
    }
}
