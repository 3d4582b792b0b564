//! JPEG converters for photos the catalogue cannot store as-is.
//!
//! `image` has no HEIF decoder, so real HEIC files go through an external
//! tool ([`CommandJpegConverter`]). [`RasterJpegConverter`] re-encodes
//! anything `image` can decode and is the fallback when no tool is configured.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use async_trait::async_trait;
use domains::ports::ImageConverter;
use domains::SelectedImage;
use image::codecs::jpeg::JpegEncoder;
use tokio::process::Command;

const JPEG_MIME: &str = "image/jpeg";
const MAX_QUALITY: u8 = 100;

fn jpeg_file_name(original: &str) -> String {
    Path::new(original)
        .with_extension("jpg")
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "converted.jpg".to_string())
}

/// Decodes with `image` and re-encodes as JPEG at maximum quality.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterJpegConverter;

#[async_trait]
impl ImageConverter for RasterJpegConverter {
    async fn to_jpeg(&self, image: &SelectedImage) -> anyhow::Result<SelectedImage> {
        let data = image.data.clone();
        let jpeg = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<u8>> {
            let decoded = image::load_from_memory(&data).context("decoding image")?;
            let rgb = decoded.to_rgb8();
            let mut out = Cursor::new(Vec::new());
            JpegEncoder::new_with_quality(&mut out, MAX_QUALITY)
                .encode_image(&rgb)
                .context("encoding JPEG")?;
            Ok(out.into_inner())
        })
        .await
        .context("conversion task failed")??;

        tracing::debug!(file = %image.file_name, bytes = jpeg.len(), "image re-encoded as JPEG");
        Ok(SelectedImage::new(jpeg_file_name(&image.file_name), JPEG_MIME, jpeg))
    }
}

/// Runs an external converter as `<program> -q 100 <input> <output>`,
/// the calling convention of libheif's `heif-convert`.
#[derive(Debug, Clone)]
pub struct CommandJpegConverter {
    program: PathBuf,
}

impl CommandJpegConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl ImageConverter for CommandJpegConverter {
    async fn to_jpeg(&self, image: &SelectedImage) -> anyhow::Result<SelectedImage> {
        let scratch = tempfile::tempdir().context("creating scratch directory")?;
        let input = scratch.path().join("input.heic");
        let output = scratch.path().join("output.jpg");
        tokio::fs::write(&input, &image.data)
            .await
            .context("writing scratch input")?;

        let result = Command::new(&self.program)
            .arg("-q")
            .arg(MAX_QUALITY.to_string())
            .arg(&input)
            .arg(&output)
            .output()
            .await
            .with_context(|| format!("running {}", self.program.display()))?;

        if !result.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program.display(),
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        let jpeg = tokio::fs::read(&output)
            .await
            .context("reading converted JPEG")?;
        tracing::debug!(file = %image.file_name, bytes = jpeg.len(), "HEIC converted");
        Ok(SelectedImage::new(jpeg_file_name(&image.file_name), JPEG_MIME, jpeg))
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, ImageFormat, RgbImage};

    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(4, 4))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn raster_converter_produces_jpeg() {
        let source = SelectedImage::new("IMG_0042.png", "image/png", png_bytes());

        let converted = RasterJpegConverter.to_jpeg(&source).await.unwrap();

        assert_eq!(converted.content_type, "image/jpeg");
        assert_eq!(converted.file_name, "IMG_0042.jpg");
        assert_eq!(image::guess_format(&converted.data).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn raster_converter_rejects_undecodable_input() {
        let source = SelectedImage::new("IMG_0042.HEIC", "image/heic", b"ftypheic....".to_vec());
        assert!(RasterJpegConverter.to_jpeg(&source).await.is_err());
    }

    #[tokio::test]
    async fn missing_command_is_an_error() {
        let converter = CommandJpegConverter::new("/nonexistent/heif-convert");
        let source = SelectedImage::new("IMG_0042.HEIC", "image/heic", b"ftypheic".to_vec());
        assert!(converter.to_jpeg(&source).await.is_err());
    }

    #[test]
    fn converted_name_keeps_the_stem() {
        assert_eq!(jpeg_file_name("IMG_0042.HEIC"), "IMG_0042.jpg");
        assert_eq!(jpeg_file_name(""), "converted.jpg");
    }
}
