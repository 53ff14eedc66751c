//! Raster export
//!
//! Encodes a finished raster as PNG, JPEG or BMP. The file is encoded in
//! memory and written in a single call, so a failed encode never leaves a
//! truncated image behind.
//!
//! JPEG has no alpha channel; the alpha is dropped on export.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use clap::ValueEnum;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use log::info;

use crate::canvas::Raster;
use crate::error::{BioartError, Result};

/// JPEG encoder quality (0-100)
const JPEG_QUALITY: u8 = 92;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ImageFormat {
    Png,
    #[value(name = "jpg", alias = "jpeg")]
    Jpeg,
    Bmp,
}

impl ImageFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        ext.parse().map_err(|_| BioartError::UnsupportedFormat {
            format: if ext.is_empty() {
                format!("no extension on '{}'", path.display())
            } else {
                ext
            },
        })
    }

    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Bmp => "bmp",
        }
    }

    pub fn supports_alpha(&self) -> bool {
        !matches!(self, ImageFormat::Jpeg)
    }
}

impl FromStr for ImageFormat {
    type Err = BioartError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "bmp" => Ok(ImageFormat::Bmp),
            other => Err(BioartError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encode a raster into image file bytes
pub fn encode(raster: &Raster, format: ImageFormat) -> Result<Vec<u8>> {
    let buffer = RgbaImage::from_raw(raster.width(), raster.height(), raster.as_bytes().to_vec())
        .ok_or_else(|| BioartError::Encode {
            reason: format!(
                "raster data does not match {}x{}",
                raster.width(),
                raster.height()
            ),
        })?;
    let image = DynamicImage::ImageRgba8(buffer);

    let mut out = Cursor::new(Vec::new());
    let written = match format {
        ImageFormat::Png => image.write_to(&mut out, ImageOutputFormat::Png),
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .write_to(&mut out, ImageOutputFormat::Jpeg(JPEG_QUALITY)),
        ImageFormat::Bmp => image.write_to(&mut out, ImageOutputFormat::Bmp),
    };
    written.map_err(|e| BioartError::Encode {
        reason: e.to_string(),
    })?;

    Ok(out.into_inner())
}

/// Save a raster to `path`.
///
/// The format is `format` when given, otherwise inferred from the file
/// extension. Returns the format used.
///
/// # Errors
/// * `UnsupportedFormat` - If the format is neither given nor recognised
/// * `IoWrite` - If the file cannot be written
pub fn save(raster: &Raster, path: &Path, format: Option<ImageFormat>) -> Result<ImageFormat> {
    let format = match format {
        Some(f) => f,
        None => ImageFormat::from_path(path)?,
    };

    let bytes = encode(raster, format)?;
    std::fs::write(path, &bytes).map_err(|source| BioartError::IoWrite {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "Image saved to: {} ({}, {}x{}, {} bytes)",
        path.display(),
        format,
        raster.width(),
        raster.height(),
        bytes.len()
    );
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasCompositor;
    use crate::config::{Background, Resolution};
    use crate::liquid::Rgba;
    use tempfile::tempdir;
    use test_case::test_case;

    fn raster() -> Raster {
        let mut comp = CanvasCompositor::new(Resolution::new(16, 8), Background::Black, 1.0);
        comp.paint(4, 4, Rgba::RED, 2);
        comp.export()
    }

    #[test_case("out.png", ImageFormat::Png)]
    #[test_case("out.PNG", ImageFormat::Png)]
    #[test_case("out.jpg", ImageFormat::Jpeg)]
    #[test_case("out.jpeg", ImageFormat::Jpeg)]
    #[test_case("dir/out.bmp", ImageFormat::Bmp)]
    fn test_format_from_path(path: &str, expected: ImageFormat) {
        assert_eq!(ImageFormat::from_path(Path::new(path)).unwrap(), expected);
    }

    #[test_case("out.gif")]
    #[test_case("out")]
    fn test_unsupported_format(path: &str) {
        let err = ImageFormat::from_path(Path::new(path)).unwrap_err();
        assert!(matches!(err, BioartError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_png_roundtrip_preserves_pixels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("art.png");
        let raster = raster();

        assert_eq!(save(&raster, &path, None).unwrap(), ImageFormat::Png);

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert_eq!(decoded.as_raw(), raster.as_bytes());
    }

    #[test]
    fn test_explicit_format_overrides_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("art.out");
        save(&raster(), &path, Some(ImageFormat::Bmp)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"BM");
    }

    #[test]
    fn test_jpeg_drops_alpha_and_keeps_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("art.jpg");
        save(&raster(), &path, None).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), 16);
        assert_eq!(decoded.height(), 8);
        assert!(!ImageFormat::Jpeg.supports_alpha());
    }

    #[test]
    fn test_write_failure_is_io_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("art.png");
        let err = save(&raster(), &path, None).unwrap_err();
        assert!(matches!(err, BioartError::IoWrite { .. }));
        assert!(!path.exists());
    }
}
