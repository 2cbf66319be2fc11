// Marquee - Rental & events marketing site built with Rust
// Copyright (C) 2025 Marquee Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Media file storage.
//!
//! Uploads land under `<storage>/media/YYYY/MM/<uuid>.<ext>`. Raster images
//! also get resized copies next to the original, one per configured width
//! narrower than the original.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use image::{imageops::FilterType, GenericImageView};
use marquee_core::models::media::{Media, MediaVariant};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Magic bytes for common image formats
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const GIF_MAGIC: &[u8] = b"GIF";
const WEBP_MAGIC: &[u8] = b"RIFF";
const SVG_MAGIC: &[u8] = b"<svg";
const SVG_MAGIC_ALT: &[u8] = b"<?xml";

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
            ImageFormat::Svg => "svg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    /// Detect format from file content
    pub fn detect(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(anyhow!("File too small to determine format"));
        }

        if data.starts_with(JPEG_MAGIC) {
            Ok(ImageFormat::Jpeg)
        } else if data.starts_with(PNG_MAGIC) {
            Ok(ImageFormat::Png)
        } else if data.starts_with(GIF_MAGIC) {
            Ok(ImageFormat::Gif)
        } else if data.starts_with(WEBP_MAGIC) && data.len() > 12 && &data[8..12] == b"WEBP" {
            Ok(ImageFormat::Webp)
        } else if data.starts_with(SVG_MAGIC) || data.starts_with(SVG_MAGIC_ALT) {
            Ok(ImageFormat::Svg)
        } else {
            Err(anyhow!("Unsupported image format"))
        }
    }

    /// Formats that get resized copies. GIFs are skipped so animations
    /// survive untouched.
    fn encoder(&self) -> Option<image::ImageFormat> {
        match self {
            ImageFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageFormat::Png => Some(image::ImageFormat::Png),
            ImageFormat::Webp => Some(image::ImageFormat::WebP),
            ImageFormat::Gif | ImageFormat::Svg => None,
        }
    }
}

/// Image metadata extracted from uploaded files
#[derive(Debug, Clone)]
pub struct ImageMetadata {
    pub format: ImageFormat,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: usize,
}

/// Extract metadata from image data
pub fn extract_image_metadata(data: &[u8]) -> Result<ImageMetadata> {
    let format = ImageFormat::detect(data)?;

    let (width, height) = match format {
        ImageFormat::Svg => (None, None),
        _ => match image::load_from_memory(data) {
            Ok(img) => {
                let (w, h) = img.dimensions();
                (Some(w), Some(h))
            }
            Err(_) => (None, None),
        },
    };

    Ok(ImageMetadata {
        format,
        width,
        height,
        size: data.len(),
    })
}

/// Storage-relative directory for uploads made at `date`
pub fn media_directory(date: DateTime<Utc>) -> String {
    format!("media/{}", date.format("%Y/%m"))
}

/// Validate that a client supplied filename is safe to record
pub fn validate_upload_filename(filename: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(anyhow!("Filename cannot be empty"));
    }
    if filename.len() > 255 {
        return Err(anyhow!("Filename too long"));
    }
    if filename.contains('\0') || filename.contains('/') || filename.contains('\\') {
        return Err(anyhow!("Filename contains invalid characters"));
    }
    Ok(())
}

/// Files of the media library on local disk
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    variant_widths: Vec<u32>,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, variant_widths: Vec<u32>) -> Self {
        let mut variant_widths = variant_widths;
        variant_widths.sort_unstable();
        variant_widths.dedup();
        Self {
            root: root.into(),
            variant_widths,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the upload and its variants, returning the unsaved media row
    pub fn store(&self, data: &[u8], original_name: Option<&str>) -> Result<Media> {
        if let Some(name) = original_name {
            validate_upload_filename(name)?;
        }
        let metadata = extract_image_metadata(data)?;

        let directory = media_directory(Utc::now());
        let stem = Uuid::new_v4().to_string();
        let path = format!("{}/{}.{}", directory, stem, metadata.format.extension());

        let absolute = self.absolute(&path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create upload directory: {:?}", parent))?;
        }
        fs::write(&absolute, data)
            .with_context(|| format!("Failed to write file: {:?}", absolute))?;

        let variants = match self.write_variants(data, &metadata, &directory, &stem) {
            Ok(variants) => variants,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Could not generate image variants");
                Vec::new()
            }
        };

        let mut media = Media::new(
            path,
            metadata.format.mime_type().to_string(),
            metadata.size as i64,
        );
        media.original_name = original_name.map(str::to_string);
        media.width = metadata.width;
        media.height = metadata.height;
        media.variants = variants;
        Ok(media)
    }

    fn write_variants(
        &self,
        data: &[u8],
        metadata: &ImageMetadata,
        directory: &str,
        stem: &str,
    ) -> Result<Vec<MediaVariant>> {
        let (Some(encoder), Some(original_width)) = (metadata.format.encoder(), metadata.width)
        else {
            return Ok(Vec::new());
        };

        let widths: Vec<u32> = self
            .variant_widths
            .iter()
            .copied()
            .filter(|w| *w > 0 && *w < original_width)
            .collect();
        if widths.is_empty() {
            return Ok(Vec::new());
        }

        let img = image::load_from_memory(data).context("Failed to decode image")?;
        let mut variants = Vec::with_capacity(widths.len());
        for width in widths {
            let resized = img.resize(width, u32::MAX, FilterType::Lanczos3);
            let path = format!(
                "{}/{}-{}w.{}",
                directory,
                stem,
                width,
                metadata.format.extension()
            );
            let absolute = self.absolute(&path)?;
            resized
                .save_with_format(&absolute, encoder)
                .with_context(|| format!("Failed to write variant: {:?}", absolute))?;
            variants.push(MediaVariant {
                name: format!("{}w", width),
                path,
                width: Some(resized.width()),
            });
        }
        Ok(variants)
    }

    /// Deletes the original and every variant. Files already gone are
    /// not an error.
    pub fn remove(&self, media: &Media) -> Result<()> {
        for path in media.all_paths() {
            let absolute = self.absolute(path)?;
            match fs::remove_file(&absolute) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!(path = %path, "Media file already removed");
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to delete {:?}", absolute))
                }
            }
        }
        Ok(())
    }

    fn absolute(&self, relative: &str) -> Result<PathBuf> {
        Media::validate_path(relative).map_err(|e| anyhow!(e))?;
        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::png_bytes;
    use tempfile::TempDir;

    #[test]
    fn test_image_format_detection() {
        let jpeg_data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(ImageFormat::detect(&jpeg_data).unwrap(), ImageFormat::Jpeg);

        let png_data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(ImageFormat::detect(&png_data).unwrap(), ImageFormat::Png);

        let gif_data = b"GIF89aXX".to_vec();
        assert_eq!(ImageFormat::detect(&gif_data).unwrap(), ImageFormat::Gif);

        let mut webp_data = b"RIFF".to_vec();
        webp_data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        webp_data.extend_from_slice(b"WEBPVP8 ");
        assert_eq!(ImageFormat::detect(&webp_data).unwrap(), ImageFormat::Webp);

        let invalid_data = vec![0x00; 8];
        assert!(ImageFormat::detect(&invalid_data).is_err());

        assert!(ImageFormat::detect(&[0xFF, 0xD8]).is_err());
    }

    #[test]
    fn test_media_directory_layout() {
        let date = DateTime::parse_from_rfc3339("2025-03-07T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(media_directory(date), "media/2025/03");
    }

    #[test]
    fn test_validate_upload_filename() {
        assert!(validate_upload_filename("tent.jpg").is_ok());
        assert!(validate_upload_filename("").is_err());
        assert!(validate_upload_filename("../etc/passwd").is_err());
        assert!(validate_upload_filename(&"a".repeat(256)).is_err());
    }

    #[test]
    fn test_store_writes_original_and_narrower_variants() -> Result<()> {
        let dir = TempDir::new()?;
        let storage = MediaStorage::new(dir.path(), vec![960, 480, 1600]);

        let media = storage.store(&png_bytes(1200, 800), Some("marquee.png"))?;

        assert!(media.path.starts_with("media/"));
        assert!(media.path.ends_with(".png"));
        assert_eq!(media.mime_type, "image/png");
        assert_eq!(media.width, Some(1200));
        assert_eq!(media.height, Some(800));
        assert_eq!(media.original_name.as_deref(), Some("marquee.png"));
        assert!(dir.path().join(&media.path).exists());

        let widths: Vec<Option<u32>> = media.variants.iter().map(|v| v.width).collect();
        assert_eq!(widths, vec![Some(480), Some(960)]);
        for variant in &media.variants {
            assert!(dir.path().join(&variant.path).exists());
        }

        let small = image::open(dir.path().join(&media.variants[0].path))?;
        assert_eq!(small.dimensions(), (480, 320));
        Ok(())
    }

    #[test]
    fn test_svg_has_no_variants() -> Result<()> {
        let dir = TempDir::new()?;
        let storage = MediaStorage::new(dir.path(), vec![16]);

        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"></svg>"#;
        let media = storage.store(svg, Some("logo.svg"))?;

        assert_eq!(media.mime_type, "image/svg+xml");
        assert!(media.variants.is_empty());
        assert!(media.width.is_none());
        Ok(())
    }

    #[test]
    fn test_store_rejects_non_images() {
        let dir = TempDir::new().unwrap();
        let storage = MediaStorage::new(dir.path(), vec![480]);
        assert!(storage.store(b"#!/bin/sh\necho hi\n", Some("run.sh")).is_err());
    }

    #[test]
    fn test_remove_deletes_all_files() -> Result<()> {
        let dir = TempDir::new()?;
        let storage = MediaStorage::new(dir.path(), vec![100]);
        let media = storage.store(&png_bytes(300, 200), None)?;
        assert_eq!(media.variants.len(), 1);

        storage.remove(&media)?;
        for path in media.all_paths() {
            assert!(!dir.path().join(path).exists());
        }

        // Second removal finds nothing and still succeeds
        storage.remove(&media)?;
        Ok(())
    }
}
