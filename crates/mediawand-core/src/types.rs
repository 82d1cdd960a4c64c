// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the mediawand client.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata read from an image without keeping its pixels around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    /// Upper-case format name as reported by the engine (e.g. `JPEG`, `PNG`).
    pub format_name: String,
    /// Stored pixel width, before any orientation is applied.
    pub width: u32,
    /// Stored pixel height, before any orientation is applied.
    pub height: u32,
    /// EXIF orientation code (1..=8), or 0 when the image carries none.
    pub exif_orientation: u16,
    /// Encoded size of the source in bytes; 0 when unknown.
    pub content_length: u64,
}

impl ImageMeta {
    /// Width and height as they appear once the EXIF orientation is applied.
    ///
    /// Orientations 5 through 8 involve a quarter turn and swap the axes.
    pub fn oriented_dimensions(&self) -> (u32, u32) {
        match self.exif_orientation {
            5..=8 => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }
}

/// Output encodings the client knows how to name.
///
/// Parsing is lenient about case and accepts common aliases (`jpg`, `tif`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    Bmp,
    Tiff,
    Avif,
    Ico,
    Tga,
    Qoi,
}

impl OutputFormat {
    /// Resolve a short format name such as `"png"` or `"JPG"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalised = name.trim().trim_start_matches('.').to_ascii_lowercase();
        let format = match normalised.as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" | "jpe" => Self::Jpeg,
            "gif" => Self::Gif,
            "webp" => Self::WebP,
            "bmp" => Self::Bmp,
            "tif" | "tiff" => Self::Tiff,
            "avif" => Self::Avif,
            "ico" => Self::Ico,
            "tga" => Self::Tga,
            "qoi" => Self::Qoi,
            _ => return None,
        };
        Some(format)
    }

    /// Upper-case name used in [`ImageMeta::format_name`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Gif => "GIF",
            Self::WebP => "WEBP",
            Self::Bmp => "BMP",
            Self::Tiff => "TIFF",
            Self::Avif => "AVIF",
            Self::Ico => "ICO",
            Self::Tga => "TGA",
            Self::Qoi => "QOI",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of a PDF-to-images conversion.
///
/// Page failures in per-page mode do not abort the call, so the report is
/// the only place a caller can see which pages were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfConversionReport {
    /// Pages in the source document.
    pub total_pages: u32,
    /// Pages selected for processing after applying `max_pages`.
    pub processed_pages: u32,
    /// Files written, in page order. A montage run has exactly one entry.
    pub written: Vec<PathBuf>,
    /// 1-indexed page numbers that failed and were skipped.
    pub failed_pages: Vec<u32>,
    /// Whether the pages were composed into a single montage.
    pub montage: bool,
}

impl PdfConversionReport {
    /// True when every selected page made it to disk.
    pub fn is_complete(&self) -> bool {
        self.failed_pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_accept_aliases() {
        assert_eq!(OutputFormat::from_name("jpg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_name("JPEG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_name(".tif"), Some(OutputFormat::Tiff));
        assert_eq!(OutputFormat::from_name(" png "), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_name("heic"), None);
        assert_eq!(OutputFormat::from_name(""), None);
    }

    #[test]
    fn quarter_turn_orientations_swap_axes() {
        let meta = ImageMeta {
            format_name: "JPEG".into(),
            width: 400,
            height: 300,
            exif_orientation: 6,
            content_length: 1024,
        };
        assert_eq!(meta.oriented_dimensions(), (300, 400));

        let upright = ImageMeta {
            exif_orientation: 1,
            ..meta
        };
        assert_eq!(upright.oriented_dimensions(), (400, 300));
    }

    #[test]
    fn image_meta_serializes_with_snake_case_fields() {
        let meta = ImageMeta {
            format_name: "PNG".into(),
            width: 10,
            height: 20,
            exif_orientation: 0,
            content_length: 99,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["format_name"], "PNG");
        assert_eq!(json["exif_orientation"], 0);
        assert_eq!(json["content_length"], 99);
    }

    #[test]
    fn report_is_complete_without_failures() {
        let mut report = PdfConversionReport {
            total_pages: 3,
            processed_pages: 3,
            ..Default::default()
        };
        assert!(report.is_complete());
        report.failed_pages.push(2);
        assert!(!report.is_complete());
    }
}
