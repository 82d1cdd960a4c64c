// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine-agnostic trait definitions for PDF rasterization.
//
// The client depends on these traits rather than on PDFium directly, so the
// PDF path can run against any engine that turns pages into pixels.

use std::path::Path;

use image::DynamicImage;
use mediawand_core::error::Result;

/// A bound PDF engine able to open documents for rasterization.
///
/// Implementations are not required to be thread-safe; the client holds its
/// single lock for the whole lifetime of every opened document.
pub trait PdfRasterizer: Send {
    /// Engine name for logs (e.g. "pdfium").
    fn engine_name(&self) -> &str;

    /// Open the document at `path`, rendering pages at `density_dpi`.
    fn open<'a>(&'a self, path: &Path, density_dpi: u32) -> Result<Box<dyn RasterDocument + 'a>>;
}

/// An opened multi-page document. Dropping it releases the engine handle.
pub trait RasterDocument {
    /// Total number of pages.
    fn page_count(&self) -> u32;

    /// Render the 0-indexed page as a standalone image.
    fn render_page(&self, index: u32) -> Result<DynamicImage>;
}
