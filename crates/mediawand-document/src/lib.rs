// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mediawand-document — Engine adapters for the mediawand client.
//
// Provides image operations (decode, EXIF auto-orient, resize, flatten,
// encode), vertical montage composition, and PDF page rasterization through
// PDFium. Nothing in this crate locks; serialization is the client's job.

pub mod image;
pub mod pdf;

// Re-export the primary types so callers can use `mediawand_document::ImageProcessor` etc.
pub use crate::image::montage::stack_vertically;
pub use crate::image::processor::ImageProcessor;
pub use crate::pdf::pages::{page_output_path, pages_in_range};
pub use crate::pdf::pdfium::PdfiumRasterizer;
pub use crate::pdf::rasterizer::{PdfRasterizer, RasterDocument};
