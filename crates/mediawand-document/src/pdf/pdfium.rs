// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDFium-backed rasterizer using the `pdfium-render` crate.
//
// PDFium keeps process-global C state. Binding initialises it and dropping
// the `Pdfium` value tears it down, so exactly one `PdfiumRasterizer` should
// be alive at a time and all calls into it must be serialized.

use std::path::Path;

use image::{DynamicImage, RgbaImage};
use mediawand_core::error::{MediaError, Result};
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument};

use super::rasterizer::{PdfRasterizer, RasterDocument};

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Rasterizer owning a bound PDFium library.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind PDFium from `library_dir` if given, else from the system library
    /// search path.
    #[instrument]
    pub fn bind(library_dir: Option<&Path>) -> Result<Self> {
        let bindings = match library_dir {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|err| MediaError::processing(format!("failed to bind PDFium: {}", err)))?;

        info!("PDFium bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PdfRasterizer for PdfiumRasterizer {
    fn engine_name(&self) -> &str {
        "pdfium"
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn open<'a>(&'a self, path: &Path, density_dpi: u32) -> Result<Box<dyn RasterDocument + 'a>> {
        let document = self.pdfium.load_pdf_from_file(path, None).map_err(|err| {
            MediaError::processing(format!("failed to read PDF {}: {}", path.display(), err))
        })?;
        let scale = density_dpi as f32 / POINTS_PER_INCH;
        debug!(scale, "PDF opened");
        Ok(Box::new(PdfiumDocument { document, scale }))
    }
}

/// A PDFium document plus the render scale derived from the requested density.
struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    scale: f32,
}

impl RasterDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> u32 {
        u32::try_from(self.document.pages().len()).unwrap_or(0)
    }

    fn render_page(&self, index: u32) -> Result<DynamicImage> {
        let page_number = index + 1;
        let page_index = index.try_into().map_err(|_| {
            MediaError::processing(format!("page {} is out of range", page_number))
        })?;
        let page = self.document.pages().get(page_index).map_err(|err| {
            MediaError::processing(format!("failed to load page {}: {}", page_number, err))
        })?;

        let config = PdfRenderConfig::new().scale_page_by_factor(self.scale);
        let bitmap = page.render_with_config(&config).map_err(|err| {
            MediaError::processing(format!("failed to render page {}: {}", page_number, err))
        })?;

        let width = u32::try_from(bitmap.width()).unwrap_or(0);
        let height = u32::try_from(bitmap.height()).unwrap_or(0);
        let pixels = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(|| {
            MediaError::processing(format!(
                "page {} rendered to an invalid {}x{} bitmap",
                page_number, width, height
            ))
        })?;

        debug!(page_number, width, height, "Page rasterized");
        Ok(DynamicImage::ImageRgba8(pixels))
    }
}
