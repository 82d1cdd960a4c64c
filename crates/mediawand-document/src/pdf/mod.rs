// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page rasterization and per-page output naming.

pub mod pages;
pub mod pdfium;
pub mod rasterizer;

pub use pdfium::PdfiumRasterizer;
pub use rasterizer::{PdfRasterizer, RasterDocument};
