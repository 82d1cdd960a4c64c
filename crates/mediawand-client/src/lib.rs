// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mediawand-client — The serialized image processing client.
//
// One `ImageProcessingClient` per process: it owns the PDF engine binding and
// funnels every operation through a single lock.

pub mod client;

pub use client::ImageProcessingClient;
pub use mediawand_core::{
    ClientConfig, ErrorKind, ImageMeta, MediaError, OutputFormat, PdfConversionReport,
    ResizeFilter,
};
pub use mediawand_document::{PdfRasterizer, RasterDocument};
