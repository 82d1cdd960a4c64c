// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, Result};

/// Resampling filter used for every resize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

/// Settings applied by the client to every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Compression quality (1-100) for lossy encoders. Lossless encoders ignore it.
    pub quality: u8,
    /// Rasterization density for PDF pages, in dots per inch.
    pub pdf_density_dpi: u32,
    /// Resampling filter for all resize operations.
    pub resize_filter: ResizeFilter,
    /// Directory holding the PDFium shared library. `None` uses the system library.
    pub pdfium_library_path: Option<PathBuf>,
    /// Bind PDFium at start-up. When false, PDF conversion is unavailable.
    pub enable_pdf: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            quality: 95,
            pdf_density_dpi: 300,
            resize_filter: ResizeFilter::Lanczos3,
            pdfium_library_path: None,
            enable_pdf: true,
        }
    }
}

impl ClientConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Reject values no engine call could honour.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(MediaError::Config(format!(
                "quality must be within 1..=100, got {}",
                self.quality
            )));
        }
        if self.pdf_density_dpi == 0 {
            return Err(MediaError::Config(
                "pdf_density_dpi must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Same config with PDF support switched off.
    pub fn without_pdf(self) -> Self {
        Self {
            enable_pdf: false,
            ..self
        }
    }
}
