// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page selection and per-page output naming for PDF extraction.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Number of pages to process: all of them when `max_pages` is 0, otherwise
/// at most `max_pages`.
pub fn pages_in_range(total_pages: u32, max_pages: u32) -> u32 {
    if max_pages > 0 {
        total_pages.min(max_pages)
    } else {
        total_pages
    }
}

/// Output path for 1-indexed `page_number`.
///
/// With more than one page in range, `_page<N>` is inserted before the
/// extension (`out.png` → `out_page2.png`). A single page keeps `base`
/// unchanged.
pub fn page_output_path(base: &Path, page_number: u32, pages_in_range: u32) -> PathBuf {
    if pages_in_range <= 1 {
        return base.to_path_buf();
    }

    let mut name = base.file_stem().map(OsString::from).unwrap_or_default();
    name.push(format!("_page{page_number}"));
    if let Some(ext) = base.extension() {
        name.push(".");
        name.push(ext);
    }
    base.with_file_name(name)
}
