// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for the client integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use mediawand_client::{
    ClientConfig, ImageProcessingClient, MediaError, PdfRasterizer, RasterDocument,
};

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Client without PDF support.
pub fn image_client() -> ImageProcessingClient {
    init_tracing();
    ImageProcessingClient::new(ClientConfig::default().without_pdf()).unwrap()
}

/// Client whose PDF engine is `rasterizer`.
pub fn pdf_client(rasterizer: MockRasterizer) -> ImageProcessingClient {
    init_tracing();
    ImageProcessingClient::with_rasterizer(ClientConfig::default(), Box::new(rasterizer)).unwrap()
}

// ---------------------------------------------------------------------------
// Encoded images
// ---------------------------------------------------------------------------

pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    }))
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Jpeg)
}

/// A JPEG with `segment` inserted as its first marker segment.
fn jpeg_with_segment(width: u32, height: u32, segment: &[u8]) -> Vec<u8> {
    let plain = jpeg(width, height);
    assert_eq!(&plain[..2], &[0xFF, 0xD8], "JPEG must start with SOI");

    let mut out = Vec::with_capacity(plain.len() + segment.len());
    out.extend_from_slice(&plain[..2]);
    out.extend_from_slice(segment);
    out.extend_from_slice(&plain[2..]);
    out
}

/// A JPEG whose EXIF block says "rotate 90° clockwise" (orientation 6).
pub fn jpeg_with_orientation_6(width: u32, height: u32) -> Vec<u8> {
    #[rustfmt::skip]
    let app1: [u8; 36] = [
        0xFF, 0xE1, 0x00, 0x22,
        b'E', b'x', b'i', b'f', 0x00, 0x00,
        // Big-endian TIFF header, first IFD at offset 8.
        b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08,
        // One entry: Orientation (0x0112), SHORT, count 1, value 6.
        0x00, 0x01,
        0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x06, 0x00, 0x00,
        // No next IFD.
        0x00, 0x00, 0x00, 0x00,
    ];
    jpeg_with_segment(width, height, &app1)
}

/// A JPEG carrying an EXIF segment whose payload is not a TIFF structure.
pub fn jpeg_with_unreadable_exif(width: u32, height: u32) -> Vec<u8> {
    #[rustfmt::skip]
    let app1: [u8; 18] = [
        0xFF, 0xE1, 0x00, 0x10,
        b'E', b'x', b'i', b'f', 0x00, 0x00,
        b'g', b'a', b'r', b'b', b'a', b'g', b'e', b'!',
    ];
    jpeg_with_segment(width, height, &app1)
}

/// Write `bytes` to `dir/name` and return the path.
pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn dimensions_of(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

/// Sorted file names in `dir`.
pub fn files_in_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn format_of(bytes: &[u8]) -> ImageFormat {
    image::guess_format(bytes).unwrap()
}

// ---------------------------------------------------------------------------
// PDF engine double
// ---------------------------------------------------------------------------

/// One page the mock engine will produce.
#[derive(Debug, Clone, Copy)]
pub struct MockPage {
    pub width: u32,
    pub height: u32,
    /// Rendering this page fails.
    pub fails: bool,
    /// Render fully transparent pixels instead of a solid colour.
    pub transparent: bool,
}

impl MockPage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fails: false,
            transparent: false,
        }
    }

    pub fn failing(self) -> Self {
        Self { fails: true, ..self }
    }

    pub fn transparent(self) -> Self {
        Self {
            transparent: true,
            ..self
        }
    }
}

/// Counters shared between a test and its mock engine.
#[derive(Debug, Default)]
pub struct MockStats {
    pub opened: AtomicUsize,
    pub rendered: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub last_dpi: AtomicUsize,
}

/// PDF engine double producing synthetic pages of known size.
pub struct MockRasterizer {
    pages: Vec<MockPage>,
    fail_open: bool,
    render_delay: Duration,
    pub stats: Arc<MockStats>,
}

impl MockRasterizer {
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self {
            pages,
            fail_open: false,
            render_delay: Duration::ZERO,
            stats: Arc::new(MockStats::default()),
        }
    }

    /// `count` identical A4-ish pages.
    pub fn uniform(count: usize) -> Self {
        Self::new(vec![MockPage::new(620, 877); count])
    }

    pub fn unreadable() -> Self {
        Self {
            fail_open: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn with_render_delay(self, delay: Duration) -> Self {
        Self {
            render_delay: delay,
            ..self
        }
    }
}

impl PdfRasterizer for MockRasterizer {
    fn engine_name(&self) -> &str {
        "mock"
    }

    fn open<'a>(
        &'a self,
        path: &Path,
        density_dpi: u32,
    ) -> Result<Box<dyn RasterDocument + 'a>, MediaError> {
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        self.stats
            .last_dpi
            .store(density_dpi as usize, Ordering::SeqCst);
        if self.fail_open {
            return Err(MediaError::processing(format!(
                "failed to read PDF {}",
                path.display()
            )));
        }
        Ok(Box::new(MockDocument { engine: self }))
    }
}

struct MockDocument<'a> {
    engine: &'a MockRasterizer,
}

impl RasterDocument for MockDocument<'_> {
    fn page_count(&self) -> u32 {
        self.engine.pages.len() as u32
    }

    fn render_page(&self, index: u32) -> Result<DynamicImage, MediaError> {
        let stats = &self.engine.stats;
        let active = stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_active.fetch_max(active, Ordering::SeqCst);
        if !self.engine.render_delay.is_zero() {
            thread::sleep(self.engine.render_delay);
        }
        stats.active.fetch_sub(1, Ordering::SeqCst);
        stats.rendered.fetch_add(1, Ordering::SeqCst);

        let page = self.engine.pages[index as usize];
        if page.fails {
            return Err(MediaError::processing(format!(
                "failed to render page {}",
                index + 1
            )));
        }
        let pixel = if page.transparent {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([30, 60, 90, 255])
        };
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            page.width,
            page.height,
            pixel,
        )))
    }
}
