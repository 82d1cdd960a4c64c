// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processing client — a serialized facade over the image codecs and
// the PDF rasterizer.
//
// Every public operation takes the same lock before touching an engine.
// PDFium is not safe for concurrent use from several callers, and the lock
// is what makes the client shareable across threads. Do not split it into
// per-operation locks unless every bound engine is known to be thread-safe.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use mediawand_core::error::{MediaError, Result};
use mediawand_core::{ClientConfig, ImageMeta, OutputFormat, PdfConversionReport};
use mediawand_document::image::encode::format_from_path;
use mediawand_document::image::processor::WHITE;
use mediawand_document::{
    ImageProcessor, PdfRasterizer, PdfiumRasterizer, page_output_path, pages_in_range,
    stack_vertically,
};
use tracing::{debug, error, info, instrument, warn};

/// State guarded by the client lock.
struct Engine {
    /// Bound PDF engine, `None` when PDF support is disabled or unavailable.
    rasterizer: Option<Box<dyn PdfRasterizer>>,
}

/// Serialized image processing client.
///
/// Create one per process with [`ImageProcessingClient::new`] and tear it
/// down with [`ImageProcessingClient::close`] (or by dropping it). Calls from
/// several threads block on one another; no two operations run at once.
pub struct ImageProcessingClient {
    config: ClientConfig,
    engine: Mutex<Engine>,
}

impl ImageProcessingClient {
    // -- Lifecycle ------------------------------------------------------------

    /// Initialise the engines.
    ///
    /// The image codecs are always available. PDFium is bound when
    /// `config.enable_pdf` is set; if it cannot be found, the client still
    /// starts and PDF conversion reports a processing error.
    #[instrument(skip_all)]
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let rasterizer: Option<Box<dyn PdfRasterizer>> = if config.enable_pdf {
            match PdfiumRasterizer::bind(config.pdfium_library_path.as_deref()) {
                Ok(rasterizer) => Some(Box::new(rasterizer)),
                Err(err) => {
                    warn!(%err, "PDF engine unavailable; PDF conversion disabled");
                    None
                }
            }
        } else {
            None
        };

        info!(
            quality = config.quality,
            pdf_density_dpi = config.pdf_density_dpi,
            pdf = rasterizer.is_some(),
            "Image processing client ready"
        );
        Ok(Self {
            config,
            engine: Mutex::new(Engine { rasterizer }),
        })
    }

    /// Client with default settings.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Client using a caller-supplied PDF engine instead of PDFium.
    pub fn with_rasterizer(
        config: ClientConfig,
        rasterizer: Box<dyn PdfRasterizer>,
    ) -> Result<Self> {
        config.validate()?;
        info!(engine = rasterizer.engine_name(), "Image processing client ready");
        Ok(Self {
            config,
            engine: Mutex::new(Engine {
                rasterizer: Some(rasterizer),
            }),
        })
    }

    /// Release the engines. Consumes the client, so it cannot be closed twice.
    pub fn close(self) {
        let mut engine = self.lock();
        if let Some(rasterizer) = engine.rasterizer.take() {
            info!(engine = rasterizer.engine_name(), "Releasing PDF engine");
        }
        info!("Image processing client closed");
    }

    /// Settings this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether a PDF engine is bound.
    pub fn pdf_available(&self) -> bool {
        self.lock().rasterizer.is_some()
    }

    // -- Stream operations ----------------------------------------------------

    /// Resize an encoded image read from `source` to exactly `width` x
    /// `height` and write the encoded result to `destination`.
    ///
    /// The output keeps the source format unless `output_format` names another.
    #[instrument(skip(self, source, destination))]
    pub fn resize(
        &self,
        mut source: impl Read,
        mut destination: impl Write,
        width: u32,
        height: u32,
        output_format: Option<&str>,
    ) -> Result<()> {
        validate_dimensions(width, height)?;
        let data = read_source(&mut source)?;

        let _engine = self.lock();
        let mut processor = ImageProcessor::from_bytes(&data)?;
        self.orient(&mut processor);
        let processor = processor.resize_exact(width, height, self.config.resize_filter)?;

        let format = match non_empty(output_format) {
            Some(name) => parse_format(name)?,
            None => source_format_of(&processor)?,
        };
        let blob = processor.encode(format, self.config.quality)?;
        write_destination(&mut destination, &blob)?;

        info!(%format, bytes = blob.len(), "Resize complete");
        Ok(())
    }

    /// Re-encode an image read from `source` as `output_format`.
    #[instrument(skip(self, source, destination))]
    pub fn convert_format(
        &self,
        mut source: impl Read,
        mut destination: impl Write,
        output_format: &str,
    ) -> Result<()> {
        if output_format.trim().is_empty() {
            return Err(MediaError::invalid("format is empty"));
        }
        let data = read_source(&mut source)?;

        let _engine = self.lock();
        let mut processor = ImageProcessor::from_bytes(&data)?;
        self.orient(&mut processor);

        let format = parse_format(output_format)?;
        let blob = processor.encode(format, self.config.quality)?;
        write_destination(&mut destination, &blob)?;

        info!(%format, bytes = blob.len(), "Format conversion complete");
        Ok(())
    }

    // -- File operations ------------------------------------------------------

    /// Resize the image at `input_path` to exactly `width` x `height` and
    /// write it to `output_path`.
    ///
    /// Output format: `output_format` if given, else the output path's
    /// extension, else the source format.
    #[instrument(
        skip(self, input_path, output_path),
        fields(
            input = %input_path.as_ref().display(),
            output = %output_path.as_ref().display(),
        )
    )]
    pub fn resize_file(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        width: u32,
        height: u32,
        output_format: Option<&str>,
    ) -> Result<()> {
        let (input, output) = validate_paths(input_path.as_ref(), output_path.as_ref())?;
        validate_dimensions(width, height)?;
        require_existing(input)?;
        let format = non_empty(output_format).map(parse_format).transpose()?;

        let _engine = self.lock();
        let mut processor = ImageProcessor::open(input)?;
        self.orient(&mut processor);
        processor
            .resize_exact(width, height, self.config.resize_filter)?
            .save(output, format, self.config.quality)
    }

    /// Resize to `target_height`, keeping the aspect ratio.
    #[instrument(
        skip(self, input_path, output_path),
        fields(
            input = %input_path.as_ref().display(),
            output = %output_path.as_ref().display(),
        )
    )]
    pub fn resize_by_height(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        target_height: u32,
    ) -> Result<()> {
        let (input, output) = validate_paths(input_path.as_ref(), output_path.as_ref())?;
        if target_height == 0 {
            return Err(MediaError::invalid("target height must be positive"));
        }
        require_existing(input)?;

        let _engine = self.lock();
        let mut processor = ImageProcessor::open(input)?;
        self.orient(&mut processor);
        debug!(
            width = processor.width(),
            height = processor.height(),
            "Scaling by height"
        );
        processor
            .resize_to_height(target_height, self.config.resize_filter)?
            .save(output, None, self.config.quality)
    }

    /// Resize to `target_width`, keeping the aspect ratio.
    #[instrument(
        skip(self, input_path, output_path),
        fields(
            input = %input_path.as_ref().display(),
            output = %output_path.as_ref().display(),
        )
    )]
    pub fn resize_by_width(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        target_width: u32,
    ) -> Result<()> {
        let (input, output) = validate_paths(input_path.as_ref(), output_path.as_ref())?;
        if target_width == 0 {
            return Err(MediaError::invalid("target width must be positive"));
        }
        require_existing(input)?;

        let _engine = self.lock();
        let mut processor = ImageProcessor::open(input)?;
        self.orient(&mut processor);
        debug!(
            width = processor.width(),
            height = processor.height(),
            "Scaling by width"
        );
        processor
            .resize_to_width(target_width, self.config.resize_filter)?
            .save(output, None, self.config.quality)
    }

    /// Read format, dimensions, EXIF orientation and encoded size of the image
    /// at `path`.
    ///
    /// Dimensions are those stored in the file, before orientation.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn open_image(&self, path: impl AsRef<Path>) -> Result<ImageMeta> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(MediaError::invalid("image path is empty"));
        }

        let _engine = self.lock();
        let mut processor = ImageProcessor::open(path)?;
        let meta = processor.metadata();
        self.orient(&mut processor);

        info!(
            format = %meta.format_name,
            width = meta.width,
            height = meta.height,
            orientation = meta.exif_orientation,
            "Image metadata read"
        );
        Ok(meta)
    }

    /// Older name for [`ImageProcessingClient::open_image`].
    pub fn image_metadata(&self, path: impl AsRef<Path>) -> Result<ImageMeta> {
        self.open_image(path)
    }

    // -- PDF ------------------------------------------------------------------

    /// Rasterize the PDF at `input_path`.
    ///
    /// `max_pages` of 0 means every page. Each page is flattened onto white.
    ///
    /// Without `create_montage`, every page is scaled to
    /// `target_height_per_page` and written on its own: to `output_path` when
    /// only one page is in range, else to `<stem>_page<N>.<ext>`. A page that
    /// fails is logged and skipped.
    ///
    /// With `create_montage`, all pages are stacked in a single column, each
    /// `target_height_per_page` tall, and written to `output_path`. Failing to
    /// compose or write the montage fails the call.
    #[instrument(
        skip(self, input_path, output_path),
        fields(
            input = %input_path.as_ref().display(),
            output = %output_path.as_ref().display(),
        )
    )]
    pub fn convert_pdf_to_images(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        max_pages: u32,
        target_height_per_page: u32,
        create_montage: bool,
    ) -> Result<PdfConversionReport> {
        let (input, output) = validate_paths(input_path.as_ref(), output_path.as_ref())?;
        if target_height_per_page == 0 {
            return Err(MediaError::invalid("target height must be positive"));
        }
        require_existing(input)?;

        let engine = self.lock();
        let rasterizer = engine.rasterizer.as_deref().ok_or_else(|| {
            MediaError::processing("PDF engine is not available in this client")
        })?;
        let document = rasterizer.open(input, self.config.pdf_density_dpi)?;

        let total_pages = document.page_count();
        let in_range = pages_in_range(total_pages, max_pages);
        info!(
            total_pages,
            in_range,
            target_height_per_page,
            create_montage,
            "Converting PDF"
        );

        let mut report = PdfConversionReport {
            total_pages,
            processed_pages: in_range,
            montage: create_montage,
            ..Default::default()
        };
        let page_format = format_from_path(output).unwrap_or(OutputFormat::Png);
        let mut montage_tiles = Vec::new();

        for index in 0..in_range {
            let page_number = index + 1;
            let page = match document.render_page(index) {
                Ok(page) => page,
                Err(err) => {
                    warn!(page_number, %err, "Failed to rasterize page");
                    report.failed_pages.push(page_number);
                    continue;
                }
            };

            let mut processor = ImageProcessor::from_dynamic(page).flatten(WHITE);
            self.orient(&mut processor);

            // Tiles are scaled as they arrive so only output-sized pages are held.
            if create_montage {
                let filter = self.config.resize_filter;
                match processor.resize_to_height(target_height_per_page, filter) {
                    Ok(tile) => montage_tiles.push(tile.into_dynamic()),
                    Err(err) => {
                        warn!(page_number, %err, "Failed to scale page for montage");
                        report.failed_pages.push(page_number);
                    }
                }
                continue;
            }

            let page_path = page_output_path(output, page_number, in_range);
            match self.write_page(processor, &page_path, target_height_per_page, page_format) {
                Ok(()) => {
                    debug!(page_number, path = %page_path.display(), "Page written");
                    report.written.push(page_path);
                }
                Err(err) => {
                    warn!(page_number, path = %page_path.display(), %err, "Failed to write page");
                    report.failed_pages.push(page_number);
                }
            }
        }

        if create_montage {
            let written = self
                .write_montage(&montage_tiles, output, target_height_per_page, page_format)
                .inspect_err(|err| error!(%err, "Failed to write montage image"))?;
            report.written.push(written);
        }

        info!(
            written = report.written.len(),
            failed = report.failed_pages.len(),
            "PDF conversion complete"
        );
        Ok(report)
    }

    // -- Helpers --------------------------------------------------------------

    /// Take the client lock, recovering it if a previous holder panicked.
    ///
    /// The guarded state is only the engine binding, which a panic mid-call
    /// leaves intact.
    fn lock(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(|poisoned| {
            warn!("Client lock was poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Apply EXIF orientation, logging instead of failing.
    fn orient(&self, processor: &mut ImageProcessor) {
        if let Err(err) = processor.auto_orient() {
            warn!(%err, "Auto-orientation failed; continuing");
        }
    }

    fn write_page(
        &self,
        processor: ImageProcessor,
        path: &Path,
        target_height: u32,
        format: OutputFormat,
    ) -> Result<()> {
        processor
            .resize_to_height(target_height, self.config.resize_filter)?
            .save(path, Some(format), self.config.quality)
    }

    fn write_montage(
        &self,
        tiles: &[image::DynamicImage],
        path: &Path,
        tile_height: u32,
        format: OutputFormat,
    ) -> Result<PathBuf> {
        let montage = stack_vertically(tiles, tile_height, self.config.resize_filter, WHITE)?;
        ImageProcessor::from_dynamic(montage).save(path, Some(format), self.config.quality)?;
        Ok(path.to_path_buf())
    }
}

// -- Validation ---------------------------------------------------------------

fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(MediaError::invalid(format!(
            "invalid dimensions {}x{}",
            width, height
        )));
    }
    Ok(())
}

fn validate_paths<'a>(input: &'a Path, output: &'a Path) -> Result<(&'a Path, &'a Path)> {
    if input.as_os_str().is_empty() || output.as_os_str().is_empty() {
        return Err(MediaError::invalid("input or output path is empty"));
    }
    Ok((input, output))
}

/// Checked ahead of the engine so a missing file reads as a caller error.
fn require_existing(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(MediaError::invalid(format!(
            "input file does not exist: {}",
            path.display()
        )));
    }
    Ok(())
}

fn non_empty(name: Option<&str>) -> Option<&str> {
    name.filter(|name| !name.trim().is_empty())
}

/// Unknown format names are the engine's rejection, not a caller precondition.
fn parse_format(name: &str) -> Result<OutputFormat> {
    OutputFormat::from_name(name).ok_or_else(|| {
        MediaError::processing(format!(
            "failed to set image format: unsupported format {name:?}"
        ))
    })
}

fn source_format_of(processor: &ImageProcessor) -> Result<OutputFormat> {
    processor.source_output_format().ok_or_else(|| {
        MediaError::processing(format!(
            "cannot re-encode source format {:?}; pass an output format",
            processor.source_format()
        ))
    })
}

fn read_source(source: &mut impl Read) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    source.read_to_end(&mut data)?;
    if data.is_empty() {
        return Err(MediaError::invalid("source is empty"));
    }
    Ok(data)
}

fn write_destination(destination: &mut impl Write, blob: &[u8]) -> Result<()> {
    destination.write_all(blob)?;
    destination.flush()?;
    Ok(())
}
