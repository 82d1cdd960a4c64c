// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, EXIF auto-orientation, resize, flatten, and
// encode. Operates on in-memory images using the `image` crate.

use std::io::Cursor;
use std::path::Path;

use image::imageops;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, Rgb, Rgba, RgbaImage};
use mediawand_core::error::{MediaError, Result};
use mediawand_core::{ImageMeta, OutputFormat, ResizeFilter};
use tracing::{debug, info, instrument};

use super::encode::{encode_to_format, filter_type, format_from_path, format_name, output_format};
use super::geometry::{
    RESAMPLE_BYTES_PER_PIXEL, check_allocation, scale_to_height, scale_to_width,
};

/// TIFF byte-order marks that open every well-formed EXIF block.
const TIFF_LITTLE_ENDIAN: &[u8] = b"II*\0";
const TIFF_BIG_ENDIAN: &[u8] = b"MM\0*";
/// Identifier some containers leave in front of the TIFF header.
const EXIF_PREFIX: &[u8] = b"Exif\0\0";

/// Solid white, the background PDF pages are flattened against.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Image processing pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so a
/// pipeline reads as a chain:
///
/// ```ignore
/// let bytes = ImageProcessor::from_bytes(&data)?
///     .resize_exact(200, 200, ResizeFilter::Lanczos3)?
///     .encode(OutputFormat::Png, 95)?;
/// ```
///
/// The decoded pixels are dropped with the processor, so every exit path of
/// a pipeline releases them.
#[derive(Debug)]
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
    /// Container format detected at decode time.
    source_format: Option<ImageFormat>,
    /// Encoded size of the source in bytes, 0 when unknown.
    content_length: u64,
    /// Orientation tag from the EXIF block, if any.
    exif_orientation: Option<Orientation>,
    /// Why the EXIF block could not be read, if it could not.
    orientation_error: Option<String>,
    /// Set once the orientation has been baked into the pixels.
    oriented: bool,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    ///
    /// A missing or unreadable file is a processing error, like any other
    /// decode failure.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref()).map_err(|err| {
            MediaError::processing(format!(
                "failed to read image {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        let processor = Self::from_bytes(&data)?;
        info!(
            width = processor.width(),
            height = processor.height(),
            "Image loaded"
        );
        Ok(processor)
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|err| MediaError::processing(format!("failed to read image: {}", err)))?;
        let source_format = reader
            .format()
            .ok_or_else(|| MediaError::processing("failed to read image: unrecognised format"))?;
        let mut decoder = reader
            .into_decoder()
            .map_err(|err| MediaError::processing(format!("failed to read image: {}", err)))?;

        let (exif_orientation, orientation_error) = match decoder.exif_metadata() {
            Ok(Some(exif)) => read_orientation(&exif),
            Ok(None) => (None, None),
            Err(err) => (None, Some(err.to_string())),
        };

        let image = DynamicImage::from_decoder(decoder).map_err(|err| {
            MediaError::processing(format!("failed to decode image: {}", err))
        })?;
        debug!(
            format = ?source_format,
            width = image.width(),
            height = image.height(),
            orientation = ?exif_orientation,
            "Image decoded from bytes"
        );

        Ok(Self {
            image,
            source_format: Some(source_format),
            content_length: data.len() as u64,
            exif_orientation,
            orientation_error,
            oriented: false,
        })
    }

    /// Wrap an already-decoded `DynamicImage` (e.g. a rasterized PDF page).
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image,
            source_format: None,
            content_length: 0,
            exif_orientation: None,
            orientation_error: None,
            oriented: false,
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Detected source container format, if decoded from bytes.
    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    /// Raw EXIF orientation code, 0 when the image carries none.
    pub fn exif_orientation_code(&self) -> u16 {
        self.exif_orientation
            .map(|orientation| u16::from(orientation.to_exif()))
            .unwrap_or(0)
    }

    /// Metadata snapshot of the current image.
    pub fn metadata(&self) -> ImageMeta {
        ImageMeta {
            format_name: self
                .source_format
                .map(format_name)
                .unwrap_or_default(),
            width: self.width(),
            height: self.height(),
            exif_orientation: self.exif_orientation_code(),
            content_length: self.content_length,
        }
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Rotate/flip the pixels so they match the EXIF orientation tag.
    ///
    /// Applying twice is a no-op. Fails only when the EXIF block itself could
    /// not be read; callers treat that as non-fatal.
    pub fn auto_orient(&mut self) -> Result<()> {
        if self.oriented {
            return Ok(());
        }
        if let Some(reason) = &self.orientation_error {
            return Err(MediaError::processing(format!(
                "failed to read EXIF orientation: {}",
                reason
            )));
        }
        if let Some(orientation) = self.exif_orientation {
            debug!(?orientation, "Applying EXIF orientation");
            self.image.apply_orientation(orientation);
        }
        self.oriented = true;
        Ok(())
    }

    /// Resize to exactly `width` x `height`, ignoring aspect ratio.
    ///
    /// Sizes whose resampling buffers would exceed [`allocation_budget`] are
    /// rejected before any pixels are touched.
    ///
    /// [`allocation_budget`]: super::geometry::allocation_budget
    #[instrument(skip(self))]
    pub fn resize_exact(self, width: u32, height: u32, filter: ResizeFilter) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MediaError::processing(format!(
                "failed to resize image: invalid geometry {}x{}",
                width, height
            )));
        }
        // The resampler first scales vertically into a (source width x height)
        // f32 buffer, then horizontally into the target.
        check_allocation(
            self.width().max(width),
            height,
            RESAMPLE_BYTES_PER_PIXEL,
            "failed to resize image",
        )?;
        let resized = self.image.resize_exact(width, height, filter_type(filter));
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            new_w = resized.width(),
            new_h = resized.height(),
            "Resize complete"
        );
        Ok(Self {
            image: resized,
            ..self
        })
    }

    /// Resize to `target_height`, deriving the width from the aspect ratio.
    pub fn resize_to_height(self, target_height: u32, filter: ResizeFilter) -> Result<Self> {
        let (width, height) = scale_to_height((self.width(), self.height()), target_height);
        self.resize_exact(width, height, filter)
    }

    /// Resize to `target_width`, deriving the height from the aspect ratio.
    pub fn resize_to_width(self, target_width: u32, filter: ResizeFilter) -> Result<Self> {
        let (width, height) = scale_to_width((self.width(), self.height()), target_width);
        self.resize_exact(width, height, filter)
    }

    /// Composite the image over an opaque `background`, removing any alpha.
    pub fn flatten(self, background: Rgb<u8>) -> Self {
        if !self.image.color().has_alpha() {
            return self;
        }
        let Rgb([r, g, b]) = background;
        let mut canvas = RgbaImage::from_pixel(self.width(), self.height(), Rgba([r, g, b, 255]));
        imageops::overlay(&mut canvas, &self.image.to_rgba8(), 0, 0);
        let flat = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8());
        Self { image: flat, ..self }
    }

    // -- Output ---------------------------------------------------------------

    /// Format the source was decoded from, if we know how to write it back.
    pub fn source_output_format(&self) -> Option<OutputFormat> {
        self.source_format.and_then(output_format)
    }

    /// Encode the current image. Empty output is an error.
    pub fn encode(&self, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        encode_to_format(&self.image, format, quality)
    }

    /// Write the image to a file.
    ///
    /// Format resolution: `format` if given, else the path's extension, else
    /// the source format.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        format: Option<OutputFormat>,
        quality: u8,
    ) -> Result<()> {
        let path = path.as_ref();
        let format = format
            .or_else(|| format_from_path(path))
            .or_else(|| self.source_output_format())
            .ok_or_else(|| {
                MediaError::processing(format!(
                    "no output format for {}: unknown extension and source format",
                    path.display()
                ))
            })?;

        let bytes = self.encode(format, quality)?;
        std::fs::write(path, &bytes).map_err(|err| {
            MediaError::processing(format!(
                "failed to write image to {}: {}",
                path.display(),
                err
            ))
        })?;
        info!(%format, bytes = bytes.len(), "Image written");
        Ok(())
    }
}

/// Orientation tag from a raw EXIF block.
///
/// A block without a TIFF header cannot be read at all and is reported as an
/// error; a readable block without an orientation tag is simply `None`.
fn read_orientation(exif: &[u8]) -> (Option<Orientation>, Option<String>) {
    let tiff = exif.strip_prefix(EXIF_PREFIX).unwrap_or(exif);
    if tiff.starts_with(TIFF_LITTLE_ENDIAN) || tiff.starts_with(TIFF_BIG_ENDIAN) {
        (Orientation::from_exif_chunk(tiff), None)
    } else {
        (None, Some("EXIF block has no TIFF header".to_string()))
    }
}
