// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Encoder plumbing — maps mediawand formats and filters onto the `image`
// crate and serialises a `DynamicImage` into bytes.

use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use mediawand_core::error::{MediaError, Result};
use mediawand_core::{OutputFormat, ResizeFilter};
use tracing::debug;

/// AVIF encoder speed (1 = slowest/best, 10 = fastest).
const AVIF_SPEED: u8 = 6;

/// The `image` crate format backing an [`OutputFormat`].
pub fn image_format(format: OutputFormat) -> ImageFormat {
    match format {
        OutputFormat::Png => ImageFormat::Png,
        OutputFormat::Jpeg => ImageFormat::Jpeg,
        OutputFormat::Gif => ImageFormat::Gif,
        OutputFormat::WebP => ImageFormat::WebP,
        OutputFormat::Bmp => ImageFormat::Bmp,
        OutputFormat::Tiff => ImageFormat::Tiff,
        OutputFormat::Avif => ImageFormat::Avif,
        OutputFormat::Ico => ImageFormat::Ico,
        OutputFormat::Tga => ImageFormat::Tga,
        OutputFormat::Qoi => ImageFormat::Qoi,
    }
}

/// The [`OutputFormat`] we can re-encode a decoded `ImageFormat` as, if any.
pub fn output_format(format: ImageFormat) -> Option<OutputFormat> {
    match format {
        ImageFormat::Png => Some(OutputFormat::Png),
        ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
        ImageFormat::Gif => Some(OutputFormat::Gif),
        ImageFormat::WebP => Some(OutputFormat::WebP),
        ImageFormat::Bmp => Some(OutputFormat::Bmp),
        ImageFormat::Tiff => Some(OutputFormat::Tiff),
        ImageFormat::Avif => Some(OutputFormat::Avif),
        ImageFormat::Ico => Some(OutputFormat::Ico),
        ImageFormat::Tga => Some(OutputFormat::Tga),
        ImageFormat::Qoi => Some(OutputFormat::Qoi),
        _ => None,
    }
}

/// Upper-case format name for metadata, e.g. `JPEG`, `PNG`, `HDR`.
pub fn format_name(format: ImageFormat) -> String {
    match output_format(format) {
        Some(known) => known.name().to_string(),
        None => format
            .extensions_str()
            .first()
            .map(|ext| ext.to_ascii_uppercase())
            .unwrap_or_else(|| "UNKNOWN".to_string()),
    }
}

/// Output format implied by a path's extension.
pub fn format_from_path(path: &Path) -> Option<OutputFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(OutputFormat::from_name)
}

/// Resampling kernel for a configured filter.
pub fn filter_type(filter: ResizeFilter) -> FilterType {
    match filter {
        ResizeFilter::Nearest => FilterType::Nearest,
        ResizeFilter::Triangle => FilterType::Triangle,
        ResizeFilter::CatmullRom => FilterType::CatmullRom,
        ResizeFilter::Gaussian => FilterType::Gaussian,
        ResizeFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Encode `image` as `format`. `quality` applies to lossy encoders only.
///
/// An empty result is reported as an error rather than returned.
pub fn encode_to_format(
    image: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>> {
    let prepared = prepare_pixels(image, format);
    let mut buffer = Vec::new();

    let outcome = match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            prepared.write_with_encoder(encoder)
        }
        OutputFormat::Avif => {
            let encoder = AvifEncoder::new_with_speed_quality(&mut buffer, AVIF_SPEED, quality);
            prepared.write_with_encoder(encoder)
        }
        other => prepared.write_to(&mut Cursor::new(&mut buffer), image_format(other)),
    };
    outcome.map_err(|err| MediaError::processing(format!("{format} encoding failed: {err}")))?;

    if buffer.is_empty() {
        return Err(MediaError::processing("empty result image"));
    }

    debug!(%format, quality, bytes = buffer.len(), "Image encoded");
    Ok(buffer)
}

/// Convert pixels into a layout the target encoder accepts.
///
/// JPEG has no alpha channel; PNG and TIFF take 8- and 16-bit data as is;
/// everything else gets 8-bit RGB or RGBA.
fn prepare_pixels(image: &DynamicImage, format: OutputFormat) -> Cow<'_, DynamicImage> {
    let is_float = matches!(
        image,
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)
    );
    match format {
        OutputFormat::Jpeg => match image {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => Cow::Borrowed(image),
            _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
        },
        OutputFormat::Png | OutputFormat::Tiff if !is_float => Cow::Borrowed(image),
        _ => match image {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Cow::Borrowed(image),
            _ if image.color().has_alpha() => {
                Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8()))
            }
            _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
        },
    }
}
