// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Montage composition — a single column of tiles, each scaled to a common
// height, concatenated top to bottom with no frame or spacing.

use image::imageops;
use image::{DynamicImage, Rgb, Rgba, RgbaImage};
use mediawand_core::error::{MediaError, Result};
use mediawand_core::ResizeFilter;
use tracing::{debug, info, instrument};

use super::encode::filter_type;
use super::geometry::{
    CANVAS_BYTES_PER_PIXEL, RESAMPLE_BYTES_PER_PIXEL, check_allocation, scale_to_height,
};

/// Stack `tiles` vertically, each scaled to `tile_height` with its aspect
/// ratio preserved.
///
/// The canvas is as wide as the widest scaled tile; narrower tiles are
/// centred horizontally on `background`.
#[instrument(skip(tiles), fields(tiles = tiles.len()))]
pub fn stack_vertically(
    tiles: &[DynamicImage],
    tile_height: u32,
    filter: ResizeFilter,
    background: Rgb<u8>,
) -> Result<DynamicImage> {
    if tiles.is_empty() {
        return Err(MediaError::processing("montage has no images to compose"));
    }
    if tile_height == 0 {
        return Err(MediaError::processing("montage tile height must be positive"));
    }

    let mut scaled = Vec::with_capacity(tiles.len());
    for tile in tiles {
        if tile.height() == tile_height {
            scaled.push(tile.to_rgba8());
            continue;
        }
        let (width, height) = scale_to_height((tile.width(), tile.height()), tile_height);
        check_allocation(
            tile.width().max(width),
            height,
            RESAMPLE_BYTES_PER_PIXEL,
            "failed to scale montage tile",
        )?;
        scaled.push(tile.resize_exact(width, height, filter_type(filter)).to_rgba8());
    }

    let canvas_width = scaled.iter().map(RgbaImage::width).max().unwrap_or(1);
    let canvas_height = u32::try_from(scaled.len())
        .ok()
        .and_then(|count| count.checked_mul(tile_height))
        .ok_or_else(|| MediaError::processing("montage canvas is too tall"))?;
    check_allocation(
        canvas_width,
        canvas_height,
        CANVAS_BYTES_PER_PIXEL,
        "failed to compose montage",
    )?;

    info!(canvas_width, canvas_height, "Composing montage");

    let Rgb([r, g, b]) = background;
    let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, Rgba([r, g, b, 255]));
    for (index, tile) in scaled.iter().enumerate() {
        let x = i64::from((canvas_width - tile.width()) / 2);
        let y = index as i64 * i64::from(tile_height);
        imageops::overlay(&mut canvas, tile, x, y);
        debug!(index, x, y, width = tile.width(), "Tile placed");
    }

    Ok(DynamicImage::ImageRgb8(
        DynamicImage::ImageRgba8(canvas).to_rgb8(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn solid(width: u32, height: u32, colour: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(colour)))
    }

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    #[test]
    fn single_column_of_equal_height_tiles() {
        let tiles = vec![
            solid(200, 100, [255, 0, 0]),
            solid(400, 200, [0, 255, 0]),
            solid(100, 50, [0, 0, 255]),
        ];
        let montage = stack_vertically(&tiles, 50, ResizeFilter::Nearest, WHITE).unwrap();
        // Every tile scales to 100x50.
        assert_eq!((montage.width(), montage.height()), (100, 150));

        let rgb = montage.to_rgb8();
        assert_eq!(rgb.get_pixel(50, 25), &Rgb([255, 0, 0]));
        assert_eq!(rgb.get_pixel(50, 75), &Rgb([0, 255, 0]));
        assert_eq!(rgb.get_pixel(50, 125), &Rgb([0, 0, 255]));
    }

    #[test]
    fn narrow_tiles_are_centred_on_background() {
        let tiles = vec![solid(400, 100, [0, 0, 0]), solid(100, 100, [0, 0, 0])];
        let montage = stack_vertically(&tiles, 100, ResizeFilter::Nearest, WHITE).unwrap();
        assert_eq!((montage.width(), montage.height()), (400, 200));

        let rgb = montage.to_rgb8();
        // Second tile spans x 150..250.
        assert_eq!(rgb.get_pixel(10, 150), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(200, 150), &Rgb([0, 0, 0]));
    }

    #[test]
    fn transparent_tiles_land_on_opaque_canvas() {
        let clear = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0])));
        let montage = stack_vertically(&[clear], 10, ResizeFilter::Nearest, WHITE).unwrap();
        assert!(!montage.color().has_alpha());
        assert_eq!(montage.to_rgb8().get_pixel(5, 5), &Rgb([255, 255, 255]));
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = stack_vertically(&[], 100, ResizeFilter::Lanczos3, WHITE).unwrap_err();
        assert!(err.is_processing());
    }

    #[test]
    fn tiles_already_at_height_are_kept_as_is() {
        let tiles = vec![solid(30, 20, [9, 8, 7])];
        let montage = stack_vertically(&tiles, 20, ResizeFilter::Lanczos3, WHITE).unwrap();
        assert_eq!((montage.width(), montage.height()), (30, 20));
        assert_eq!(montage.to_rgb8().get_pixel(0, 0), &Rgb([9, 8, 7]));
    }

    #[test]
    fn oversized_tile_height_is_rejected() {
        let tiles = vec![solid(1, 1, [0, 0, 0])];
        let err = stack_vertically(&tiles, 200_000, ResizeFilter::Nearest, WHITE).unwrap_err();
        assert!(err.is_processing());
    }

    /// Small tiles can still add up to a canvas that cannot be allocated.
    #[test]
    fn oversized_canvas_is_rejected() {
        let mut tiles = vec![solid(4000, 1000, [0, 0, 0])];
        tiles.extend((0..40).map(|_| solid(1, 1000, [0, 0, 0])));
        let err = stack_vertically(&tiles, 1000, ResizeFilter::Nearest, WHITE).unwrap_err();
        assert!(err.is_processing());
        assert!(err.to_string().contains("montage"));
    }

    #[test]
    fn zero_tile_height_is_an_error() {
        let tiles = vec![solid(10, 10, [0, 0, 0])];
        assert!(stack_vertically(&tiles, 0, ResizeFilter::Lanczos3, WHITE).is_err());
    }
}
