// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page image encoding: PNG for rendered pages, LZW-compressed TIFF for the
// OCR engine.

use std::io::Cursor;

use emarge_core::error::{EmargeError, Result};
use emarge_core::types::{ImageEncoding, PageImage};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tiff::encoder::{TiffEncoder, colortype, compression::Lzw};
use tracing::{debug, instrument};

/// Encode an in-memory image as PNG.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|err| EmargeError::Image(format!("PNG encoding failed: {err}")))?;
    Ok(buf)
}

/// A white RGB page of the given pixel size, as PNG.
pub fn blank_page_png(width: u32, height: u32) -> Result<Vec<u8>> {
    let page = RgbImage::from_pixel(width.max(1), height.max(1), Rgb([255, 255, 255]));
    encode_png(&DynamicImage::ImageRgb8(page))
}

/// Pixel dimensions of an encoded image (any format `image` can decode).
pub fn dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| EmargeError::Image(format!("unreadable image: {err}")))?;
    reader
        .into_dimensions()
        .map_err(|err| EmargeError::Image(format!("unreadable image header: {err}")))
}

/// Re-encode a page as an 8-bit RGB TIFF with LZW compression.
///
/// Pages already in TIFF form are passed through untouched; anything else is
/// decoded by content, whatever its declared encoding.
#[instrument(skip_all, fields(page = page.ordinal, bytes_len = page.bytes.len()))]
pub fn page_to_tiff(page: &PageImage) -> Result<Vec<u8>> {
    match page.encoding {
        ImageEncoding::Tiff => Ok(page.bytes.clone()),
        ImageEncoding::Png | ImageEncoding::Jpeg | ImageEncoding::Unknown => {
            to_tiff_lzw(&page.bytes)
        }
    }
}

/// Decode any supported image and write it as LZW-compressed RGB8 TIFF.
pub fn to_tiff_lzw(bytes: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|err| EmargeError::Image(format!("failed to decode page image: {err}")))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut out = Cursor::new(Vec::new());
    let mut encoder = TiffEncoder::new(&mut out)
        .map_err(|err| EmargeError::Image(format!("TIFF encoder setup failed: {err}")))?;
    encoder
        .write_image_with_compression::<colortype::RGB8, _>(
            width,
            height,
            Lzw::default(),
            rgb.as_raw(),
        )
        .map_err(|err| EmargeError::Image(format!("TIFF encoding failed: {err}")))?;

    let tiff = out.into_inner();
    debug!(width, height, tiff_bytes = tiff.len(), "Page re-encoded as TIFF");
    Ok(tiff)
}
