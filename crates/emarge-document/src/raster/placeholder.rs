// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Last-resort engine: blank white pages matching the PDF's page geometry.
// No external tool is needed, so the chain always has something to offer
// for a structurally valid PDF.

use async_trait::async_trait;
use emarge_core::config::OcrSettings;
use emarge_core::error::{EmargeError, Result};
use emarge_core::types::PageImage;
use tracing::{debug, instrument, warn};

use super::{Converter, RasterJob};
use crate::image::blank_page_png;
use crate::pdf::PdfReader;

pub struct PlaceholderConverter {
    dpi: u32,
    max_dimension: u32,
}

impl PlaceholderConverter {
    pub fn new(settings: &OcrSettings) -> Self {
        Self {
            dpi: settings.placeholder_dpi,
            max_dimension: settings.placeholder_max_dimension,
        }
    }
}

/// Pixel size of a `points`-sized page at `dpi`, shrunk proportionally so
/// neither side exceeds `max`.
pub fn pixel_size((width_pt, height_pt): (f32, f32), dpi: u32, max: u32) -> (u32, u32) {
    let scale = dpi as f32 / 72.0;
    let (mut w, mut h) = (width_pt * scale, height_pt * scale);
    let longest = w.max(h);
    if longest > max as f32 {
        let shrink = max as f32 / longest;
        w *= shrink;
        h *= shrink;
    }
    ((w.round() as u32).clamp(1, max), (h.round() as u32).clamp(1, max))
}

#[async_trait]
impl Converter for PlaceholderConverter {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    #[instrument(skip_all, fields(engine = "placeholder"))]
    async fn try_convert(&self, job: &RasterJob<'_>) -> Result<Vec<PageImage>> {
        let sizes = match PdfReader::from_bytes(job.pdf_bytes) {
            Ok(reader) => reader.page_sizes(),
            Err(err) => {
                warn!(%err, "PDF is not structurally readable, no placeholder pages");
                return Ok(Vec::new());
            }
        };

        let (dpi, max) = (self.dpi, self.max_dimension);
        let pages = tokio::task::spawn_blocking(move || -> Result<Vec<PageImage>> {
            sizes
                .into_iter()
                .enumerate()
                .map(|(index, size)| {
                    let (w, h) = pixel_size(size, dpi, max);
                    Ok(PageImage::png(index as u32 + 1, blank_page_png(w, h)?))
                })
                .collect()
        })
        .await
        .map_err(|err| EmargeError::ConversionFailure(format!("placeholder task failed: {err}")))??;

        debug!(pages = pages.len(), "Placeholder pages generated");
        Ok(pages)
    }
}
