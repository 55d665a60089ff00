// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDFium engine: in-process rendering through `pdfium-render`.
//
// Only compiled in with the `pdfium` feature. Without it the converter stays
// in the chain and reports a conversion failure, so the fallback order is the
// same in every build.

use std::sync::Arc;

use async_trait::async_trait;
use emarge_core::config::OcrSettings;
use emarge_core::error::{EmargeError, Result};
use emarge_core::types::PageImage;
use tracing::instrument;

use super::{Converter, RasterJob};
use crate::tools::ToolLocator;

pub struct PdfiumConverter {
    #[cfg_attr(not(feature = "pdfium"), allow(dead_code))]
    locator: Arc<ToolLocator>,
    #[cfg_attr(not(feature = "pdfium"), allow(dead_code))]
    dpi: u32,
}

impl PdfiumConverter {
    pub fn new(locator: Arc<ToolLocator>, settings: &OcrSettings) -> Self {
        Self {
            locator,
            dpi: settings.raster_dpi,
        }
    }
}

#[async_trait]
impl Converter for PdfiumConverter {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    #[cfg(feature = "pdfium")]
    #[instrument(skip_all, fields(engine = "pdfium"))]
    async fn try_convert(&self, job: &RasterJob<'_>) -> Result<Vec<PageImage>> {
        use emarge_core::types::ToolId;

        let library = self.locator.locate(ToolId::Pdfium).await;
        let bytes = job.pdf_bytes.to_vec();
        let dpi = self.dpi;

        tokio::task::spawn_blocking(move || {
            render::render_all(library.as_ref().map(|h| h.program()), &bytes, dpi)
        })
        .await
        .map_err(|err| EmargeError::ConversionFailure(format!("render task failed: {err}")))?
    }

    #[cfg(not(feature = "pdfium"))]
    #[instrument(skip_all, fields(engine = "pdfium"))]
    async fn try_convert(&self, _job: &RasterJob<'_>) -> Result<Vec<PageImage>> {
        Err(EmargeError::ConversionFailure(
            "built without the pdfium feature".into(),
        ))
    }
}

#[cfg(feature = "pdfium")]
mod render {
    use std::path::Path;

    use emarge_core::error::{EmargeError, Result};
    use emarge_core::types::PageImage;
    use pdfium_render::prelude::*;
    use tracing::debug;

    use crate::image::encode_png;

    fn failure(context: &str, err: impl std::fmt::Display) -> EmargeError {
        EmargeError::ConversionFailure(format!("{context}: {err}"))
    }

    /// Render every page; any page failing fails the whole document.
    pub(super) fn render_all(library: Option<&Path>, pdf: &[u8], dpi: u32) -> Result<Vec<PageImage>> {
        let bindings = match library {
            Some(path) => Pdfium::bind_to_library(path).or_else(|_| Pdfium::bind_to_system_library()),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|err| failure("PDFium library unavailable", err))?;
        let pdfium = Pdfium::new(bindings);

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|err| failure("PDFium could not load document", err))?;

        let scale = dpi as f32 / 72.0;
        let mut pages = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let width = (page.width().value * scale).round().max(1.0) as i32;
            let height = (page.height().value * scale).round().max(1.0) as i32;
            let bitmap = page
                .render_with_config(
                    &PdfRenderConfig::new()
                        .set_target_width(width)
                        .set_target_height(height),
                )
                .map_err(|err| failure("PDFium render failed", err))?;
            let png = encode_png(&bitmap.as_image())?;
            debug!(page = index + 1, width, height, "Page rendered");
            pages.push(PageImage::png(index as u32 + 1, png));
        }
        Ok(pages)
    }
}
