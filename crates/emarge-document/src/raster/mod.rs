// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF rasterization with an ordered fallback chain.
//
// Engines are tried strictly in order and the first to yield at least one
// page wins: Ghostscript, ImageMagick, PDFium, then blank placeholder pages
// sized from the PDF's own geometry. The input PDF is written once into a
// scratch workspace shared by every engine in the chain.

pub mod ghostscript;
pub mod imagemagick;
pub mod pdfium;
pub mod placeholder;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use emarge_core::config::OcrSettings;
use emarge_core::error::Result;
use emarge_core::types::PageImage;
use tracing::{debug, info, instrument, warn};

use crate::tools::ToolLocator;
use crate::workspace::TempWorkspace;

pub use ghostscript::GhostscriptConverter;
pub use imagemagick::ImageMagickConverter;
pub use pdfium::PdfiumConverter;
pub use placeholder::PlaceholderConverter;

/// Everything a converter needs to render one PDF.
pub struct RasterJob<'a> {
    /// The PDF as written into the workspace.
    pub pdf_path: &'a Path,
    /// The same PDF in memory.
    pub pdf_bytes: &'a [u8],
    /// Scratch space shared by the chain; converters write into their own
    /// subdirectory.
    pub workspace: &'a TempWorkspace,
}

/// One rasterization engine.
///
/// `Ok` with an empty vector and `Err` both mean "try the next engine"; the
/// error is only logged.
#[async_trait]
pub trait Converter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn try_convert(&self, job: &RasterJob<'_>) -> Result<Vec<PageImage>>;
}

/// Runs converters in order until one produces pages.
pub struct RasterizationPipeline {
    converters: Vec<Box<dyn Converter>>,
    temp_root: Option<PathBuf>,
}

impl RasterizationPipeline {
    pub fn new(converters: Vec<Box<dyn Converter>>, temp_root: Option<PathBuf>) -> Self {
        Self {
            converters,
            temp_root,
        }
    }

    /// Ghostscript, ImageMagick, PDFium, placeholder.
    pub fn standard(locator: Arc<ToolLocator>, settings: &OcrSettings) -> Self {
        Self::new(
            vec![
                Box::new(GhostscriptConverter::new(locator.clone(), settings)),
                Box::new(ImageMagickConverter::new(locator.clone(), settings)),
                Box::new(PdfiumConverter::new(locator, settings)),
                Box::new(PlaceholderConverter::new(settings)),
            ],
            settings.temp_root.clone(),
        )
    }

    pub fn converter_names(&self) -> Vec<&'static str> {
        self.converters.iter().map(|c| c.name()).collect()
    }

    /// Render `pdf` to page images, ordinals 1..=n in page order.
    ///
    /// Never fails: when no engine produces anything, the result is empty.
    #[instrument(skip_all, fields(bytes_len = pdf.len()))]
    pub async fn rasterize(&self, pdf: &[u8]) -> Vec<PageImage> {
        if pdf.is_empty() {
            return Vec::new();
        }

        let workspace = match TempWorkspace::acquire("emarge_raster_", self.temp_root.as_deref()) {
            Ok(ws) => ws,
            Err(err) => {
                warn!(%err, "Cannot rasterize without a scratch directory");
                return Vec::new();
            }
        };
        let pdf_path = workspace.file("input.pdf");
        if let Err(err) = tokio::fs::write(&pdf_path, pdf).await {
            warn!(%err, "Failed to write PDF into scratch directory");
            return Vec::new();
        }

        let job = RasterJob {
            pdf_path: &pdf_path,
            pdf_bytes: pdf,
            workspace: &workspace,
        };

        for converter in &self.converters {
            match converter.try_convert(&job).await {
                Ok(pages) if !pages.is_empty() => {
                    info!(engine = converter.name(), pages = pages.len(), "PDF rasterized");
                    return renumber(pages);
                }
                Ok(_) => debug!(engine = converter.name(), "Engine produced no pages"),
                Err(err) => warn!(engine = converter.name(), %err, "Engine failed"),
            }
        }

        warn!("No rasterization engine produced pages");
        Vec::new()
    }
}

/// Keep the engine's order, rewrite ordinals to 1..=n.
fn renumber(mut pages: Vec<PageImage>) -> Vec<PageImage> {
    for (index, page) in pages.iter_mut().enumerate() {
        page.ordinal = index as u32 + 1;
    }
    pages
}
