// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Runs the OCR engine over whole documents or rendered pages.
//
// Every entry point degrades instead of failing: a missing engine, a crashed
// run, or an unreadable page all end up as missing text, never as an error.

use std::path::PathBuf;
use std::sync::Arc;

use emarge_core::config::OcrSettings;
use emarge_core::error::{EmargeError, Result};
use emarge_core::types::{FileKind, PageImage, ToolHandle};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use super::{OcrEngine, OcrRequest};
use crate::image::page_to_tiff;
use crate::workspace::TempWorkspace;

pub struct OcrInvoker {
    engine: Arc<dyn OcrEngine>,
    dpi_hint: u32,
    concurrency: usize,
    temp_root: Option<PathBuf>,
}

impl OcrInvoker {
    pub fn new(engine: Arc<dyn OcrEngine>, settings: &OcrSettings) -> Self {
        Self {
            engine,
            dpi_hint: settings.ocr_dpi_hint,
            concurrency: settings.ocr_concurrency.max(1),
            temp_root: settings.temp_root.clone(),
        }
    }

    /// OCR a PDF directly. Empty string when the engine is missing or fails.
    #[instrument(skip_all, fields(bytes_len = pdf.len(), %language))]
    pub async fn recognize_pdf(&self, pdf: &[u8], language: &str) -> String {
        self.recognize_file(pdf, "input.pdf", language, Some(self.dpi_hint))
            .await
    }

    /// OCR a standalone image (JPEG, PNG or unknown bytes).
    ///
    /// The image goes through the same TIFF conversion as a rendered page, so
    /// bytes that do not decode as any image yield an empty string.
    #[instrument(skip_all, fields(bytes_len = bytes.len(), %kind, %language))]
    pub async fn recognize_image(&self, bytes: &[u8], kind: FileKind, language: &str) -> String {
        if bytes.is_empty() {
            return String::new();
        }
        let page = PageImage::upload(kind, bytes.to_vec());
        self.recognize_pages(std::slice::from_ref(&page), language)
            .await
    }

    /// OCR rendered pages one by one, in ordinal order.
    ///
    /// Each page contributes its text followed by a newline; blank pages and
    /// pages whose conversion or recognition fails contribute nothing. Up to
    /// `ocr_concurrency` pages are in flight at once, but the output order is
    /// always the ordinal order.
    #[instrument(skip_all, fields(pages = pages.len(), %language))]
    pub async fn recognize_pages(&self, pages: &[PageImage], language: &str) -> String {
        if pages.is_empty() {
            return String::new();
        }
        let Some(tool) = self.engine.resolve().await else {
            warn!("OCR engine unavailable, pages left unrecognised");
            return String::new();
        };
        let workspace = match TempWorkspace::acquire("emarge_ocr_", self.temp_root.as_deref()) {
            Ok(ws) => ws,
            Err(err) => {
                warn!(%err, "Cannot OCR pages without a scratch directory");
                return String::new();
            }
        };

        let mut ordered: Vec<&PageImage> = pages.iter().collect();
        ordered.sort_by_key(|page| page.ordinal);

        let results: Vec<Option<String>> = stream::iter(ordered)
            .map(|page| self.recognize_page(&tool, &workspace, page, language))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut text = String::new();
        let mut recognised = 0usize;
        for page_text in results.into_iter().flatten() {
            if page_text.trim().is_empty() {
                continue;
            }
            text.push_str(&page_text);
            text.push('\n');
            recognised += 1;
        }
        info!(pages = pages.len(), recognised, chars = text.len(), "Pages recognised");
        text
    }

    async fn recognize_page(
        &self,
        tool: &ToolHandle,
        workspace: &TempWorkspace,
        page: &PageImage,
        language: &str,
    ) -> Option<String> {
        let ordinal = page.ordinal;
        let outcome: Result<String> = async {
            let owned = page.clone();
            let tiff = tokio::task::spawn_blocking(move || page_to_tiff(&owned))
                .await
                .map_err(|err| EmargeError::Image(format!("TIFF task failed: {err}")))??;

            let input = workspace.file(&format!("page_{ordinal}.tif"));
            tokio::fs::write(&input, &tiff).await?;
            let request = OcrRequest {
                input,
                output_stem: workspace.file(&format!("page_{ordinal}")),
                language: language.to_string(),
                dpi: None,
            };
            self.engine.run(tool, &request).await
        }
        .await;

        match outcome {
            Ok(text) => {
                debug!(page = ordinal, chars = text.len(), "Page recognised");
                Some(text)
            }
            Err(err) => {
                warn!(page = ordinal, %err, "Page OCR failed, skipping");
                None
            }
        }
    }

    async fn recognize_file(
        &self,
        bytes: &[u8],
        file_name: &str,
        language: &str,
        dpi: Option<u32>,
    ) -> String {
        if bytes.is_empty() {
            return String::new();
        }
        let Some(tool) = self.engine.resolve().await else {
            warn!("OCR engine unavailable");
            return String::new();
        };

        let outcome: Result<String> = async {
            let workspace = TempWorkspace::acquire("emarge_ocr_", self.temp_root.as_deref())?;
            let input = workspace.file(file_name);
            tokio::fs::write(&input, bytes).await?;
            let request = OcrRequest {
                input,
                output_stem: workspace.file("output"),
                language: language.to_string(),
                dpi,
            };
            self.engine.run(&tool, &request).await
        }
        .await;

        outcome.unwrap_or_else(|err| {
            warn!(%err, "OCR failed");
            String::new()
        })
    }
}
