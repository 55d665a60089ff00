// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction orchestration: decide how to get text out of an uploaded
// document and run the steps.
//
//   empty input            -> empty
//   image / unknown bytes  -> direct OCR
//   PDF                    -> direct OCR; if blank, rasterize and OCR pages
//
// Plain text extraction never fails. Attendance-sheet analysis reports
// unexpected failures as `StructuredExtraction` so callers can surface them.

use std::sync::Arc;

use emarge_core::config::OcrSettings;
use emarge_core::error::{EmargeError, Result};
use emarge_core::types::{
    EmargementData, ExtractedText, ExtractionId, ExtractionStrategy, FileKind, RawDocument,
};
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use crate::ocr::{OcrInvoker, TesseractEngine};
use crate::raster::RasterizationPipeline;
use crate::sniff;
use crate::text;
use crate::tools::ToolLocator;

pub struct Extractor {
    settings: OcrSettings,
    locator: Arc<ToolLocator>,
    pipeline: RasterizationPipeline,
    ocr: OcrInvoker,
}

impl Extractor {
    /// Production wiring: platform tool discovery, the standard engine
    /// chain and Tesseract. Fails with `Config` when `settings` are invalid.
    pub fn new(settings: OcrSettings) -> Result<Self> {
        settings.validate()?;
        let locator = Arc::new(ToolLocator::system(&settings));
        let pipeline = RasterizationPipeline::standard(locator.clone(), &settings);
        let ocr = OcrInvoker::new(
            Arc::new(TesseractEngine::new(locator.clone(), &settings)),
            &settings,
        );
        Ok(Self {
            settings,
            locator,
            pipeline,
            ocr,
        })
    }

    /// Assemble from explicit parts.
    pub fn with_parts(
        settings: OcrSettings,
        locator: Arc<ToolLocator>,
        pipeline: RasterizationPipeline,
        ocr: OcrInvoker,
    ) -> Self {
        Self {
            settings,
            locator,
            pipeline,
            ocr,
        }
    }

    pub fn settings(&self) -> &OcrSettings {
        &self.settings
    }

    pub fn locator(&self) -> &ToolLocator {
        &self.locator
    }

    /// Recognise the text of `document`. Degrades to an empty result on any
    /// failure; `language` defaults to the configured one.
    pub async fn extract_text(&self, document: &RawDocument, language: Option<&str>) -> ExtractedText {
        let language = language.unwrap_or(&self.settings.language);
        let id = ExtractionId::new();
        match self.try_extract_text(id, document, language).await {
            Ok(extracted) => extracted,
            Err(err) => {
                warn!(extraction_id = %id, %err, "Extraction failed, returning empty text");
                ExtractedText::empty(id, language, sniff::detect(document.bytes()))
            }
        }
    }

    /// Whether the recognised text of `document` passes the quality ratio.
    #[instrument(skip_all, fields(bytes_len = document.len()))]
    pub async fn validate_quality(&self, document: &RawDocument) -> bool {
        let extracted = self.extract_text(document, None).await;
        let ratio = text::quality_ratio(&extracted.text);
        let valid = text::is_acceptable(&extracted.text, self.settings.quality_threshold);
        debug!(ratio, valid, threshold = self.settings.quality_threshold, "Quality checked");
        valid
    }

    /// Recognise and analyse an attendance sheet.
    #[instrument(skip_all, fields(bytes_len = document.len()))]
    pub async fn extract_emargement(&self, document: &RawDocument) -> Result<EmargementData> {
        let id = ExtractionId::new();
        let extracted = self
            .try_extract_text(id, document, &self.settings.language)
            .await
            .map_err(|err| {
                warn!(extraction_id = %id, %err, "Attendance sheet extraction failed");
                EmargeError::structured("attendance sheet extraction failed", err)
            })?;

        let data = text::analyze_emargement(&extracted.text);
        info!(
            extraction_id = %id,
            names = data.names.len(),
            dates = data.dates.len(),
            has_signatures = data.has_signatures,
            has_table = data.has_table_structure,
            "Attendance sheet extracted"
        );
        Ok(data)
    }

    pub fn extract_names(&self, text: &str) -> Vec<String> {
        text::extract_names(text)
    }

    pub fn extract_dates(&self, text: &str) -> Vec<chrono::NaiveDate> {
        text::extract_dates(text)
    }

    async fn try_extract_text(
        &self,
        id: ExtractionId,
        document: &RawDocument,
        language: &str,
    ) -> Result<ExtractedText> {
        let span = info_span!("extract", extraction_id = %id, bytes_len = document.len(), %language);
        async {
            if document.is_empty() {
                debug!("Empty document, nothing to recognise");
                return Ok(ExtractedText::empty(id, language, FileKind::Unknown));
            }
            if let Some(root) = &self.settings.temp_root {
                tokio::fs::create_dir_all(root).await.map_err(|err| {
                    EmargeError::Io(std::io::Error::new(
                        err.kind(),
                        format!("scratch root {} unusable: {err}", root.display()),
                    ))
                })?;
            }

            let kind = sniff::detect(document.bytes());
            let bytes = document.bytes();
            debug!(%kind, "File type detected");

            if kind != FileKind::Pdf {
                let text = self.ocr.recognize_image(bytes, kind, language).await;
                return Ok(finish(id, language, kind, text, ExtractionStrategy::Direct, None));
            }

            let direct = self.ocr.recognize_pdf(bytes, language).await;
            if !direct.trim().is_empty() {
                return Ok(finish(id, language, kind, direct, ExtractionStrategy::Direct, None));
            }

            debug!("No text from direct OCR, rasterizing");
            let pages = self.pipeline.rasterize(bytes).await;
            if pages.is_empty() {
                info!("No pages could be rendered");
                return Ok(ExtractedText::empty(id, language, kind));
            }
            let text = self.ocr.recognize_pages(&pages, language).await;
            Ok(finish(
                id,
                language,
                kind,
                text,
                ExtractionStrategy::Rasterized,
                Some(pages.len()),
            ))
        }
        .instrument(span)
        .await
    }
}

fn finish(
    id: ExtractionId,
    language: &str,
    kind: FileKind,
    text: String,
    strategy: ExtractionStrategy,
    page_count: Option<usize>,
) -> ExtractedText {
    let strategy = if text.trim().is_empty() {
        ExtractionStrategy::None
    } else {
        strategy
    };
    info!(%kind, ?strategy, chars = text.chars().count(), "Text extracted");
    ExtractedText {
        extraction_id: id,
        length: text.chars().count(),
        text,
        language: language.to_owned(),
        file_kind: kind,
        strategy,
        page_count,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use emarge_core::client_errors::to_client_error;
    use emarge_core::types::{PageImage, ToolId};

    use super::*;
    use crate::image::{blank_page_png, dimensions};
    use crate::ocr::testing::FakeEngine;
    use crate::pdf::fixtures::sample_pdf;
    use crate::raster::{Converter, PlaceholderConverter};
    use crate::raster::testing::FakeConverter;
    use crate::tools::ToolCatalog;

    /// PDFs have no text layer; each page TIFF is answered with its size.
    fn scanned_document_engine() -> FakeEngine {
        FakeEngine::new(|request, input| {
            if request.input.extension().is_some_and(|e| e == "pdf") {
                return Ok(String::new());
            }
            let (w, h) = dimensions(input)?;
            Ok(format!("page {w}x{h}"))
        })
    }

    fn extractor(
        settings: OcrSettings,
        converters: Vec<Box<dyn Converter>>,
        engine: Arc<FakeEngine>,
    ) -> Extractor {
        let locator = Arc::new(ToolLocator::new(ToolCatalog::default(), &settings));
        let pipeline = RasterizationPipeline::new(converters, settings.temp_root.clone());
        let ocr = OcrInvoker::new(engine, &settings);
        Extractor::with_parts(settings, locator, pipeline, ocr)
    }

    fn page(ordinal: u32, w: u32, h: u32) -> PageImage {
        PageImage::png(ordinal, blank_page_png(w, h).unwrap())
    }

    fn two_page_pdf() -> RawDocument {
        RawDocument::new(sample_pdf(&[(612, 792), (612, 792)]))
    }

    #[tokio::test]
    async fn empty_input_spawns_nothing() {
        let engine = Arc::new(FakeEngine::constant("should not be called"));
        let a = FakeConverter::yielding("ghostscript", vec![page(1, 4, 4)]);
        let calls = a.calls.clone();
        let ex = extractor(OcrSettings::default(), vec![Box::new(a)], engine.clone());

        let result = ex.extract_text(&RawDocument::new(Vec::new()), None).await;
        assert!(result.is_empty());
        assert_eq!(result.strategy, ExtractionStrategy::None);
        assert_eq!(result.language, "fra");
        assert_eq!(engine.call_count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pdf_with_text_layer_is_not_rasterized() {
        let engine = Arc::new(FakeEngine::constant("Feuille d'émargement"));
        let a = FakeConverter::yielding("ghostscript", vec![page(1, 4, 4)]);
        let calls = a.calls.clone();
        let ex = extractor(OcrSettings::default(), vec![Box::new(a)], engine.clone());

        let result = ex.extract_text(&two_page_pdf(), None).await;
        assert_eq!(result.text, "Feuille d'émargement");
        assert_eq!(result.strategy, ExtractionStrategy::Direct);
        assert_eq!(result.length, 20);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn two_scanned_pages_only_ghostscript() {
        let engine = Arc::new(scanned_document_engine());
        let gs = FakeConverter::yielding("ghostscript", vec![page(1, 10, 20), page(2, 20, 10)]);
        let ex = extractor(OcrSettings::default(), vec![Box::new(gs)], engine.clone());

        let result = ex.extract_text(&two_page_pdf(), Some("fra")).await;
        assert_eq!(result.text, "page 10x20\npage 20x10\n");
        assert_eq!(result.strategy, ExtractionStrategy::Rasterized);
        assert_eq!(result.page_count, Some(2));

        let calls = engine.calls.lock().unwrap();
        // Direct PDF attempt, then one call per page in order.
        assert_eq!(calls.len(), 3);
        assert!(calls[1].input.ends_with("page_1.tif"));
        assert!(calls[2].input.ends_with("page_2.tif"));
    }

    #[tokio::test]
    async fn imagemagick_used_when_ghostscript_missing() {
        let engine = Arc::new(scanned_document_engine());
        let gs = FakeConverter::unavailable("ghostscript", ToolId::Ghostscript);
        let magick = FakeConverter::yielding("imagemagick", vec![page(1, 30, 30)]);
        let placeholder = FakeConverter::yielding("placeholder", vec![page(1, 1, 1)]);
        let ex = extractor(
            OcrSettings::default(),
            vec![Box::new(gs), Box::new(magick), Box::new(placeholder)],
            engine,
        );

        let result = ex.extract_text(&two_page_pdf(), None).await;
        assert_eq!(result.text, "page 30x30\n");
    }

    #[tokio::test]
    async fn placeholders_when_no_renderer_available() {
        let settings = OcrSettings::default();
        let engine = Arc::new(scanned_document_engine());
        let ex = extractor(
            settings.clone(),
            vec![
                Box::new(FakeConverter::unavailable("ghostscript", ToolId::Ghostscript)),
                Box::new(FakeConverter::unavailable("imagemagick", ToolId::ImageMagick)),
                Box::new(FakeConverter::unavailable("pdfium", ToolId::Pdfium)),
                Box::new(PlaceholderConverter::new(&settings)),
            ],
            engine.clone(),
        );

        let result = ex.extract_text(&two_page_pdf(), None).await;
        assert_eq!(result.page_count, Some(2));
        assert_eq!(result.text, "page 1545x2000\npage 1545x2000\n");
        assert_eq!(engine.call_count(), 3);
    }

    #[tokio::test]
    async fn unrenderable_pdf_is_empty() {
        let engine = Arc::new(scanned_document_engine());
        let gs = FakeConverter::unavailable("ghostscript", ToolId::Ghostscript);
        let ex = extractor(OcrSettings::default(), vec![Box::new(gs)], engine);

        let result = ex
            .extract_text(&RawDocument::new(b"%PDF-1.4 broken".to_vec()), None)
            .await;
        assert!(result.is_empty());
        assert_eq!(result.file_kind, FileKind::Pdf);
        assert_eq!(result.page_count, None);
    }

    #[tokio::test]
    async fn image_is_recognised_directly() {
        let engine = Arc::new(FakeEngine::constant("Jean Dupont"));
        let ex = extractor(OcrSettings::default(), Vec::new(), engine.clone());
        let png = blank_page_png(4, 4).unwrap();

        let result = ex.extract_text(&RawDocument::new(png), Some("eng")).await;
        assert_eq!(result.file_kind, FileKind::Png);
        assert_eq!(result.strategy, ExtractionStrategy::Direct);
        assert_eq!(result.language, "eng");
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn unknown_bytes_are_decoded_by_content() {
        let engine = Arc::new(FakeEngine::constant("Jean Dupont"));
        let ex = extractor(OcrSettings::default(), Vec::new(), engine.clone());

        // Not an image at all: nothing reaches the engine.
        let result = ex.extract_text(&RawDocument::new(b"GIF89a....".to_vec()), None).await;
        assert_eq!(result.file_kind, FileKind::Unknown);
        assert_eq!(result.strategy, ExtractionStrategy::None);
        assert_eq!(engine.call_count(), 0);

        // A real image with an unrecognised signature still gets recognised.
        let mut bmp = Vec::new();
        ::image::RgbImage::new(4, 4)
            .write_to(&mut std::io::Cursor::new(&mut bmp), ::image::ImageFormat::Bmp)
            .unwrap();
        let result = ex.extract_text(&RawDocument::new(bmp), None).await;
        assert_eq!(result.file_kind, FileKind::Unknown);
        assert_eq!(result.strategy, ExtractionStrategy::Direct);
        assert_eq!(engine.call_count(), 1);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = OcrSettings {
            raster_dpi: 0,
            ..OcrSettings::default()
        };
        let err = Extractor::new(settings).err().unwrap();
        assert!(matches!(err, EmargeError::Config(_)));
        assert!(Extractor::new(OcrSettings::default()).is_ok());
    }

    #[tokio::test]
    async fn quality_validation() {
        let good_engine = Arc::new(FakeEngine::constant("Jean Dupont 15/01/2024"));
        let bad_engine = Arc::new(FakeEngine::constant("|~ ;; ,. !! a"));
        let good = extractor(OcrSettings::default(), Vec::new(), good_engine);
        let bad = extractor(OcrSettings::default(), Vec::new(), bad_engine);
        let doc = RawDocument::new(blank_page_png(4, 4).unwrap());
        assert!(good.validate_quality(&doc).await);
        assert!(!bad.validate_quality(&doc).await);
        assert!(!good.validate_quality(&RawDocument::new(Vec::new())).await);
    }

    #[tokio::test]
    async fn emargement_analysis() {
        let engine = Arc::new(FakeEngine::constant(
            "Feuille d'émargement\nNom\nSignature\nJean Dupont\nMarie Martin\nLe 15/01/2024",
        ));
        let ex = extractor(OcrSettings::default(), Vec::new(), engine);
        let doc = RawDocument::new(blank_page_png(4, 4).unwrap());

        let data = ex.extract_emargement(&doc).await.unwrap();
        assert_eq!(data.names, vec!["Feuille", "Jean Dupont", "Marie Martin"]);
        assert_eq!(data.dates.len(), 1);
        assert!(data.has_signatures);
        assert!(data.has_table_structure);
    }

    #[tokio::test]
    async fn emargement_failure_is_structured() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let settings = OcrSettings {
            temp_root: Some(blocker.join("scratch")),
            ..OcrSettings::default()
        };
        let ex = extractor(settings, Vec::new(), Arc::new(FakeEngine::constant("x")));
        let doc = RawDocument::new(blank_page_png(4, 4).unwrap());

        let err = ex.extract_emargement(&doc).await.unwrap_err();
        assert_eq!(err.code(), "OCR_ERROR");
        assert_eq!(to_client_error(&err).status, 422);

        // The plain path degrades instead.
        let text = ex.extract_text(&doc, None).await;
        assert!(text.is_empty());
    }

    #[test]
    fn name_and_date_helpers() {
        let ex = extractor(OcrSettings::default(), Vec::new(), Arc::new(FakeEngine::constant("")));
        assert_eq!(ex.extract_names("Jean Dupont"), vec!["Jean Dupont"]);
        assert_eq!(ex.extract_dates("01/02/2025").len(), 1);
    }
}
