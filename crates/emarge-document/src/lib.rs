// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// emarge-document — Text extraction for uploaded training documents.
//
// Detects the file type, locates external tools (Tesseract, Ghostscript,
// ImageMagick, PDFium), rasterizes PDFs through an ordered engine chain, runs
// OCR, and post-processes the text into attendance-sheet data (names, dates,
// signature and table markers).

pub mod extract;
pub mod image;
pub mod ocr;
pub mod pdf;
pub mod process;
pub mod raster;
pub mod sniff;
pub mod text;
pub mod tools;
pub mod workspace;

// Re-export the primary entry points so callers can use `emarge_document::Extractor` etc.
pub use extract::Extractor;
pub use ocr::{OcrEngine, OcrInvoker, TesseractEngine};
pub use pdf::PdfReader;
pub use raster::{Converter, RasterizationPipeline};
pub use sniff::detect;
pub use tools::ToolLocator;
pub use workspace::TempWorkspace;
