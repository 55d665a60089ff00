// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR (Optical Character Recognition) through an external engine.
//
// The engine is abstracted behind `OcrEngine` so the invoker's ordering and
// degradation rules can be exercised without Tesseract installed.

pub mod invoker;
pub mod tesseract;

use std::path::PathBuf;

use async_trait::async_trait;
use emarge_core::error::Result;
use emarge_core::types::ToolHandle;

pub use invoker::OcrInvoker;
pub use tesseract::TesseractEngine;

/// One recognition run: read `input`, write `<output_stem>.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest {
    pub input: PathBuf,
    pub output_stem: PathBuf,
    /// Tesseract language code, `+`-joined for several (e.g. `fra+eng`).
    pub language: String,
    /// Resolution hint for inputs that carry none (PDFs).
    pub dpi: Option<u32>,
}

impl OcrRequest {
    /// Where the engine leaves its text output.
    pub fn output_path(&self) -> PathBuf {
        let mut path = self.output_stem.clone().into_os_string();
        path.push(".txt");
        PathBuf::from(path)
    }
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Locate the engine executable, if installed.
    async fn resolve(&self) -> Option<ToolHandle>;

    /// Recognise one input file and return its text.
    async fn run(&self, tool: &ToolHandle, request: &OcrRequest) -> Result<String>;
}
