// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract command-line engine.
//
// Invocation: `tesseract <input> <output-stem> -l <lang> [--dpi <n>]`. The
// text lands in `<output-stem>.txt`; stdout carries nothing useful.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use emarge_core::config::OcrSettings;
use emarge_core::error::{EmargeError, Result};
use emarge_core::types::{ToolHandle, ToolId};
use tracing::{debug, instrument, warn};

use super::{OcrEngine, OcrRequest};
use crate::process;
use crate::tools::ToolLocator;

pub struct TesseractEngine {
    locator: Arc<ToolLocator>,
    tessdata_dir: PathBuf,
    timeout: Duration,
}

impl TesseractEngine {
    pub fn new(locator: Arc<ToolLocator>, settings: &OcrSettings) -> Self {
        Self {
            locator,
            tessdata_dir: settings.tessdata_dir.clone(),
            timeout: settings.process_timeout(),
        }
    }
}

/// Directory to export as `TESSDATA_PREFIX` for the child.
///
/// The application's own data directory wins when it holds a traineddata
/// file for every requested language; otherwise the `tessdata` directory of
/// the Tesseract install, when it exists. `None` leaves Tesseract's built-in
/// default in place.
pub fn resolve_tessdata(app_dir: &Path, language: &str, tool: &ToolHandle) -> Option<PathBuf> {
    let has_all = language
        .split('+')
        .filter(|lang| !lang.is_empty())
        .all(|lang| app_dir.join(format!("{lang}.traineddata")).is_file());
    if has_all && !language.is_empty() {
        return Some(std::path::absolute(app_dir).unwrap_or_else(|_| app_dir.to_path_buf()));
    }

    tool.install_dir()
        .map(|dir| dir.join("tessdata"))
        .filter(|dir| dir.is_dir())
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn resolve(&self) -> Option<ToolHandle> {
        self.locator.locate(ToolId::Tesseract).await
    }

    #[instrument(skip_all, fields(input = %request.input.display(), lang = %request.language))]
    async fn run(&self, tool: &ToolHandle, request: &OcrRequest) -> Result<String> {
        let mut cmd = process::command(tool.program());
        cmd.arg(&request.input)
            .arg(&request.output_stem)
            .arg("-l")
            .arg(&request.language);
        if let Some(dpi) = request.dpi {
            cmd.arg("--dpi").arg(dpi.to_string());
        }
        if let Some(tessdata) = resolve_tessdata(&self.tessdata_dir, &request.language, tool) {
            debug!(tessdata = %tessdata.display(), "Using tessdata directory");
            cmd.env("TESSDATA_PREFIX", tessdata);
        }

        let output = process::run(ToolId::Tesseract, cmd, self.timeout).await?;
        if !output.success() {
            warn!(
                exit_code = ?output.status.code(),
                stderr = %output.stderr,
                "Tesseract failed"
            );
            output.check(ToolId::Tesseract)?;
        }

        let txt = request.output_path();
        match tokio::fs::read(&txt).await {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                debug!(chars = text.chars().count(), "Tesseract output read");
                Ok(text)
            }
            Err(err) => Err(EmargeError::ConversionFailure(format!(
                "Tesseract produced no output file {}: {err}",
                txt.display()
            ))),
        }
    }
}
