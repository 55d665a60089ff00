// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Each writes its report to `out` and returns the
// process exit code.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use emarge_core::OcrSettings;
use emarge_core::client_errors::to_client_error;
use emarge_core::error::Result;
use emarge_core::types::RawDocument;
use emarge_document::{Extractor, ToolLocator, detect};
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify a file by its magic bytes.
    Detect { file: PathBuf },
    /// Recognise the text of a PDF or image.
    Extract {
        file: PathBuf,
        /// Tesseract language, e.g. `fra` or `fra+eng`.
        #[arg(long)]
        lang: Option<String>,
    },
    /// Check whether the recognised text looks like real text.
    Validate { file: PathBuf },
    /// Extract names, dates and markers from an attendance sheet.
    Emargement { file: PathBuf },
    /// Show where each external tool was found.
    Tools,
}

pub const EXIT_OK: u8 = 0;
pub const EXIT_INVALID: u8 = 1;
pub const EXIT_FAILURE: u8 = 2;

async fn read_document(path: &Path) -> Result<RawDocument> {
    let bytes = tokio::fs::read(path).await?;
    let mut document = RawDocument::new(bytes);
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        document = document.with_file_name(name);
    }
    if !document.is_accepted_upload() {
        warn!(path = %path.display(), "File is not a PDF, JPEG or PNG upload");
    }
    Ok(document)
}

fn print_json(out: &mut impl Write, value: &impl serde::Serialize) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub async fn run(
    command: Command,
    settings: &OcrSettings,
    as_json: bool,
    out: &mut impl Write,
) -> Result<u8> {
    match command {
        Command::Detect { file } => {
            let document = read_document(&file).await?;
            let kind = detect(document.bytes());
            if as_json {
                print_json(
                    out,
                    &json!({
                        "kind": kind,
                        "mime": kind.mime_type(),
                        "category": document.category(),
                        "accepted": document.is_accepted_upload(),
                        "sha256": document.fingerprint(),
                    }),
                )?;
            } else {
                writeln!(out, "{kind}\t{:?}", document.category())?;
            }
            Ok(EXIT_OK)
        }

        Command::Extract { file, lang } => {
            let document = read_document(&file).await?;
            let extractor = Extractor::new(settings.clone())?;
            let extracted = extractor.extract_text(&document, lang.as_deref()).await;
            if as_json {
                print_json(out, &extracted)?;
            } else {
                write!(out, "{}", extracted.text)?;
                if !extracted.text.ends_with('\n') {
                    writeln!(out)?;
                }
            }
            Ok(EXIT_OK)
        }

        Command::Validate { file } => {
            let document = read_document(&file).await?;
            let valid = Extractor::new(settings.clone())?
                .validate_quality(&document)
                .await;
            if as_json {
                print_json(out, &json!({ "valid": valid }))?;
            } else {
                writeln!(out, "{}", if valid { "valid" } else { "invalid" })?;
            }
            Ok(if valid { EXIT_OK } else { EXIT_INVALID })
        }

        Command::Emargement { file } => {
            let document = read_document(&file).await?;
            match Extractor::new(settings.clone())?.extract_emargement(&document).await {
                Ok(data) => {
                    print_json(out, &data)?;
                    Ok(EXIT_OK)
                }
                Err(err) => {
                    print_json(out, &to_client_error(&err))?;
                    Ok(EXIT_FAILURE)
                }
            }
        }

        Command::Tools => {
            let locator = ToolLocator::system(settings);
            let found = locator.locate_all().await;
            info!(
                found = found.iter().filter(|(_, h)| h.is_some()).count(),
                "Tool discovery finished"
            );
            if as_json {
                let report: Vec<_> = found
                    .iter()
                    .map(|(tool, handle)| json!({ "tool": tool, "handle": handle }))
                    .collect();
                print_json(out, &report)?;
            } else {
                for (tool, handle) in &found {
                    match handle {
                        Some(h) => writeln!(out, "{tool}\t{}\t{:?}", h.program().display(), h.source)?,
                        None => writeln!(out, "{tool}\tnot found")?,
                    }
                }
            }
            Ok(EXIT_OK)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run_to_string(command: Command, settings: &OcrSettings, as_json: bool) -> (u8, String) {
        let mut out = Vec::new();
        let code = run(command, settings, as_json, &mut out).await.unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn detect_plain_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("feuille_emargement.pdf");
        std::fs::write(&file, b"%PDF-1.7\n").unwrap();
        let settings = OcrSettings::default();

        let (code, text) = run_to_string(Command::Detect { file: file.clone() }, &settings, false).await;
        assert_eq!(code, EXIT_OK);
        assert_eq!(text, "PDF\tEmargement\n");

        let (_, text) = run_to_string(Command::Detect { file }, &settings, true).await;
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["kind"], "Pdf");
        assert_eq!(value["mime"], "application/pdf");
        assert_eq!(value["accepted"], true);
    }

    #[tokio::test]
    async fn empty_file_extracts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.pdf");
        std::fs::write(&file, b"").unwrap();

        let (code, text) = run_to_string(
            Command::Extract { file, lang: None },
            &OcrSettings::default(),
            true,
        )
        .await;
        assert_eq!(code, EXIT_OK);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["text"], "");
        assert_eq!(value["strategy"], "None");
    }

    #[tokio::test]
    async fn empty_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.png");
        std::fs::write(&file, b"").unwrap();
        let (code, text) =
            run_to_string(Command::Validate { file }, &OcrSettings::default(), false).await;
        assert_eq!(code, EXIT_INVALID);
        assert_eq!(text, "invalid\n");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let mut out = Vec::new();
        let result = run(
            Command::Detect { file: PathBuf::from("/nonexistent/emarge/scan.pdf") },
            &OcrSettings::default(),
            false,
            &mut out,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn emargement_failure_prints_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sheet.png");
        std::fs::write(&file, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let settings = OcrSettings {
            temp_root: Some(blocker.join("scratch")),
            ..OcrSettings::default()
        };

        let (code, text) = run_to_string(Command::Emargement { file }, &settings, false).await;
        assert_eq!(code, EXIT_FAILURE);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["errorCode"], "OCR_ERROR");
        assert_eq!(value["status"], 422);
    }

    #[tokio::test]
    async fn invalid_settings_fail_before_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("scan.pdf");
        std::fs::write(&file, b"%PDF-1.4\n").unwrap();
        let settings = OcrSettings {
            raster_dpi: 0,
            ..OcrSettings::default()
        };

        let mut out = Vec::new();
        let err = run(Command::Extract { file, lang: None }, &settings, false, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, emarge_core::error::EmargeError::Config(_)));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn tools_report_lists_every_tool() {
        let (code, text) = run_to_string(Command::Tools, &OcrSettings::default(), true).await;
        assert_eq!(code, EXIT_OK);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 4);
    }
}
