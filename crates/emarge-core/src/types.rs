// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Emarge OCR pipeline.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Identifier correlating the log output of one extraction call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractionId(pub Uuid);

impl ExtractionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExtractionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExtractionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File format as classified from leading magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Pdf,
    Jpeg,
    Png,
    Unknown,
}

impl FileKind {
    /// MIME type string for the format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Whether the format is a single raster image.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pdf => "PDF",
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Compliance document category, guessed from an upload's filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentCategory {
    /// Attendance / sign-in sheet.
    Emargement,
    /// Training programme.
    Programme,
    Evaluation,
    Convention,
    Attestation,
    Other,
}

impl DocumentCategory {
    /// Infer the category from a filename (case-insensitive keyword match).
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("émargement") || lower.contains("emargement") {
            Self::Emargement
        } else if lower.contains("programme") {
            Self::Programme
        } else if lower.contains("évaluation") || lower.contains("evaluation") {
            Self::Evaluation
        } else if lower.contains("convention") {
            Self::Convention
        } else if lower.contains("attestation") {
            Self::Attestation
        } else {
            Self::Other
        }
    }
}

/// An uploaded document: raw bytes plus the weak hints the uploader supplied.
///
/// Classification always goes by magic bytes; the hints only gate which
/// uploads are accepted and help pick a [`DocumentCategory`].
#[derive(Debug, Clone, Default)]
pub struct RawDocument {
    bytes: Vec<u8>,
    mime_hint: Option<String>,
    file_name: Option<String>,
}

impl RawDocument {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_hint: None,
            file_name: None,
        }
    }

    pub fn with_mime_hint(mut self, mime: impl Into<String>) -> Self {
        self.mime_hint = Some(mime.into());
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_hint(&self) -> Option<&str> {
        self.mime_hint.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the declared content type or filename names a PDF, JPEG or PNG.
    pub fn is_accepted_upload(&self) -> bool {
        let mime = self.mime_hint.as_deref().unwrap_or("").to_ascii_lowercase();
        let name = self.file_name.as_deref().unwrap_or("").to_lowercase();

        let is_pdf = mime.contains("pdf") || name.ends_with(".pdf");
        let is_jpeg = mime.contains("jpeg")
            || mime.contains("jpg")
            || name.ends_with(".jpg")
            || name.ends_with(".jpeg");
        let is_png = mime.contains("png") || name.ends_with(".png");

        is_pdf || is_jpeg || is_png
    }

    /// Category guessed from the filename hint.
    pub fn category(&self) -> DocumentCategory {
        self.file_name
            .as_deref()
            .map(DocumentCategory::from_file_name)
            .unwrap_or(DocumentCategory::Other)
    }

    /// Lowercase hex SHA-256 of the document bytes.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }
}

/// Encoding of a page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageEncoding {
    Png,
    Jpeg,
    Tiff,
    /// Uploaded bytes of unrecognised format; decoding guesses the format.
    Unknown,
}

impl ImageEncoding {
    /// Encoding of an uploaded image of the given kind.
    pub fn from_file_kind(kind: FileKind) -> Self {
        match kind {
            FileKind::Png => Self::Png,
            FileKind::Jpeg => Self::Jpeg,
            FileKind::Pdf | FileKind::Unknown => Self::Unknown,
        }
    }
}

/// One page image, rasterized or uploaded. Ordinals start at 1 and follow
/// source page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub ordinal: u32,
    pub encoding: ImageEncoding,
    pub bytes: Vec<u8>,
}

impl PageImage {
    pub fn png(ordinal: u32, bytes: Vec<u8>) -> Self {
        Self {
            ordinal,
            encoding: ImageEncoding::Png,
            bytes,
        }
    }

    /// A single uploaded image, as page 1.
    pub fn upload(kind: FileKind, bytes: Vec<u8>) -> Self {
        Self {
            ordinal: 1,
            encoding: ImageEncoding::from_file_kind(kind),
            bytes,
        }
    }
}

/// Which path of the extraction state machine produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStrategy {
    /// OCR ran directly on the uploaded image or PDF.
    Direct,
    /// The PDF was rasterized and each page OCRed.
    Rasterized,
    /// Nothing was attempted or every attempt came back empty.
    None,
}

/// Recognized text for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    pub extraction_id: ExtractionId,
    pub text: String,
    pub language: String,
    /// Length of `text` in characters.
    pub length: usize,
    pub file_kind: FileKind,
    pub strategy: ExtractionStrategy,
    /// Number of rasterized pages, when the rasterize path ran.
    pub page_count: Option<usize>,
}

impl ExtractedText {
    /// An empty result (nothing recognized).
    pub fn empty(extraction_id: ExtractionId, language: &str, file_kind: FileKind) -> Self {
        Self {
            extraction_id,
            text: String::new(),
            language: language.to_owned(),
            length: 0,
            file_kind,
            strategy: ExtractionStrategy::None,
            page_count: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Structured projection of an attendance sheet's recognized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmargementData {
    pub raw_text: String,
    /// Person names in document order, unique ignoring case.
    pub names: Vec<String>,
    /// Calendar dates, unique and ascending.
    pub dates: Vec<NaiveDate>,
    pub has_signatures: bool,
    pub has_table_structure: bool,
    pub extracted_at: DateTime<Utc>,
    /// Reserved; always 0 until a scoring model exists.
    pub confidence: u8,
}

/// External tools the pipeline knows how to discover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolId {
    /// OCR engine.
    Tesseract,
    /// PostScript/PDF interpreter (rasterization engine A).
    Ghostscript,
    /// Image conversion CLI (rasterization engine B).
    ImageMagick,
    /// In-process PDF rendering library (rasterization engine C).
    Pdfium,
}

impl ToolId {
    pub const ALL: [ToolId; 4] = [
        ToolId::Tesseract,
        ToolId::Ghostscript,
        ToolId::ImageMagick,
        ToolId::Pdfium,
    ];
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Tesseract => "Tesseract",
            Self::Ghostscript => "Ghostscript",
            Self::ImageMagick => "ImageMagick",
            Self::Pdfium => "PDFium",
        };
        f.write_str(name)
    }
}

/// How a tool was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolSource {
    /// A well-known absolute install path (or a `*_HOME` override).
    KnownPath,
    /// A versioned install directory found by enumerating its parent.
    VersionedDir,
    /// A bare executable name that answered a version check on `PATH`.
    SearchPath,
}

/// A located external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolHandle {
    pub tool: ToolId,
    /// Absolute path, or a bare executable name resolved through `PATH`.
    pub program: PathBuf,
    pub source: ToolSource,
}

impl ToolHandle {
    pub fn new(tool: ToolId, program: impl Into<PathBuf>, source: ToolSource) -> Self {
        Self {
            tool,
            program: program.into(),
            source,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Directory containing the executable, when it was found by path.
    pub fn install_dir(&self) -> Option<&Path> {
        match self.source {
            ToolSource::SearchPath => None,
            _ => self.program.parent(),
        }
    }
}
