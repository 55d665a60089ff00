// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.
//
// The DPI and quality thresholds were tuned empirically against real scans,
// so they live here as named, overridable values rather than literals.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EmargeError, Result};

/// Environment variable overriding the OCR trained-data directory.
pub const ENV_TESSDATA_DIR: &str = "EMARGE_TESSDATA_DIR";
/// Environment variable overriding the default recognition language.
pub const ENV_OCR_LANGUAGE: &str = "EMARGE_OCR_LANGUAGE";
/// Environment variable overriding the rasterization DPI.
pub const ENV_RASTER_DPI: &str = "EMARGE_RASTER_DPI";
/// Environment variable overriding the number of pages OCRed concurrently.
pub const ENV_OCR_CONCURRENCY: &str = "EMARGE_OCR_CONCURRENCY";

/// Settings for the OCR and rasterization pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Default recognition language (Tesseract language code).
    pub language: String,
    /// Application-local trained-data directory, preferred when it holds
    /// `<language>.traineddata`.
    pub tessdata_dir: PathBuf,
    /// Resolution used when rasterizing PDF pages.
    pub raster_dpi: u32,
    /// DPI hint passed to the OCR engine for direct PDF recognition.
    pub ocr_dpi_hint: u32,
    /// Resolution of the blank placeholder pages emitted by the last-resort
    /// fallback.
    pub placeholder_dpi: u32,
    /// Upper bound on either side of a placeholder page, in pixels.
    pub placeholder_max_dimension: u32,
    /// Minimum alphanumeric ratio for text to count as usable (inclusive).
    pub quality_threshold: f64,
    /// Timeout for tool discovery version checks, in seconds.
    pub verify_timeout_secs: u64,
    /// Timeout for conversion and OCR processes, in seconds.
    pub process_timeout_secs: u64,
    /// Maximum number of pages OCRed at the same time.
    pub ocr_concurrency: usize,
    /// Keep successful tool discoveries between calls.
    pub cache_tool_paths: bool,
    /// Parent of per-call scratch directories (`None` = system temp dir).
    pub temp_root: Option<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "fra".into(),
            tessdata_dir: PathBuf::from("./tessdata"),
            raster_dpi: 300,
            ocr_dpi_hint: 300,
            placeholder_dpi: 200,
            placeholder_max_dimension: 2000,
            quality_threshold: 0.5,
            verify_timeout_secs: 2,
            process_timeout_secs: 120,
            ocr_concurrency: 1,
            cache_tool_paths: true,
            temp_root: None,
        }
    }
}

impl OcrSettings {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    /// Load settings from a JSON file, then overlay the process environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|err| {
            EmargeError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        let mut settings: Self = serde_json::from_str(&data)?;
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Overlay values from an environment lookup. Unparseable numbers are
    /// ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_TESSDATA_DIR).filter(|v| !v.is_empty()) {
            self.tessdata_dir = PathBuf::from(dir);
        }
        if let Some(lang) = lookup(ENV_OCR_LANGUAGE).filter(|v| !v.is_empty()) {
            self.language = lang;
        }
        if let Some(dpi) = lookup(ENV_RASTER_DPI).and_then(|v| v.parse().ok()) {
            self.raster_dpi = dpi;
        }
        if let Some(n) = lookup(ENV_OCR_CONCURRENCY).and_then(|v| v.parse().ok()) {
            self.ocr_concurrency = n;
        }
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(EmargeError::Config("language must not be empty".into()));
        }
        if self.raster_dpi == 0 || self.placeholder_dpi == 0 {
            return Err(EmargeError::Config("DPI values must be positive".into()));
        }
        if self.placeholder_max_dimension == 0 {
            return Err(EmargeError::Config(
                "placeholder_max_dimension must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(EmargeError::Config(format!(
                "quality_threshold must be within 0..=1, got {}",
                self.quality_threshold
            )));
        }
        if self.ocr_concurrency == 0 {
            return Err(EmargeError::Config("ocr_concurrency must be at least 1".into()));
        }
        Ok(())
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }
}
