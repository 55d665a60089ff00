// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Emarge.
//
// Most variants describe degraded conditions (a tool is missing, a process
// failed) that the pipeline absorbs and logs. Only `StructuredExtraction` is
// meant to reach a caller as a client-visible failure.

use thiserror::Error;

use crate::types::ToolId;

/// Top-level error type for all Emarge operations.
#[derive(Debug, Error)]
pub enum EmargeError {
    // -- External tools --
    #[error("{0} is not installed or could not be located")]
    ToolUnavailable(ToolId),

    #[error("{tool} exited with status {status:?}: {stderr}")]
    ProcessFailure {
        tool: ToolId,
        status: Option<i32>,
        stderr: String,
    },

    #[error("{tool} did not finish within {seconds}s")]
    Timeout { tool: ToolId, seconds: u64 },

    #[error("PDF conversion failed: {0}")]
    ConversionFailure(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    // -- Attendance-sheet analysis --
    #[error("{message}")]
    StructuredExtraction {
        message: String,
        #[source]
        source: Box<EmargeError>,
    },

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EmargeError {
    /// Wrap an unexpected failure of the attendance-sheet path.
    pub fn structured(message: impl Into<String>, source: EmargeError) -> Self {
        Self::StructuredExtraction {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Stable machine-readable code, safe to expose to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ToolUnavailable(_) => "TOOL_UNAVAILABLE",
            Self::ProcessFailure { .. } => "PROCESS_FAILURE",
            Self::Timeout { .. } => "PROCESS_TIMEOUT",
            Self::ConversionFailure(_) => "CONVERSION_FAILURE",
            Self::Pdf(_) => "PDF_ERROR",
            Self::Image(_) => "IMAGE_ERROR",
            Self::StructuredExtraction { .. } => "OCR_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether this error is an expected degradation the pipeline recovers from
    /// by falling back to another engine or to an empty result.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            Self::ToolUnavailable(_)
                | Self::ProcessFailure { .. }
                | Self::Timeout { .. }
                | Self::ConversionFailure(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EmargeError>;
