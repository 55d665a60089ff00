// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client-visible error mapping.
//
// The HTTP layer that receives uploads is outside this workspace; it asks this
// module how an `EmargeError` should be reported. Failures of the
// attendance-sheet path are client errors (422) with a stable code; anything
// else is an internal error whose detail stays in the logs.

use serde::{Deserialize, Serialize};

use crate::error::EmargeError;

/// How an error is presented to an API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientError {
    /// HTTP status code the caller should answer with.
    pub status: u16,
    /// Stable machine-readable code.
    #[serde(rename = "errorCode")]
    pub code: String,
    /// Message safe to show to the client.
    pub message: String,
}

/// Map an `EmargeError` to what the client gets to see.
pub fn to_client_error(err: &EmargeError) -> ClientError {
    match err {
        EmargeError::StructuredExtraction { message, .. } => ClientError {
            status: 422,
            code: err.code().into(),
            message: message.clone(),
        },

        EmargeError::Config(_) => ClientError {
            status: 500,
            code: err.code().into(),
            message: "The OCR service is misconfigured.".into(),
        },

        EmargeError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => ClientError {
            status: 400,
            code: err.code().into(),
            message: "The file could not be found.".into(),
        },

        _ => ClientError {
            status: 500,
            code: "INTERNAL_ERROR".into(),
            message: "Server error".into(),
        },
    }
}
