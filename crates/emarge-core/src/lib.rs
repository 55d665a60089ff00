// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Emarge — Core types, configuration and error definitions shared across all crates.

pub mod client_errors;
pub mod config;
pub mod error;
pub mod types;

pub use config::OcrSettings;
pub use error::EmargeError;
pub use types::*;
