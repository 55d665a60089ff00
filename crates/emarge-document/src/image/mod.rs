// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — page image encoding for rasterization and OCR.

pub mod encode;

pub use encode::{blank_page_png, dimensions, encode_png, page_to_tiff, to_tiff_lzw};
