// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File type detection from magic bytes.

use emarge_core::types::FileKind;

const PDF_MAGIC: &[u8; 4] = b"%PDF";
const JPEG_MAGIC: &[u8; 3] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8; 8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Classify a byte buffer by its leading signature.
///
/// Looks at no more than the first 8 bytes. Anything shorter than 4 bytes is
/// `Unknown`, even if it would match the 3-byte JPEG prefix.
pub fn detect(bytes: &[u8]) -> FileKind {
    if bytes.len() < 4 {
        return FileKind::Unknown;
    }
    if bytes.starts_with(PDF_MAGIC) {
        FileKind::Pdf
    } else if bytes.starts_with(JPEG_MAGIC) {
        FileKind::Jpeg
    } else if bytes.starts_with(PNG_MAGIC) {
        FileKind::Png
    } else {
        FileKind::Unknown
    }
}
