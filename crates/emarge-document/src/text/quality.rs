// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition quality heuristic: OCR garbage is mostly punctuation and
// stray symbols, real text is mostly letters and digits.

/// Share of letters and digits among non-whitespace characters.
///
/// Blank text has ratio 0.
pub fn quality_ratio(text: &str) -> f64 {
    let (mut alnum, mut visible) = (0usize, 0usize);
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        visible += 1;
        if c.is_alphanumeric() {
            alnum += 1;
        }
    }
    if visible == 0 {
        return 0.0;
    }
    alnum as f64 / visible as f64
}

/// Whether `text` is non-blank and its ratio reaches `threshold` (inclusive).
pub fn is_acceptable(text: &str, threshold: f64) -> bool {
    !text.trim().is_empty() && quality_ratio(text) >= threshold
}
