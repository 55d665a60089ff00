// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Attendance-sheet ("feuille d'émargement") analysis of recognised text.

use chrono::Utc;
use emarge_core::types::EmargementData;
use tracing::debug;

use super::{extract_dates, extract_names};

/// Words that show a sheet carries signatures or presence marks.
pub const SIGNATURE_KEYWORDS: &[&str] =
    &["signature", "signé", "signer", "émargement", "présent", "absence"];

/// Column headings typical of a sign-in table.
pub const TABLE_KEYWORDS: &[&str] = &["nom", "prénom", "date", "matin", "après-midi", "am", "pm"];

/// Case-insensitive substring search for any keyword.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    keywords.iter().any(|kw| lowered.contains(kw))
}

/// Names, dates, and signature/table markers of an attendance sheet.
pub fn analyze_emargement(text: &str) -> EmargementData {
    let data = EmargementData {
        raw_text: text.to_owned(),
        names: extract_names(text),
        dates: extract_dates(text),
        has_signatures: contains_any(text, SIGNATURE_KEYWORDS),
        has_table_structure: contains_any(text, TABLE_KEYWORDS),
        extracted_at: Utc::now(),
        confidence: 0,
    };
    debug!(
        names = data.names.len(),
        dates = data.dates.len(),
        has_signatures = data.has_signatures,
        has_table = data.has_table_structure,
        "Attendance sheet analysed"
    );
    data
}
