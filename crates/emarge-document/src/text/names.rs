// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Person-name candidates in recognised French text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Runs of capitalised words joined by spaces or tabs. A line break always
/// ends a name, so one name per line of a sign-in table stays separate.
static RE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\b[A-ZÉÈÊËÀÁÂÃÄÅÆÇÌÍÎÏÑÒÓÔÕÖØÙÚÛÜÝ][a-zéèêëàáâãäåæçìíîïñòóôõöøùúûüý]+",
        r"(?:[ \t]+[A-ZÉÈÊËÀÁÂÃÄÅÆÇÌÍÎÏÑÒÓÔÕÖØÙÚÛÜÝ][a-zéèêëàáâãäåæçìíîïñòóôõöøùúûüý]+)*\b",
    ))
    .expect("valid name regex")
});

/// Words that look like names on an attendance sheet but are headings,
/// articles or time-of-day labels.
const STOP_WORDS: &[&str] = &[
    "Le", "La", "Les", "De", "Du", "Des", "Et", "Ou", "Un", "Une", "Formation", "Session", "Date",
    "Nom", "Prénom", "Signature", "Matin", "Après", "Midi", "Jour", "Heure",
];

fn is_stop_word(candidate: &str) -> bool {
    let lowered = candidate.to_lowercase();
    STOP_WORDS.iter().any(|w| w.to_lowercase() == lowered)
}

/// Name candidates in document order, unique ignoring case.
///
/// A candidate must be longer than two characters and must not be, as a
/// whole, one of the stop words.
pub fn extract_names(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    RE_NAME
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|name| name.chars().count() > 2 && !is_stop_word(name))
        .filter(|name| seen.insert(name.to_lowercase()))
        .map(str::to_owned)
        .collect()
}
