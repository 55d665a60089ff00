// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Day-first calendar dates (`15/01/2024`, `25-12-24`) in recognised text.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{1,2})[/-]([0-9]{1,2})[/-]([0-9]{2,4})").expect("valid date regex")
});

/// Calendar dates in `D/M/Y` or `D-M-Y` form, unique and ascending.
///
/// Two-digit years are read as 20xx. Matches that are not real dates
/// (`31/02/2024`, month 13, year 0) are dropped.
pub fn extract_dates(text: &str) -> Vec<NaiveDate> {
    let dates: BTreeSet<NaiveDate> = RE_DATE
        .captures_iter(text)
        .filter_map(|caps| {
            let day: u32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let year_digits = &caps[3];
            let mut year: i32 = year_digits.parse().ok()?;
            if year_digits.len() == 2 {
                year += 2000;
            }
            if year < 1 {
                return None;
            }
            NaiveDate::from_ymd_opt(year, month, day)
        })
        .collect();
    dates.into_iter().collect()
}
