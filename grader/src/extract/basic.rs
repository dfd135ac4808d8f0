//! Bounded basic fraction extraction.
//!
//! When no labeled pattern matched anywhere, scan for any `N/M` pair that passes
//! sanity limits: `N <= M` and `M` no larger than twice the assignment's maximum
//! (a model occasionally doubles the denominator when it sub-scores sections).
//! A fraction whose denominator is exactly the assignment maximum is preferred
//! over arbitrary pairs by pattern order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::ParseMethod;

use super::{StageGrade, capture_u32};

/// Static fraction shapes; the denominator-specific shape is built per call.
static BASIC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(\d+)\s*/\s*(\d+)",
        r"(?i)(\d+)\s*points?\s*out\s*of\s*(\d+)",
        r"(?i)score\s*[:\-]?\s*(\d+)\s*/\s*(\d+)",
        r"(?i)grade\s*[:\-]?\s*(\d+)\s*/\s*(\d+)",
        r"(?i)earned\s*[:\-]?\s*(\d+)\s*/\s*(\d+)",
        r"(?i)(\d+)\s*out\s*of\s*(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid basic extraction regex"))
    .collect()
});

/// Stage 4: any sane fraction, preferring matches against the caller's denominator.
pub(crate) fn basic_extraction(text: &str, max_points: u32) -> Option<StageGrade> {
    // Exact-denominator matches first.
    let exact = Regex::new(&format!(r"(?i)(\d+)\s*/\s*{max_points}\b")).ok()?;
    for caps in exact.captures_iter(text) {
        if let Some(score) = capture_u32(&caps, 1) {
            if score <= max_points {
                return Some(stage(score, max_points));
            }
        }
    }

    for pattern in BASIC_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let Some(score) = capture_u32(&caps, 1) else {
                continue;
            };
            let Some(found_max) = capture_u32(&caps, 2) else {
                continue;
            };
            if score <= found_max && found_max <= max_points.saturating_mul(2) && found_max > 0 {
                return Some(stage(score, found_max));
            }
        }
    }

    None
}

fn stage(score: u32, max_points: u32) -> StageGrade {
    StageGrade {
        score,
        max_points,
        letter_grade: None,
        percentage: None,
        method: ParseMethod::BasicExtraction,
    }
}
