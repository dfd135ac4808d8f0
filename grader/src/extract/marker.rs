//! Marker-block extraction stages.
//!
//! The grading prompt instructs the model to open its reply with a delimited block:
//!
//! ```text
//! GRADE_START
//! Points Earned: 85/100
//! Letter Grade: B+
//! Percentage: 85%
//! GRADE_END
//! ```
//!
//! [`marker_based`] requires the labeled earned/total field exactly as prompted;
//! [`enhanced_marker`] re-scans the same block tolerating formatting drift
//! (`"X out of Y"`, spacing, `Score:` instead of `Points Earned:`, lowercase
//! markers). Letter grade and percentage are optional in both; the finalizer
//! computes them from the score when absent.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::ParseMethod;

use super::{StageGrade, capture_u32};

static MARKER_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)GRADE_START(.*?)GRADE_END").expect("valid marker regex"));

static MARKER_BLOCK_CI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)GRADE_START(.*?)GRADE_END").expect("valid marker regex"));

static POINTS_EARNED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Points Earned:\s*(\d+)/(\d+)").expect("valid score regex"));

static LETTER_GRADE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Letter Grade:\s*([A-F][+-]?)").expect("valid letter regex"));

static PERCENTAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Percentage:\s*(\d+)%").expect("valid percentage regex"));

/// Tolerant earned/total variants, tried in order.
static ENHANCED_SCORES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)Points\s+Earned:\s*(\d+)/(\d+)",
        r"(?i)Points\s+Earned:\s*(\d+)\s*/\s*(\d+)",
        r"(?i)Points\s+Earned:\s*(\d+)\s*out\s*of\s*(\d+)",
        r"(?i)Score:\s*(\d+)/(\d+)",
        r"(\d+)/(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid enhanced score regex"))
    .collect()
});

/// Tolerant letter-grade variants.
static ENHANCED_LETTERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)Letter\s+Grade:\s*([A-F][+-]?)",
        r"(?i)Grade:\s*([A-F][+-]?)",
        r"(?i)Letter:\s*([A-F][+-]?)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid enhanced letter regex"))
    .collect()
});

/// Tolerant percentage variants.
static ENHANCED_PERCENTAGES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)Percentage:\s*(\d+)%", r"(\d+)%"]
        .iter()
        .map(|p| Regex::new(p).expect("valid enhanced percentage regex"))
        .collect()
});

/// Stage 1: strict marker block. Requires the labeled `Points Earned: N/M` field.
pub(crate) fn marker_based(text: &str) -> Option<StageGrade> {
    let block = MARKER_BLOCK.captures(text)?.get(1)?.as_str().trim().to_string();

    let caps = POINTS_EARNED.captures(&block)?;
    let score = capture_u32(&caps, 1)?;
    let max_points = capture_u32(&caps, 2)?;

    let letter_grade = LETTER_GRADE
        .captures(&block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let percentage = PERCENTAGE
        .captures(&block)
        .and_then(|c| capture_u32(&c, 1));

    Some(StageGrade {
        score,
        max_points,
        letter_grade,
        percentage,
        method: ParseMethod::MarkerBased,
    })
}

/// Stage 2: marker block with tolerant field formats.
pub(crate) fn enhanced_marker(text: &str) -> Option<StageGrade> {
    let block = MARKER_BLOCK_CI
        .captures(text)?
        .get(1)?
        .as_str()
        .trim()
        .to_string();

    let (score, max_points) = ENHANCED_SCORES.iter().find_map(|pattern| {
        let caps = pattern.captures(&block)?;
        Some((capture_u32(&caps, 1)?, capture_u32(&caps, 2)?))
    })?;

    let letter_grade = ENHANCED_LETTERS.iter().find_map(|pattern| {
        pattern
            .captures(&block)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    });

    let percentage = ENHANCED_PERCENTAGES
        .iter()
        .find_map(|pattern| pattern.captures(&block).and_then(|c| capture_u32(&c, 1)));

    Some(StageGrade {
        score,
        max_points,
        letter_grade,
        percentage,
        method: ParseMethod::EnhancedMarker,
    })
}
