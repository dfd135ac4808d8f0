//! # Grade Extraction Module
//!
//! Deterministic, ordered fallback chain that turns the model's free-text reply
//! into a structured grade. Each stage is a pure function over a normalized copy of
//! the text that either produces a [`StageGrade`] or declines, and the first stage
//! to produce one wins and stamps its [`ParseMethod`]. The sentiment stage at the
//! end of the chain always yields, so callers never receive a null score.
//!
//! Stage order:
//! 1. [`marker::marker_based`] - strict `GRADE_START`/`GRADE_END` block.
//! 2. [`marker::enhanced_marker`] - marker block with tolerant formatting variants.
//! 3. [`patterns::fallback_pattern`] - label-adjacent `N/M` patterns anywhere.
//! 4. [`basic::basic_extraction`] - any sane `N/M` pair within bounds.
//! 5. [`percentage::percentage_calculation`] - standalone percentage tokens.
//! 6. [`sentiment::sentiment_fallback`] - keyword-polarity bucket score.
//!
//! Every winning stage is finalized the same way: the score is capped at the
//! denominator, the percentage recomputed for consistency, and a letter grade
//! filled in from the fixed table when the stage did not find one.

pub mod basic;
pub mod marker;
pub mod patterns;
pub mod percentage;
pub mod sentiment;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::letter::{letter_for_percentage, percentage_of};
use crate::types::ParseMethod;

/// Intermediate grade produced by a single extraction stage, before finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageGrade {
    pub score: u32,
    pub max_points: u32,
    pub letter_grade: Option<String>,
    pub percentage: Option<u32>,
    pub method: ParseMethod,
}

/// Finalized extraction output, ready to be stamped into a `GradeResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedGrade {
    pub score: u32,
    pub max_points: u32,
    pub letter_grade: String,
    pub percentage: u32,
    pub parse_method: ParseMethod,
}

static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid blank-line regex"));

/// Strip markdown bold markers and collapse blank lines so stage patterns see a
/// predictable text shape.
fn normalize(text: &str) -> String {
    let stripped = text.replace("**", "");
    BLANK_LINES.replace_all(&stripped, "\n").trim().to_string()
}

/// Run the extraction chain over `raw_text` and finalize the winning stage.
pub fn extract(raw_text: &str, max_points: u32) -> ExtractedGrade {
    let text = normalize(raw_text);
    let stage = marker::marker_based(&text)
        .or_else(|| marker::enhanced_marker(&text))
        .or_else(|| patterns::fallback_pattern(&text))
        .or_else(|| basic::basic_extraction(&text, max_points))
        .or_else(|| percentage::percentage_calculation(&text, max_points))
        .unwrap_or_else(|| sentiment::sentiment_fallback(&text, max_points));
    tracing::debug!("Extraction stage {} produced {}/{}", stage.method, stage.score, stage.max_points);
    finalize(stage, max_points)
}

/// Enforce the structural invariants on a stage's output: cap the score at the
/// denominator (recomputing the percentage when capping changes it), and fill in
/// the letter grade from the percentage table when absent.
fn finalize(stage: StageGrade, caller_max: u32) -> ExtractedGrade {
    let max_points = if stage.max_points == 0 {
        caller_max
    } else {
        stage.max_points
    };

    let mut score = stage.score;
    let mut percentage = stage.percentage;
    if score > max_points {
        tracing::warn!("Score {score} exceeds max points {max_points}, capping to max");
        score = max_points;
        percentage = None;
    }
    let percentage = percentage.unwrap_or_else(|| percentage_of(score, max_points));

    let letter_grade = stage
        .letter_grade
        .unwrap_or_else(|| letter_for_percentage(percentage).to_string());

    ExtractedGrade {
        score,
        max_points,
        letter_grade,
        percentage,
        parse_method: stage.method,
    }
}

/// Parse a regex capture group as `u32`, declining on overflow.
pub(crate) fn capture_u32(caps: &regex::Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}
