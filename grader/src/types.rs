//! # Types Module
//!
//! This module defines the core data structures used throughout the grading system.
//! These types describe submissions, structured grading results, and the per-item
//! records produced by batch grading.

use serde::{Deserialize, Serialize};

/// Records which extraction stage produced a grade.
///
/// Variants are listed in extraction-stage precedence order; earlier stages are more
/// trustworthy. `SentimentFallback` in particular is a coarse keyword heuristic and
/// downstream consumers should discount its confidence accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMethod {
    /// Strict `GRADE_START`/`GRADE_END` block with labeled fields.
    MarkerBased,
    /// Marker block parsed with tolerant formatting variants.
    EnhancedMarker,
    /// Label-adjacent `N/M` patterns found anywhere in the text.
    FallbackPattern,
    /// Any sane `N/M` pair bounded by the assignment's maximum.
    BasicExtraction,
    /// Score derived from a standalone percentage token.
    PercentageCalculation,
    /// Coarse bucket score from keyword polarity; extraction of last resort.
    SentimentFallback,
    /// No stage produced a grade. Never emitted by the current chain (the sentiment
    /// stage always yields) but kept for provenance of older persisted results.
    Failed,
}

impl ParseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMethod::MarkerBased => "marker_based",
            ParseMethod::EnhancedMarker => "enhanced_marker",
            ParseMethod::FallbackPattern => "fallback_pattern",
            ParseMethod::BasicExtraction => "basic_extraction",
            ParseMethod::PercentageCalculation => "percentage_calculation",
            ParseMethod::SentimentFallback => "sentiment_fallback",
            ParseMethod::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ParseMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured grade produced from one inference reply.
///
/// Invariants: if `score` is present it lies in `0..=max_points`, and `percentage`
/// equals `round(score / max_points * 100)` whenever both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeResult {
    /// Points earned, if any stage extracted one.
    pub score: Option<u32>,
    /// Denominator the grade is out of.
    pub max_points: u32,
    /// Letter grade, parsed or computed from the percentage.
    pub letter_grade: Option<String>,
    /// Integer percentage in `0..=100`.
    pub percentage: Option<u32>,
    /// Which extraction stage produced this grade.
    pub parse_method: ParseMethod,
    /// Content hash the result is cached under.
    pub content_hash: String,
    /// The model's full reply, kept for auditing and re-parsing.
    pub raw_text: String,
    /// True when the result was served from the grade cache.
    pub cached: bool,
    /// RFC 3339 timestamp of when the grade was produced.
    pub processed_at: String,
}

/// The assignment being graded. The rubric is free text authored by an instructor
/// and is passed through to the model verbatim (trimmed if oversized).
#[derive(Debug, Clone)]
pub struct Assignment {
    pub title: String,
    pub max_points: u32,
    pub rubric: String,
}

/// One student's submitted document.
///
/// `content` is the base64 payload exactly as it is sent to the model; the cache key
/// hashes this same string, so identical bytes always map to the same key.
#[derive(Debug, Clone)]
pub struct Submission {
    pub student_name: String,
    /// MIME type of the submitted document (e.g. `application/pdf`).
    pub mime_type: String,
    /// Base64-encoded document bytes.
    pub content: String,
}

/// A successfully graded batch item.
#[derive(Debug, Clone, Serialize)]
pub struct StudentGrade {
    pub student_name: String,
    #[serde(flatten)]
    pub result: GradeResult,
}

/// A failed batch item, categorized for operators.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub student_name: String,
    pub category: crate::error::ErrorCategory,
    pub detail: String,
}

/// Outcome of grading a whole batch. One item's failure never aborts the batch;
/// it becomes an [`ItemFailure`] record instead.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub assignment_title: String,
    pub max_points: u32,
    pub total: usize,
    pub successful: Vec<StudentGrade>,
    pub failed: Vec<ItemFailure>,
}
