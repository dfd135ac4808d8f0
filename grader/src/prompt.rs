//! # Grading Prompt
//!
//! Builds the grading prompt sent to the model. The prompt demands a
//! machine-parseable `GRADE_START`/`GRADE_END` block at the start of the
//! response, followed by free-form analysis; the extraction chain in
//! [`crate::extract`] is built around that contract.

use crate::types::Assignment;
use util::config;

/// Builds the grading prompt for one submission.
///
/// The rubric is trimmed with [`safe_trim_for_model`] so oversized rubrics
/// cannot blow past the model's input window.
pub fn grading_prompt(assignment: &Assignment, student_name: &str) -> String {
    let rubric = safe_trim_for_model(&assignment.rubric, config::max_content_chars());

    format!(
        r#"You are an expert educator analyzing and grading a student assignment using advanced vision capabilities.

ASSIGNMENT: {title}
STUDENT: {student}
MAX POINTS: {max_points}
RUBRIC: {rubric}

CRITICAL: You MUST start your response with EXACTLY this format (no variations):

GRADE_START
Points Earned: [NUMBER]/{max_points}
Letter Grade: [LETTER]
Percentage: [NUMBER]%
GRADE_END

EXAMPLE FORMAT:
GRADE_START
Points Earned: 85/{max_points}
Letter Grade: B+
Percentage: 85%
GRADE_END

After the GRADE_END marker, provide your detailed analysis:

1. **Content Analysis**: Read all text, handwriting, equations, diagrams
2. **Rubric Application**: Apply each rubric criterion systematically
3. **Score Justification**: Explain how you arrived at the score
4. **Feedback**: Provide constructive feedback for improvement

IMPORTANT REQUIREMENTS:
- Use EXACT format above with no extra words or symbols
- Write only the number for Points Earned (e.g., 85, not "eighty-five")
- Write only standard letter grades (A+, A, A-, B+, B, B-, C+, C, C-, D+, D, D-, F)
- Write only the percentage number (e.g., 85, not "85 percent")
- Ensure points earned ≤ max points
- Be consistent with percentage calculation

The document is provided as an attachment. Use your vision capabilities to read and understand all content comprehensively."#,
        title = assignment.title,
        student = student_name,
        max_points = assignment.max_points,
        rubric = rubric,
    )
}

/// Trims long text for model input while preserving head and tail context.
///
/// Text at or under `max_len` characters passes through unchanged. Longer
/// text keeps the first 60% and the tail of the window, joined by a marker
/// stating how many characters were dropped.
pub fn safe_trim_for_model(text: &str, max_len: usize) -> String {
    let total = text.chars().count();
    if total <= max_len {
        return text.to_string();
    }
    let head = max_len * 6 / 10;
    // leave room for marker
    let tail = max_len.saturating_sub(head + 200);
    let head_part: String = text.chars().take(head).collect();
    let tail_part: String = text
        .chars()
        .skip(total.saturating_sub(tail))
        .collect();
    format!(
        "{}\n\n[... TRUNCATED {} CHARS ...]\n\n{}",
        head_part,
        total - max_len,
        tail_part
    )
}
