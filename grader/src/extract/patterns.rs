//! Label-adjacent fallback extraction, used when the reply carries no marker block.
//!
//! Scans the whole text for a labeled `N/M` fraction (`Points Earned:`, `GRADE:`,
//! `Score:`, `Points:`, or a bare fraction), and independently for a letter-grade
//! token and a percentage token. The stage succeeds only when a fraction was found;
//! letter and percentage are optional extras.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::ParseMethod;

use super::{StageGrade, capture_u32};

/// Labeled and bare fraction formats, tried in order of specificity.
static GRADE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)Points Earned:\s*(\d+)/(\d+)",
        r"(?i)GRADE:\s*(\d+)/(\d+)",
        r"(?i)Score:\s*(\d+)/(\d+)",
        r"(?i)Points:\s*(\d+)/(\d+)",
        r"(?i)Grade Breakdown:\s*Points Earned:\s*(\d+)/(\d+)",
        r"(\d+)/(\d+)\s*\(\d+%\)",
        r"(\d+)\s*/\s*(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid fallback grade regex"))
    .collect()
});

static LETTER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)Letter Grade:\s*([A-F][+-]?)",
        r"(?i)Grade:\s*([A-F][+-]?)",
        r"(?i)Letter:\s*([A-F][+-]?)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid fallback letter regex"))
    .collect()
});

static PERCENTAGE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)Percentage:\s*(\d+)%", r"\((\d+)%\)", r"(\d+)%"]
        .iter()
        .map(|p| Regex::new(p).expect("valid fallback percentage regex"))
        .collect()
});

/// Fraction of 100 used as a last resort when no labeled fraction matched.
static OUT_OF_HUNDRED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)/100").expect("valid out-of-hundred regex"));

/// Stage 3: label-adjacent patterns over the whole text.
pub(crate) fn fallback_pattern(text: &str) -> Option<StageGrade> {
    let mut fraction = GRADE_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.captures(text)?;
        Some((capture_u32(&caps, 1)?, capture_u32(&caps, 2)?))
    });

    // Last resort inside this stage: any score out of 100.
    if fraction.is_none() {
        fraction = OUT_OF_HUNDRED
            .captures(text)
            .and_then(|caps| Some((capture_u32(&caps, 1)?, 100)));
    }

    let (score, max_points) = fraction?;

    let letter_grade = LETTER_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    });

    let percentage = PERCENTAGE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(text).and_then(|c| capture_u32(&c, 1)));

    Some(StageGrade {
        score,
        max_points,
        letter_grade,
        percentage,
        method: ParseMethod::FallbackPattern,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_label() {
        let grade = fallback_pattern("Score: 42/50. Good effort.").unwrap();
        assert_eq!(grade.score, 42);
        assert_eq!(grade.max_points, 50);
        assert!(grade.letter_grade.is_none());
        assert!(grade.percentage.is_none());
        assert_eq!(grade.method, ParseMethod::FallbackPattern);
    }

    #[test]
    fn test_points_earned_label_preferred() {
        let text = "Notes mention 3/5 tasks. Points Earned: 88/100 overall.";
        let grade = fallback_pattern(text).unwrap();
        assert_eq!(grade.score, 88);
        assert_eq!(grade.max_points, 100);
    }

    #[test]
    fn test_fraction_with_parenthesized_percentage() {
        let grade = fallback_pattern("Final mark: 75/100 (75%)").unwrap();
        assert_eq!(grade.score, 75);
        assert_eq!(grade.max_points, 100);
        assert_eq!(grade.percentage, Some(75));
    }

    #[test]
    fn test_independent_letter_and_percentage() {
        let text = "Grade: B+ with a score of 87/100, Percentage: 87%";
        let grade = fallback_pattern(text).unwrap();
        assert_eq!(grade.score, 87);
        assert_eq!(grade.letter_grade.as_deref(), Some("B+"));
        assert_eq!(grade.percentage, Some(87));
    }

    #[test]
    fn test_bare_fraction_without_label() {
        let grade = fallback_pattern("Overall: 82 / 100").unwrap();
        assert_eq!(grade.score, 82);
        assert_eq!(grade.max_points, 100);
    }

    #[test]
    fn test_declines_without_any_fraction() {
        assert!(fallback_pattern("Good work overall, about 90%").is_none());
    }
}
