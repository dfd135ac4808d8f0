//! Keyword-polarity fallback, the extraction of last resort.
//!
//! When every real extraction stage has failed, classify the reply as net
//! positive, negative, or neutral by keyword presence and assign a coarse bucket:
//! positive 80%, negative 50%, mixed or neutral 70% of the maximum. This stage
//! always yields so callers never receive a null score; it trades accuracy for
//! availability and is stamped `sentiment_fallback` so consumers can discount it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::ParseMethod;

use super::StageGrade;

static POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)excellent|good|correct|well|accurate|strong").expect("valid positive regex")
});

static NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)poor|incorrect|wrong|missing|weak|inadequate").expect("valid negative regex")
});

/// Stage 6: bucket score from keyword polarity. Always yields.
pub(crate) fn sentiment_fallback(text: &str, max_points: u32) -> StageGrade {
    let positive = POSITIVE.is_match(text);
    let negative = NEGATIVE.is_match(text);

    let ratio = if positive && !negative {
        0.8
    } else if negative && !positive {
        0.5
    } else {
        0.7
    };
    let score = (max_points as f64 * ratio).round() as u32;
    tracing::warn!(
        "No extraction stage matched; sentiment fallback assigning {score}/{max_points}"
    );

    StageGrade {
        score,
        max_points,
        letter_grade: None,
        percentage: None,
        method: ParseMethod::SentimentFallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_bucket() {
        let grade = sentiment_fallback("Excellent reasoning and accurate conclusions.", 100);
        assert_eq!(grade.score, 80);
        assert_eq!(grade.method, ParseMethod::SentimentFallback);
    }

    #[test]
    fn test_negative_bucket() {
        let grade = sentiment_fallback("The proof is wrong and a key step is missing.", 100);
        assert_eq!(grade.score, 50);
    }

    #[test]
    fn test_incorrect_contains_correct_and_stays_neutral() {
        // "incorrect" matches both keyword sets because the positive set contains
        // the substring "correct"; net polarity is mixed.
        let grade = sentiment_fallback("The answer is incorrect.", 100);
        assert_eq!(grade.score, 70);
    }

    #[test]
    fn test_mixed_is_neutral() {
        let grade = sentiment_fallback("Good start, but the second half is wrong.", 100);
        assert_eq!(grade.score, 70);
    }

    #[test]
    fn test_no_keywords_is_neutral() {
        let grade = sentiment_fallback("The submission was received.", 50);
        assert_eq!(grade.score, 35);
    }

    #[test]
    fn test_rounds_bucket_score() {
        // 80% of 25 is an even 20; 50% of 25 rounds from 12.5 to 13.
        let negative = sentiment_fallback("Inadequate throughout.", 25);
        assert_eq!(negative.score, 13);
    }
}
