//! Percentage-derived extraction.
//!
//! When no fraction of any shape was found, look for standalone percentage tokens,
//! keep the highest plausible one (at most 100), and derive the score from it
//! against the assignment's maximum.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::ParseMethod;

use super::StageGrade;

static PERCENT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)%").expect("valid percent token regex"));

/// Stage 5: derive the score from the highest percentage token at most 100.
pub(crate) fn percentage_calculation(text: &str, max_points: u32) -> Option<StageGrade> {
    let best = PERCENT_TOKEN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .filter(|p| *p <= 100)
        .max()?;

    let score = ((best as f64 / 100.0) * max_points as f64).round() as u32;

    Some(StageGrade {
        score,
        max_points,
        letter_grade: None,
        percentage: Some(best),
        method: ParseMethod::PercentageCalculation,
    })
}
