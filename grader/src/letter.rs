//! # Letter Grade Module
//!
//! Fixed percentage-to-letter lookup used whenever an extraction stage did not find
//! an explicit letter grade in the model's reply. The table uses 3-point bands from
//! A+ down to D-, with everything below 60% an F.

/// Maps an integer percentage onto its letter grade.
pub fn letter_for_percentage(percentage: u32) -> &'static str {
    match percentage {
        p if p >= 97 => "A+",
        p if p >= 93 => "A",
        p if p >= 90 => "A-",
        p if p >= 87 => "B+",
        p if p >= 83 => "B",
        p if p >= 80 => "B-",
        p if p >= 77 => "C+",
        p if p >= 73 => "C",
        p if p >= 70 => "C-",
        p if p >= 67 => "D+",
        p if p >= 63 => "D",
        p if p >= 60 => "D-",
        _ => "F",
    }
}

/// Integer percentage of `score` out of `max_points`, rounded to nearest.
///
/// A zero denominator yields 0 rather than dividing by zero.
pub fn percentage_of(score: u32, max_points: u32) -> u32 {
    if max_points == 0 {
        return 0;
    }
    ((score as f64 / max_points as f64) * 100.0).round() as u32
}
