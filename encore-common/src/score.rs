//! Score arithmetic shared by the ranking service
//!
//! Averages are stored unrounded. Rounding is a presentation concern and
//! always uses round-half-even at [`DISPLAY_DECIMALS`] places.

/// Decimal places shown for an average score
pub const DISPLAY_DECIMALS: i32 = 2;

/// Fold one more sample into a running mean.
///
/// `count` is the number of samples already folded into `mean`. With
/// `count == 0` the result is `sample` itself.
pub fn fold_mean(mean: f64, count: i64, sample: f64) -> f64 {
    let new_count = count + 1;
    (mean * count as f64 + sample) / new_count as f64
}

/// Round to `decimals` places with ties going to the even neighbour
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Rounded form of an average for display
pub fn display_average(value: f64) -> f64 {
    round_half_even(value, DISPLAY_DECIMALS)
}
