//! # Cost model
//!
//! Matching costs between a left and right image patch, and transition costs between the
//! disparity labels of two neighbouring tree nodes.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::RgbImage;
use serde::Deserialize;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Pairwise penalty for disagreeing labels on neighbouring nodes.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCost {
    /// 1 if the labels differ, 0 otherwise.
    Potts,
    /// `|a - b|`
    AbsDiff,
    /// `(a - b)^2`
    SquareDiff
}

/// Photometric criterion comparing two patches. Lower is a better match.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchCost {
    /// Sum of squared differences over all channels.
    Ssd,
    /// Sum of absolute differences over all channels.
    Sad
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl TransitionCost {
    /// Unscaled cost of moving from label `a` to label `b`.
    pub fn cost(self, a: usize, b: usize) -> u32 {
        let diff = (a as i64 - b as i64).abs() as u32;

        match self {
            TransitionCost::Potts => (diff != 0) as u32,
            TransitionCost::AbsDiff => diff,
            TransitionCost::SquareDiff => diff * diff
        }
    }
}

impl Default for TransitionCost {
    fn default() -> Self {
        TransitionCost::AbsDiff
    }
}

impl MatchCost {
    /// Cost of matching the left patch centred on `(row, col_left)` against the right patch
    /// centred on `(row, col_right)`.
    ///
    /// No bounds checking is done beyond the slice indexing itself, callers must keep both
    /// `window_size` square patches inside the images.
    pub fn cost(
        self,
        left: &RgbImage,
        right: &RgbImage,
        window_size: usize,
        row: usize,
        col_left: usize,
        col_right: usize
    ) -> f64 {
        let radius = window_size / 2;
        let width = left.width() as usize;
        let left_raw = left.as_raw();
        let right_raw = right.as_raw();

        let mut acc = 0.0f64;

        for y in (row - radius)..=(row + radius) {
            let row_start = y * width;
            let l_start = (row_start + col_left - radius) * 3;
            let r_start = (row_start + col_right - radius) * 3;
            let len = window_size * 3;

            let l = &left_raw[l_start..l_start + len];
            let r = &right_raw[r_start..r_start + len];

            match self {
                MatchCost::Ssd => {
                    for (a, b) in l.iter().zip(r) {
                        let d = *a as f64 - *b as f64;
                        acc += d * d;
                    }
                }
                MatchCost::Sad => {
                    for (a, b) in l.iter().zip(r) {
                        acc += (*a as f64 - *b as f64).abs();
                    }
                }
            }
        }

        acc
    }
}

impl Default for MatchCost {
    fn default() -> Self {
        MatchCost::Ssd
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Windowed sum of squared per-channel differences.
pub fn data_cost(
    left: &RgbImage,
    right: &RgbImage,
    window_size: usize,
    row: usize,
    col_left: usize,
    col_right: usize
) -> f64 {
    MatchCost::Ssd.cost(left, right, window_size, row, col_left, col_right)
}

/// Multiplier applied to every transition cost.
///
/// A label step of one costs as much as an average squared colour difference of 255 spread over
/// the whole window and disparity range, so the smoothness and data terms stay comparable for
/// any window size. `factor` is the user's smoothness weight.
pub fn cost_scale(window_size: usize, max_disparity: usize, factor: f64) -> f64 {
    3.0 * (255.0 * 255.0) * (window_size * window_size) as f64 / max_disparity as f64 * factor
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
