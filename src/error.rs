//! # Error standards
//!
//! This module provides a standardised error enum and result type for this crate.
//!
//! Only configuration problems are reported through [`Error`]. Broken tree invariants are bugs
//! in the topology builder or the scheduler and panic instead.

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the tree disparity crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Left image is {left:?} but right image is {right:?}, stereo images must be the same size")]
    DimensionMismatch {
        left: (u32, u32),
        right: (u32, u32)
    },

    #[error("Maximum disparity must be in 1..=256, got {0}")]
    InvalidMaxDisparity(usize),

    #[error("Window size must be odd and non-zero, got {0}")]
    InvalidWindowSize(usize),

    #[error("Window size {window_size} does not fit inside a {width}x{height} image")]
    WindowTooLarge {
        window_size: usize,
        width: u32,
        height: u32
    },

    #[error("Cost scale factor must be finite and non-negative, got {0}")]
    InvalidCostScale(f64),

    #[error("No pixels of a {width}x{height} image can be matched with window size {window_size} \
        and maximum disparity {max_disparity}")]
    NoMatchableRegion {
        width: u32,
        height: u32,
        window_size: usize,
        max_disparity: usize
    },

    #[error("Failed to parse parameters: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to plot statistics: {0}")]
    Statistics(String)
}
