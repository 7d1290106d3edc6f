//! # Tree Disparity Computation
//!
//! This crate computes integer disparity maps for rectified stereo pairs by dynamic programming
//! over a spanning tree of the pixel grid.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod disparity;
mod error;
pub mod backward;
pub mod cost;
pub mod forward;
pub mod tree;
pub mod tree_dp;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::disparity::{DisparityAlgorithm, DisparityMap, StereoFrame};
    pub use crate::cost::{MatchCost, TransitionCost};
    pub use crate::tree_dp::{Params, TreeDp};
}
