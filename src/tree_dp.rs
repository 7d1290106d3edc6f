//! # Tree dynamic programming disparity computation
//!
//! This module assigns every matchable pixel of the left image an integer disparity by exact
//! min-sum inference over a spanning tree of the pixel grid. The data term is a windowed patch
//! cost between the left pixel and the shifted right pixel, the smoothness term a scaled penalty
//! on the label difference of tree neighbours.
//!
//! The work is split into four passes:
//!
//! 1. Build the tree over the cropped grid ([`crate::tree`]).
//! 2. Aggregate costs from the leaves to the root ([`crate::forward`]).
//! 3. Backtrack labels from the root to the leaves ([`crate::backward`]).
//! 4. Write the labels back into an image sized disparity map.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;
use std::time::Instant;

use image::RgbImage;
use log::debug;
use serde::Deserialize;

use crate::backward;
use crate::cost::{cost_scale, MatchCost, TransitionCost};
use crate::disparity::{DisparityAlgorithm, DisparityMap, StereoFrame};
use crate::error::*;
use crate::forward::{self, AggregationStats, PredecessorTable, Problem};
use crate::tree::{NodeId, Tree};

#[cfg(feature = "statistics")]
use plotters::prelude::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Labels are stored and output as bytes.
pub const MAX_LABELS: usize = 256;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct TreeDp {
    params: Params
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// Full width of the square matching window. Must be odd.
    pub window_size: usize,
    /// Number of disparity labels, `0..max_disparity`.
    pub max_disparity: usize,
    /// User weight on the smoothness term.
    pub cost_scale_factor: f64,
    pub transition: TransitionCost,
    pub match_cost: MatchCost
}

/// Region of the image covered by the tree.
///
/// The margin keeps every window inside the image and leaves room on the left for the largest
/// shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop {
    pub row_offset: usize,
    pub col_offset: usize,
    pub rows: usize,
    pub cols: usize
}

/// Full result of a solve, kept for inspection.
pub struct Solution {
    pub tree: Tree,
    pub crop: Crop,
    /// Label of each node, indexed by node.
    pub labels: Vec<u8>,
    pub root_costs: Vec<f64>,
    pub predecessors: PredecessorTable,
    pub stats: AggregationStats
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            window_size: 5,
            max_disparity: 15,
            cost_scale_factor: 1.0,
            transition: TransitionCost::default(),
            match_cost: MatchCost::default()
        }
    }
}

impl Params {
    /// Load parameters from a JSON file. Missing fields take their default values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Check the parameters against an image size, returning the region the tree will cover.
    pub fn validate(&self, width: u32, height: u32) -> Result<Crop> {
        if self.max_disparity == 0 || self.max_disparity > MAX_LABELS {
            return Err(Error::InvalidMaxDisparity(self.max_disparity));
        }

        if self.window_size == 0 || self.window_size % 2 == 0 {
            return Err(Error::InvalidWindowSize(self.window_size));
        }

        if self.window_size > width as usize || self.window_size > height as usize {
            return Err(Error::WindowTooLarge {
                window_size: self.window_size,
                width,
                height
            });
        }

        if !self.cost_scale_factor.is_finite() || self.cost_scale_factor < 0.0 {
            return Err(Error::InvalidCostScale(self.cost_scale_factor));
        }

        let radius = self.window_size / 2;
        let col_offset = radius + self.max_disparity - 1;

        if width as usize <= col_offset + radius {
            return Err(Error::NoMatchableRegion {
                width,
                height,
                window_size: self.window_size,
                max_disparity: self.max_disparity
            });
        }

        Ok(Crop {
            row_offset: radius,
            col_offset,
            rows: height as usize - 2 * radius,
            cols: width as usize - col_offset - radius
        })
    }
}

impl TreeDp {
    /// Create a new instance of the algorithm with the given parameters.
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Run the solver and keep every intermediate result.
    pub fn solve(&self, left: &RgbImage, right: &RgbImage) -> Result<Solution> {
        if left.dimensions() != right.dimensions() {
            return Err(Error::DimensionMismatch {
                left: left.dimensions(),
                right: right.dimensions()
            });
        }

        let crop = self.params.validate(left.width(), left.height())?;
        debug!("Tree DP over {:?} with {:?}", crop, self.params);

        // ---- TOPOLOGY ----

        let t0 = Instant::now();
        let tree = Tree::build(crop.rows, crop.cols);
        debug!(
            "Built tree with {} nodes and {} leafs in {:?}",
            tree.len(),
            tree.leafs().len(),
            t0.elapsed()
        );

        // ---- FORWARD PASS ----

        let problem = Problem {
            left,
            right,
            window_size: self.params.window_size,
            max_disparity: self.params.max_disparity,
            transition: self.params.transition,
            match_cost: self.params.match_cost,
            cost_scale: cost_scale(
                self.params.window_size,
                self.params.max_disparity,
                self.params.cost_scale_factor
            ),
            row_offset: crop.row_offset,
            col_offset: crop.col_offset
        };

        let t1 = Instant::now();
        let aggregation = forward::aggregate(&tree, &problem);
        debug!(
            "Forward pass processed {} nodes in {:?}, peak of {} live cost buffers ({} allocated)",
            aggregation.stats.processed,
            t1.elapsed(),
            aggregation.stats.peak_live,
            aggregation.stats.allocated
        );

        // ---- BACKWARD PASS ----

        let t2 = Instant::now();
        let labels = backward::assign(&tree, &aggregation.root_costs, &aggregation.predecessors);
        debug!("Backward pass assigned {} labels in {:?}", labels.len(), t2.elapsed());

        Ok(Solution {
            tree,
            crop,
            labels,
            root_costs: aggregation.root_costs,
            predecessors: aggregation.predecessors,
            stats: aggregation.stats
        })
    }

    #[cfg(feature = "statistics")]
    fn plot_wavefront(&self, stats: &AggregationStats) -> Result<()> {
        std::fs::create_dir_all("plots/tree_dp")?;

        let area = BitMapBackend::new(
            "plots/tree_dp/wavefront.png",
            (800, 600)
        ).into_drawing_area();
        area.fill(&WHITE).map_err(plot_err)?;

        let mut chart = ChartBuilder::on(&area)
            .caption("Live cost buffers", ("sans-serif", 20).into_font())
            .margin(5)
            .x_label_area_size(30)
            .y_label_area_size(30)
            .build_ranged(
                0..stats.processed + 1,
                0..stats.peak_live + 1
            ).map_err(plot_err)?;

        chart.configure_mesh().draw().map_err(plot_err)?;

        chart
            .draw_series(LineSeries::new(
                stats.live_history.iter().cloned(),
                &RED
            )).map_err(plot_err)?;

        debug!("Stats plotting complete");

        Ok(())
    }
}

impl Solution {
    /// Image pixel of a node.
    pub fn pixel(&self, id: NodeId) -> (usize, usize) {
        let (row, col) = self.tree.position(id);
        (col + self.crop.col_offset, row + self.crop.row_offset)
    }

    /// Write the node labels into a `width` x `height` disparity map. Pixels outside the crop
    /// stay at zero.
    pub fn to_disparity_map(&self, width: usize, height: usize) -> DisparityMap {
        let mut map = DisparityMap::new(width, height);

        for (idx, &label) in self.labels.iter().enumerate() {
            let (x, y) = self.pixel(NodeId(idx));
            map.put(x, y, label);
        }

        map
    }
}

impl DisparityAlgorithm for TreeDp {
    /// Compute the disparity map for the given frame.
    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityMap> {
        let solution = self.solve(&frame.left, &frame.right)?;

        // ---- PLOTTING ----
        #[cfg(feature = "statistics")]
        self.plot_wavefront(&solution.stats)?;

        Ok(solution.to_disparity_map(frame.width() as usize, frame.height() as usize))
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

#[cfg(feature = "statistics")]
fn plot_err<E: std::fmt::Debug>(e: E) -> Error {
    Error::Statistics(format!("{:?}", e))
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
