//! # Forward aggregation
//!
//! Min-sum message passing from the leaves to the root. Each node summarises the cheapest cost
//! of its whole subtree as a function of its own label, and records which label of its children
//! achieved it.
//!
//! Nodes are scheduled from an explicit worklist. A node enters the worklist only once all of its
//! children have published their costs, tracked with a per-node counter of pending children. As
//! soon as a node has been computed its children's buffers are returned to a pool, so only the
//! active wavefront of the tree holds cost buffers at any one time.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::RgbImage;

use crate::cost::{MatchCost, TransitionCost};
use crate::tree::{NodeId, Tree};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Everything a node needs to turn a label into a data cost.
pub struct Problem<'a> {
    pub left: &'a RgbImage,
    pub right: &'a RgbImage,
    pub window_size: usize,
    pub max_disparity: usize,
    pub transition: TransitionCost,
    pub match_cost: MatchCost,
    /// Multiplier on the unscaled transition cost.
    pub cost_scale: f64,
    /// Image row of tree row 0.
    pub row_offset: usize,
    /// Image column of tree column 0.
    pub col_offset: usize
}

/// Best child label for every `(node, label)` pair.
pub struct PredecessorTable {
    labels: Vec<u8>,
    max_disparity: usize
}

/// Cost buffers in flight between a node and its parent.
///
/// Each node's slot is written once and released once. Released buffers are kept in a pool and
/// reused by later nodes.
pub struct Messages {
    slots: Vec<Option<Vec<f64>>>,
    pool: Vec<Vec<f64>>,
    len: usize,
    live: usize,
    peak: usize,
    allocated: usize
}

#[derive(Debug, Clone, Default)]
pub struct AggregationStats {
    /// Nodes whose costs were computed from their children. Leaves are seeded, not processed.
    pub processed: usize,
    /// Most cost buffers held at the same time.
    pub peak_live: usize,
    /// Buffers the pool had to allocate.
    pub allocated: usize,
    /// Buffers still held once the root's costs were handed out. Always zero.
    pub outstanding: usize,
    /// Live buffer count after each processed node.
    #[cfg(feature = "statistics")]
    pub live_history: Vec<(usize, usize)>
}

pub struct Aggregation {
    /// Accumulated cost of the whole tree for each root label.
    pub root_costs: Vec<f64>,
    pub predecessors: PredecessorTable,
    pub stats: AggregationStats
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl<'a> Problem<'a> {
    /// Number of labels a node may take. Larger shifts would move the right patch off the image.
    pub fn num_labels(&self, col: usize) -> usize {
        let x = col + self.col_offset;
        let radius = self.window_size / 2;

        self.max_disparity.min(x + 1 - radius)
    }

    fn data_cost(&self, row: usize, col: usize, label: usize) -> f64 {
        let y = row + self.row_offset;
        let x = col + self.col_offset;

        self.match_cost.cost(self.left, self.right, self.window_size, y, x, x - label)
    }
}

impl PredecessorTable {
    pub fn new(num_nodes: usize, max_disparity: usize) -> Self {
        Self {
            labels: vec![0; num_nodes * max_disparity],
            max_disparity
        }
    }

    pub fn get(&self, node: NodeId, label: usize) -> usize {
        self.labels[node.index() * self.max_disparity + label] as usize
    }

    fn set(&mut self, node: NodeId, label: usize, pred: usize) {
        self.labels[node.index() * self.max_disparity + label] = pred as u8;
    }
}

impl Messages {
    pub fn new(num_nodes: usize, len: usize) -> Self {
        Self {
            slots: vec![None; num_nodes],
            pool: Vec::new(),
            len,
            live: 0,
            peak: 0,
            allocated: 0
        }
    }

    /// Take a buffer from the pool, or allocate a new one if the pool is empty. Contents are
    /// unspecified.
    fn acquire(&mut self) -> Vec<f64> {
        match self.pool.pop() {
            Some(buf) => buf,
            None => {
                self.allocated += 1;
                vec![0.0; self.len]
            }
        }
    }

    /// Publish `costs` as the node's outgoing message.
    ///
    /// Panics if the node already has costs.
    fn publish(&mut self, id: NodeId, costs: Vec<f64>) {
        let slot = &mut self.slots[id.index()];
        assert!(slot.is_none(), "costs of {:?} written twice", id);

        *slot = Some(costs);
        self.live += 1;
        self.peak = self.peak.max(self.live);
    }

    /// Costs published by the node.
    ///
    /// Panics if the node has not been computed yet, or its costs were already consumed.
    pub fn get(&self, id: NodeId) -> &[f64] {
        match &self.slots[id.index()] {
            Some(costs) => costs,
            None => panic!("costs of {:?} read before they were computed", id)
        }
    }

    pub fn is_ready(&self, id: NodeId) -> bool {
        self.slots[id.index()].is_some()
    }

    /// Hand the node's costs to the caller, removing them from the live set.
    fn take(&mut self, id: NodeId) -> Vec<f64> {
        match self.slots[id.index()].take() {
            Some(costs) => {
                self.live -= 1;
                costs
            }
            None => panic!("costs of {:?} consumed before they were computed", id)
        }
    }

    /// Return the node's costs to the pool once its parent no longer needs them.
    fn release(&mut self, id: NodeId) {
        let buf = self.take(id);
        self.pool.push(buf);
    }

    /// Number of buffers currently held by nodes.
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn peak(&self) -> usize {
        self.peak
    }

    pub fn allocated(&self) -> usize {
        self.allocated
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Run the forward pass over the whole tree.
pub fn aggregate(tree: &Tree, problem: &Problem) -> Aggregation {
    let max_disp = problem.max_disparity;

    let mut messages = Messages::new(tree.len(), max_disp);
    let mut predecessors = PredecessorTable::new(tree.len(), max_disp);
    let mut stats = AggregationStats::default();

    // Children each node is still waiting on
    let mut pending: Vec<usize> = tree.nodes().iter().map(|n| n.num_children()).collect();
    let mut worklist: Vec<NodeId> = Vec::new();

    // Seed leaves with a zero message
    for &leaf in tree.leafs() {
        let mut costs = messages.acquire();
        costs.iter_mut().for_each(|c| *c = 0.0);
        messages.publish(leaf, costs);
    }
    for &leaf in tree.leafs() {
        if let Some(parent) = tree.node(leaf).parent() {
            pending[parent.index()] -= 1;
            if pending[parent.index()] == 0 {
                worklist.push(parent);
            }
        }
    }

    // Sum of the children's costs for each predecessor label
    let mut incoming = vec![0.0f64; max_disp];

    while let Some(id) = worklist.pop() {
        let node = tree.node(id);
        let (row, col) = tree.position(id);
        debug_assert!(node.children().all(|c| messages.is_ready(c)));

        incoming.iter_mut().for_each(|c| *c = 0.0);
        for child in node.children() {
            for (acc, c) in incoming.iter_mut().zip(messages.get(child)) {
                *acc += c;
            }
        }

        let mut costs = messages.acquire();
        let num_labels = problem.num_labels(col);

        for k in 0..max_disp {
            if k >= num_labels {
                costs[k] = f64::INFINITY;
                continue;
            }

            let mut min = f64::INFINITY;
            let mut best = 0;

            for (k_prev, acc) in incoming.iter().enumerate() {
                let cost = acc
                    + problem.transition.cost(k, k_prev) as f64 * problem.cost_scale;

                // Strictly less, the first minimum wins
                if cost < min {
                    min = cost;
                    best = k_prev;
                }
            }

            costs[k] = problem.data_cost(row, col, k) + min;
            predecessors.set(id, k, best);
        }

        for child in node.children() {
            messages.release(child);
        }
        messages.publish(id, costs);
        stats.processed += 1;

        #[cfg(feature = "statistics")]
        stats.live_history.push((stats.processed, messages.live()));

        if let Some(parent) = node.parent() {
            pending[parent.index()] -= 1;
            if pending[parent.index()] == 0 {
                worklist.push(parent);
            }
        }
    }

    let root_costs = messages.take(tree.root());

    stats.peak_live = messages.peak();
    stats.allocated = messages.allocated();
    stats.outstanding = messages.live();
    assert_eq!(stats.outstanding, 0, "cost buffers still held after the forward pass");

    Aggregation {
        root_costs,
        predecessors,
        stats
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn problem<'a>(left: &'a RgbImage, right: &'a RgbImage, max_disparity: usize) -> Problem<'a> {
        Problem {
            left,
            right,
            window_size: 1,
            max_disparity,
            transition: TransitionCost::AbsDiff,
            match_cost: MatchCost::Ssd,
            cost_scale: 1.0,
            row_offset: 0,
            col_offset: max_disparity - 1
        }
    }

    #[test]
    fn every_internal_node_processed_once() {
        let img = RgbImage::from_pixel(9, 4, Rgb([50, 50, 50]));
        let tree = Tree::build(4, 7);
        let agg = aggregate(&tree, &problem(&img, &img, 3));

        assert_eq!(agg.stats.processed, tree.len() - tree.leafs().len());
        assert_eq!(agg.stats.outstanding, 0);
        assert_eq!(agg.root_costs.len(), 3);
    }

    #[test]
    fn buffers_are_recycled() {
        let img = RgbImage::from_pixel(40, 30, Rgb([50, 50, 50]));
        let tree = Tree::build(30, 38);
        let agg = aggregate(&tree, &problem(&img, &img, 3));

        // The wavefront is far smaller than the tree
        assert!(agg.stats.peak_live < tree.len() / 2, "peak {}", agg.stats.peak_live);
        assert!(agg.stats.allocated <= agg.stats.peak_live + 1);
    }

    #[test]
    fn chain_sums_data_costs() {
        // One row, three pixels, two labels. The right image is black so the root's data cost is
        // 3 * v^2 for either label.
        let mut left = RgbImage::new(4, 1);
        for x in 1..4 {
            left.put_pixel(x, 0, Rgb([x as u8; 3]));
        }
        let right = RgbImage::new(4, 1);
        let tree = Tree::build(1, 3);
        let agg = aggregate(&tree, &problem(&left, &right, 2));

        // Leaves contribute nothing, the root only its own data cost
        assert_eq!(agg.stats.processed, 1);
        assert_eq!(agg.root_costs, vec![12.0, 12.0]);
        assert_eq!(agg.predecessors.get(tree.root(), 0), 0);
        assert_eq!(agg.predecessors.get(tree.root(), 1), 1);
    }

    #[test]
    fn labels_limited_by_column() {
        let img = RgbImage::from_pixel(6, 3, Rgb([9, 9, 9]));
        let mut p = problem(&img, &img, 4);
        p.col_offset = 0;

        assert_eq!(p.num_labels(0), 1);
        assert_eq!(p.num_labels(2), 3);
        assert_eq!(p.num_labels(5), 4);

        // Root sits at column 3 so label 3 is reachable, column 1 only allows two labels
        let tree = Tree::build(3, 6);
        let agg = aggregate(&tree, &p);
        assert!(agg.root_costs.iter().all(|c| c.is_finite()));
    }

    #[test]
    #[should_panic(expected = "written twice")]
    fn double_write_panics() {
        let mut messages = Messages::new(2, 3);
        messages.publish(NodeId(0), vec![0.0; 3]);
        messages.publish(NodeId(0), vec![0.0; 3]);
    }

    #[test]
    #[should_panic(expected = "before they were computed")]
    fn read_before_ready_panics() {
        let messages = Messages::new(2, 3);
        messages.get(NodeId(1));
    }
}
