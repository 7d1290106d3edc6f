//! # Backward assignment
//!
//! Walks the tree from the root, fixing the root's label to its cheapest entry and then giving
//! every child the label its parent recorded during the forward pass.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use crate::forward::PredecessorTable;
use crate::tree::Tree;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Index of the smallest value. Ties go to the first one seen.
pub fn argmin(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold(0, |min_idx, (idx, &val)| {
            if val < values[min_idx] {
                idx
            }
            else {
                min_idx
            }
        })
}

/// Assign a label to every node, indexed by node.
pub fn assign(tree: &Tree, root_costs: &[f64], predecessors: &PredecessorTable) -> Vec<u8> {
    let mut labels = vec![0u8; tree.len()];
    labels[tree.root().index()] = argmin(root_costs) as u8;

    for id in tree.pre_order() {
        let label = labels[id.index()] as usize;

        for child in tree.node(id).children() {
            labels[child.index()] = predecessors.get(id, label) as u8;
        }
    }

    labels
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmin_first_seen_wins() {
        assert_eq!(argmin(&[3.0, 1.0, 1.0, 2.0]), 1);
        assert_eq!(argmin(&[0.0, 0.0, 0.0]), 0);
        assert_eq!(argmin(&[5.0, f64::INFINITY, 4.0]), 2);
        assert_eq!(argmin(&[7.0]), 0);
    }

    #[test]
    fn single_node_takes_root_label() {
        let tree = Tree::build(1, 1);
        let preds = PredecessorTable::new(1, 3);

        assert_eq!(assign(&tree, &[2.0, 0.5, 1.0], &preds), vec![1]);
    }

    #[test]
    fn children_follow_zero_table() {
        // Zeroed table sends every child to label 0 whatever the root picks
        let tree = Tree::build(3, 3);
        let preds = PredecessorTable::new(tree.len(), 4);
        let labels = assign(&tree, &[9.0, 9.0, 1.0, 9.0], &preds);

        assert_eq!(labels[tree.root().index()], 2);
        for id in tree.pre_order().skip(1) {
            assert_eq!(labels[id.index()], 0);
        }
    }
}
