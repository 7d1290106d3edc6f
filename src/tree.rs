//! # Spanning tree topology
//!
//! Builds the tree the dynamic programme runs over. Every row is a pair of chains running into
//! the row's middle column, and the middle columns are chained top to bottom, with the top middle
//! node as the root:
//!
//! ```text
//!   o → o → R ← o ← o
//!           ↑
//!   o → o → o ← o ← o
//!           ↑
//!   o → o → o ← o ← o
//! ```
//!
//! Arrows point from child to parent. Nodes live in a dense row-major array over the cropped grid
//! and link to each other by index.

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Most children a node can have: left and right row neighbours plus the middle node below.
pub const MAX_CHILDREN: usize = 3;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Row-major index of a node in the cropped grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Default)]
pub struct Node {
    parent: Option<NodeId>,
    children: [Option<NodeId>; MAX_CHILDREN],
    num_children: usize
}

pub struct Tree {
    nodes: Vec<Node>,
    leafs: Vec<NodeId>,
    root: NodeId,
    rows: usize,
    cols: usize
}

/// Depth first traversal yielding every parent before its children.
pub struct PreOrder<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children[..self.num_children].iter().filter_map(|c| *c)
    }

    pub fn num_children(&self) -> usize {
        self.num_children
    }

    pub fn is_leaf(&self) -> bool {
        self.num_children == 0
    }

    fn add_child(&mut self, child: NodeId) {
        assert!(
            self.num_children < MAX_CHILDREN,
            "node already has {} children, cannot add {:?}", MAX_CHILDREN, child
        );
        self.children[self.num_children] = Some(child);
        self.num_children += 1;
    }
}

impl Tree {
    /// Build the tree over a `rows` x `cols` grid.
    ///
    /// Panics if `rows` or `cols` is zero, or if the links do not form a tree with exactly one
    /// root. The latter is a bug in this function, not a bad input.
    pub fn build(rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "cannot build a tree over a {}x{} grid", rows, cols);

        let middle = cols / 2;
        let mut nodes = vec![Node::default(); rows * cols];

        for row in 0..rows {
            for col in 0..cols {
                let parent = if col < middle {
                    Some(NodeId(row * cols + col + 1))
                }
                else if col > middle {
                    Some(NodeId(row * cols + col - 1))
                }
                else if row > 0 {
                    Some(NodeId((row - 1) * cols + middle))
                }
                else {
                    None
                };

                nodes[row * cols + col].parent = parent;
            }
        }

        // Children are added in index order, so a middle node lists its left neighbour, then its
        // right neighbour, then the middle node below.
        for idx in 0..nodes.len() {
            if let Some(parent) = nodes[idx].parent {
                nodes[parent.0].add_child(NodeId(idx));
            }
        }

        let roots: Vec<NodeId> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(i, _)| NodeId(i))
            .collect();
        assert_eq!(roots.len(), 1, "tree must have exactly one root, found {:?}", roots);

        let leafs = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_leaf())
            .map(|(i, _)| NodeId(i))
            .collect();

        Self {
            nodes,
            leafs,
            root: roots[0],
            rows,
            cols
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn leafs(&self) -> &[NodeId] {
        &self.leafs
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// `(row, col)` of the node in the cropped grid.
    pub fn position(&self, id: NodeId) -> (usize, usize) {
        (id.0 / self.cols, id.0 % self.cols)
    }

    pub fn id(&self, row: usize, col: usize) -> NodeId {
        debug_assert!(row < self.rows && col < self.cols);
        NodeId(row * self.cols + col)
    }

    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![self.root]
        }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.node(id).children());
        Some(id)
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Union-find over every parent link. Returns the number of components, or `None` if a link
    /// closes a cycle.
    fn components(tree: &Tree) -> Option<usize> {
        let mut set: Vec<usize> = (0..tree.len()).collect();

        fn find(set: &mut Vec<usize>, mut i: usize) -> usize {
            while set[i] != i {
                set[i] = set[set[i]];
                i = set[i];
            }
            i
        }

        let mut count = tree.len();
        for (i, node) in tree.nodes().iter().enumerate() {
            if let Some(p) = node.parent() {
                let a = find(&mut set, i);
                let b = find(&mut set, p.index());
                if a == b {
                    return None;
                }
                set[a] = b;
                count -= 1;
            }
        }

        Some(count)
    }

    #[test]
    fn well_formed_for_many_sizes() {
        for rows in 1..7 {
            for cols in 1..9 {
                let tree = Tree::build(rows, cols);

                assert_eq!(tree.len(), rows * cols);
                assert_eq!(components(&tree), Some(1), "{}x{}", rows, cols);

                let roots = tree.nodes().iter().filter(|n| n.parent().is_none()).count();
                assert_eq!(roots, 1);

                let mut visited: Vec<NodeId> = tree.pre_order().collect();
                assert_eq!(visited.len(), tree.len());
                visited.sort();
                visited.dedup();
                assert_eq!(visited.len(), tree.len());

                for node in tree.nodes() {
                    assert!(node.num_children() <= MAX_CHILDREN);
                }
            }
        }
    }

    #[test]
    fn root_is_top_middle() {
        let tree = Tree::build(4, 7);
        assert_eq!(tree.position(tree.root()), (0, 3));

        let tree = Tree::build(3, 6);
        assert_eq!(tree.position(tree.root()), (0, 3));
    }

    #[test]
    fn rows_converge_on_middle() {
        let tree = Tree::build(3, 5);

        assert_eq!(tree.node(tree.id(1, 0)).parent(), Some(tree.id(1, 1)));
        assert_eq!(tree.node(tree.id(1, 1)).parent(), Some(tree.id(1, 2)));
        assert_eq!(tree.node(tree.id(1, 4)).parent(), Some(tree.id(1, 3)));
        assert_eq!(tree.node(tree.id(1, 3)).parent(), Some(tree.id(1, 2)));
        assert_eq!(tree.node(tree.id(1, 2)).parent(), Some(tree.id(0, 2)));

        let children: Vec<NodeId> = tree.node(tree.id(1, 2)).children().collect();
        assert_eq!(children, vec![tree.id(1, 1), tree.id(1, 3), tree.id(2, 2)]);

        let bottom: Vec<NodeId> = tree.node(tree.id(2, 2)).children().collect();
        assert_eq!(bottom, vec![tree.id(2, 1), tree.id(2, 3)]);
    }

    #[test]
    fn leafs_are_row_ends() {
        let tree = Tree::build(3, 5);
        let mut expected = vec![];
        for row in 0..3 {
            expected.push(tree.id(row, 0));
            expected.push(tree.id(row, 4));
        }
        expected.sort();

        assert_eq!(tree.leafs(), &expected[..]);
    }

    #[test]
    fn degenerate_chains() {
        // Single column is a vertical chain
        let tree = Tree::build(4, 1);
        assert_eq!(tree.root(), NodeId(0));
        assert_eq!(tree.leafs(), &[NodeId(3)]);
        for row in 1..4 {
            assert_eq!(tree.node(NodeId(row)).parent(), Some(NodeId(row - 1)));
        }

        // Single row is two chains meeting in the middle
        let tree = Tree::build(1, 4);
        assert_eq!(tree.root(), NodeId(2));
        assert_eq!(tree.leafs(), &[NodeId(0), NodeId(3)]);

        // Single pixel is a root without children
        let tree = Tree::build(1, 1);
        assert_eq!(tree.root(), NodeId(0));
        assert_eq!(tree.leafs(), &[NodeId(0)]);
    }

    #[test]
    fn pre_order_visits_parents_first() {
        let tree = Tree::build(5, 6);
        let mut seen = vec![false; tree.len()];

        for id in tree.pre_order() {
            if let Some(p) = tree.node(id).parent() {
                assert!(seen[p.index()], "{:?} visited before its parent {:?}", id, p);
            }
            seen[id.index()] = true;
        }
    }

    #[test]
    #[should_panic]
    fn empty_grid_panics() {
        Tree::build(0, 3);
    }
}
