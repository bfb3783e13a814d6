//! BSP tree construction over brush fragments.

use nalgebra::Point3;
use rustc_hash::FxHashSet;
use tracing::warn;

use crate::csg::split_brush;
use crate::selector::{BalancedSelector, PlaneSelector};
use crate::{Bounds3, Classification, CompileBrush, Contents, PlaneSet, Real, combine_contents};

/// Recursion limit for tree construction.
pub const MAX_TREE_DEPTH: usize = 1000;

/// Identifies an interior node; assigned in construction order starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// An interior node: a splitting plane and the two half-spaces it creates.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,
    pub plane_num: usize,
    /// Front subtree first, back subtree second.
    pub children: Box<[Tree; 2]>,
    pub bounds: Bounds3,
}

impl TreeNode {
    #[inline]
    pub fn front(&self) -> &Tree {
        &self.children[0]
    }

    #[inline]
    pub fn back(&self) -> &Tree {
        &self.children[1]
    }
}

/// A convex region of space and the brush pieces that fill it.
#[derive(Debug, Clone, Default)]
pub struct TreeLeaf {
    /// Union of the contents of every brush in the leaf.
    pub contents: Contents,
    pub brushes: Vec<CompileBrush>,
    pub bounds: Bounds3,
}

impl TreeLeaf {
    fn from_brushes(brushes: Vec<CompileBrush>) -> Self {
        let contents = brushes
            .iter()
            .fold(Contents::empty(), |acc, b| combine_contents(acc, b.contents()));
        Self {
            contents,
            bounds: brush_bounds(&brushes),
            brushes,
        }
    }
}

/// A BSP tree. Built once by [`TreeBuilder`] and never modified.
#[derive(Debug, Clone)]
pub enum Tree {
    Node(TreeNode),
    Leaf(TreeLeaf),
}

impl Tree {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    pub fn bounds(&self) -> Bounds3 {
        match self {
            Tree::Node(node) => node.bounds,
            Tree::Leaf(leaf) => leaf.bounds,
        }
    }

    /// Number of interior nodes.
    pub fn node_count(&self) -> usize {
        match self {
            Tree::Node(node) => 1 + node.front().node_count() + node.back().node_count(),
            Tree::Leaf(_) => 0,
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Node(node) => node.front().leaf_count() + node.back().leaf_count(),
            Tree::Leaf(_) => 1,
        }
    }

    /// Number of interior nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            Tree::Node(node) => 1 + node.front().depth().max(node.back().depth()),
            Tree::Leaf(_) => 0,
        }
    }

    /// Finds the leaf containing `point`. Points on a plane go to the front.
    pub fn leaf_for_point(&self, point: &Point3<Real>, planes: &PlaneSet) -> &TreeLeaf {
        let mut current = self;
        loop {
            match current {
                Tree::Node(node) => {
                    let dist = planes.plane(node.plane_num).signed_distance(point);
                    current = if dist >= 0.0 { node.front() } else { node.back() };
                }
                Tree::Leaf(leaf) => return leaf,
            }
        }
    }

    /// Contents at `point`.
    pub fn contents_at(&self, point: &Point3<Real>, planes: &PlaneSet) -> Contents {
        self.leaf_for_point(point, planes).contents
    }
}

/// Builds a tree with the default selector and depth limit.
pub fn build_tree(brushes: Vec<CompileBrush>, planes: &mut PlaneSet) -> Tree {
    TreeBuilder::new(planes).build(brushes)
}

/// Recursive tree construction.
///
/// Each level picks a split plane with the [`PlaneSelector`], partitions the
/// brushes (cutting the ones it straddles) and recurses. A plane is never
/// reused below the node that chose it, so every path through the tree uses
/// distinct planes and recursion ends once a region's brushes have no unused
/// planes left.
pub struct TreeBuilder<'a, S: PlaneSelector = BalancedSelector> {
    planes: &'a mut PlaneSet,
    selector: S,
    max_depth: usize,
    next_id: usize,
}

impl<'a> TreeBuilder<'a, BalancedSelector> {
    pub fn new(planes: &'a mut PlaneSet) -> Self {
        Self {
            planes,
            selector: BalancedSelector,
            max_depth: MAX_TREE_DEPTH,
            next_id: 0,
        }
    }
}

impl<'a, S: PlaneSelector> TreeBuilder<'a, S> {
    /// Replaces the plane selector.
    pub fn with_selector<T: PlaneSelector>(self, selector: T) -> TreeBuilder<'a, T> {
        TreeBuilder {
            planes: self.planes,
            selector,
            max_depth: self.max_depth,
            next_id: self.next_id,
        }
    }

    /// Sets the depth at which a leaf is forced.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(mut self, brushes: Vec<CompileBrush>) -> Tree {
        self.build_node(brushes, 0, &FxHashSet::default())
    }

    fn build_node(&mut self, brushes: Vec<CompileBrush>, depth: usize, used: &FxHashSet<usize>) -> Tree {
        if brushes.is_empty() {
            return Tree::Leaf(TreeLeaf::default());
        }

        if depth >= self.max_depth {
            warn!(
                depth,
                brushes = brushes.len(),
                "maximum tree depth reached, forcing leaf"
            );
            return Tree::Leaf(TreeLeaf::from_brushes(brushes));
        }

        let Some(candidate) = self.selector.select(&brushes, self.planes, used) else {
            return Tree::Leaf(TreeLeaf::from_brushes(brushes));
        };

        let plane_num = candidate.plane_num;
        let bounds = brush_bounds(&brushes);
        let (front, back) = partition_brushes(brushes, plane_num, self.planes);

        let mut child_used = used.clone();
        child_used.insert(plane_num);

        let id = NodeId(self.next_id);
        self.next_id += 1;

        let front = self.build_node(front, depth + 1, &child_used);
        let back = self.build_node(back, depth + 1, &child_used);
        Tree::Node(TreeNode {
            id,
            plane_num,
            children: Box::new([front, back]),
            bounds,
        })
    }
}

/// Sorts brushes to the front or back of a plane, splitting the ones it
/// straddles. Brushes lying on the plane go to the front.
///
/// Sides on the plane (or its inverse) are marked tested in both halves.
pub fn partition_brushes(
    brushes: Vec<CompileBrush>,
    plane_num: usize,
    planes: &mut PlaneSet,
) -> (Vec<CompileBrush>, Vec<CompileBrush>) {
    let plane = planes.plane(plane_num);
    let mut front = Vec::new();
    let mut back = Vec::new();

    for brush in brushes {
        match brush.classify(&plane) {
            Classification::Front | Classification::Coplanar => front.push(brush),
            Classification::Back => back.push(brush),
            Classification::Spanning => {
                let split = split_brush(brush, plane_num, planes, 0);
                front.extend(split.front);
                back.extend(split.back);
            }
        }
    }

    let inverse = planes.find_inverse(plane_num);
    for brush in front.iter_mut().chain(back.iter_mut()) {
        for side in &mut brush.sides {
            if side.plane_num == plane_num || Some(side.plane_num) == inverse {
                side.tested = true;
            }
        }
    }

    (front, back)
}

fn brush_bounds(brushes: &[CompileBrush]) -> Bounds3 {
    brushes
        .iter()
        .fold(Bounds3::empty(), |acc, b| acc.union(&b.bounds))
}
