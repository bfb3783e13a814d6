//! Linear node and leaf arrays for serializers.
//!
//! Child references use the usual encoding: a non-negative value is a node
//! index, a negative value `-(leaf + 1)` is a leaf index. Nodes are laid out
//! in pre-order, so the root is node 0 whenever the tree has any nodes.

use rustc_hash::FxHashSet;

use crate::{Bounds3, CompileFace, Contents, FaceAssignment, Tree};

#[derive(Debug, Clone, PartialEq)]
pub struct FlatNode {
    pub plane_num: usize,
    /// Front, back.
    pub children: [i32; 2],
    pub mins: [i32; 3],
    pub maxs: [i32; 3],
    pub first_face: usize,
    pub num_faces: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlatLeaf {
    pub contents: Contents,
    /// Visibility cluster; always -1 since visibility is not computed.
    pub cluster: i32,
    pub area: i32,
    pub mins: [i32; 3],
    pub maxs: [i32; 3],
    pub first_leaf_brush: usize,
    pub num_leaf_brushes: usize,
}

/// A tree flattened into index-linked arrays.
#[derive(Debug, Clone, Default)]
pub struct FlatTree {
    pub nodes: Vec<FlatNode>,
    pub leafs: Vec<FlatLeaf>,
    /// Source brush numbers, referenced by leaf ranges.
    pub leaf_brushes: Vec<usize>,
    /// Faces in node order, referenced by node ranges.
    pub faces: Vec<CompileFace>,
}

impl FlatTree {
    /// Child reference of the root: node 0, or leaf 0 for a single-leaf tree.
    pub fn root(&self) -> i32 {
        if self.nodes.is_empty() { -1 } else { 0 }
    }

    /// Faces stored on a node.
    pub fn node_faces(&self, node: &FlatNode) -> &[CompileFace] {
        &self.faces[node.first_face..node.first_face + node.num_faces]
    }

    /// Source brush numbers in a leaf.
    pub fn leaf_brushes_of(&self, leaf: &FlatLeaf) -> &[usize] {
        &self.leaf_brushes[leaf.first_leaf_brush..leaf.first_leaf_brush + leaf.num_leaf_brushes]
    }
}

/// Flattens a tree, copying each node's assigned faces into one array.
pub fn flatten_tree(tree: &Tree, assignment: &FaceAssignment) -> FlatTree {
    let mut flat = FlatTree::default();
    emit(tree, assignment, &mut flat);
    flat
}

fn emit(tree: &Tree, assignment: &FaceAssignment, flat: &mut FlatTree) -> i32 {
    match tree {
        Tree::Leaf(leaf) => {
            let index = flat.leafs.len();
            let first_leaf_brush = flat.leaf_brushes.len();

            let mut seen = FxHashSet::default();
            for brush in &leaf.brushes {
                if seen.insert(brush.original.brush_num) {
                    flat.leaf_brushes.push(brush.original.brush_num);
                }
            }

            let (mins, maxs) = int_bounds(&leaf.bounds);
            flat.leafs.push(FlatLeaf {
                contents: leaf.contents,
                cluster: -1,
                area: -1,
                mins,
                maxs,
                first_leaf_brush,
                num_leaf_brushes: flat.leaf_brushes.len() - first_leaf_brush,
            });
            -(index as i32 + 1)
        }
        Tree::Node(node) => {
            let index = flat.nodes.len();
            let first_face = flat.faces.len();
            let faces = assignment.faces_for(node.id);
            flat.faces.extend(faces.iter().cloned());

            let (mins, maxs) = int_bounds(&node.bounds);
            flat.nodes.push(FlatNode {
                plane_num: node.plane_num,
                children: [0, 0],
                mins,
                maxs,
                first_face,
                num_faces: faces.len(),
            });

            let front = emit(node.front(), assignment, flat);
            let back = emit(node.back(), assignment, flat);
            flat.nodes[index].children = [front, back];
            index as i32
        }
    }
}

/// Outward-rounded integer bounds; zeros for an empty box.
fn int_bounds(bounds: &Bounds3) -> ([i32; 3], [i32; 3]) {
    if bounds.is_empty() {
        return ([0; 3], [0; 3]);
    }
    let mut mins = [0; 3];
    let mut maxs = [0; 3];
    for i in 0..3 {
        mins[i] = bounds.mins[i].floor() as i32;
        maxs[i] = bounds.maxs[i].ceil() as i32;
    }
    (mins, maxs)
}
