//! Compiles convex brushes into a BSP tree with visible faces.
//!
//! The pipeline runs in stages: planes are interned in a [`PlaneSet`],
//! overlapping brushes are carved apart by CSG, the fragments are partitioned
//! into a [`Tree`], and the faces that border empty space are extracted,
//! merged and filed under tree nodes. [`compile`] runs all of it.

mod bounds;
mod brush;
mod brush_list;
mod compiler;
mod contents;
mod csg;
mod error;
mod faces;
mod flatten;
mod merge;
mod plane;
mod plane_set;
mod selector;
mod tree;
mod validate;
mod visitor;
mod winding;

pub use bounds::Bounds3;
pub use brush::{BrushDef, BrushOrigin, BrushSide, CompileBrush, MIN_BRUSH_EXTENT, SideDef, combine_contents};
pub use brush_list::{BrushKey, BrushList};
pub use compiler::{CompileOptions, CompileOutput, CompileStats, compile};
pub use contents::Contents;
pub use csg::{BrushSplit, process_csg, split_brush, subtract_brush};
pub use error::{Error, Result};
pub use faces::{CompileFace, FaceAssignment, SideRef, assign_faces_to_nodes, extract_faces};
pub use flatten::{FlatLeaf, FlatNode, FlatTree, flatten_tree};
pub use merge::{merge_coplanar_faces, try_merge_winding};
pub use plane::{Classification, ON_EPSILON, Plane3D, PlaneSide, PlaneType, Real};
pub use plane_set::{CompilePlane, DIST_EPSILON, NORMAL_EPSILON, PLANE_HASHES, PlaneSet};
pub use selector::{BalancedSelector, PlaneSelector, SplitCandidate, score_plane, select_split_plane};
pub use tree::{MAX_TREE_DEPTH, NodeId, Tree, TreeBuilder, TreeLeaf, TreeNode, build_tree, partition_brushes};
pub use validate::{
    MAX_REPORTED_ERRORS, OVERLAP_CHECK_LIMIT, ValidationIssue, ValidationReport, ValidationStats,
    validate_csg_result, validate_csg_result_with_limit,
};
pub use visitor::{CollectingVisitor, FaceVisitor, FnVisitor};
pub use winding::{Cuttable, MAX_WORLD_COORD, Winding, WindingSplit};
