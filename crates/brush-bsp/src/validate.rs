//! Geometric validation of CSG output.
//!
//! CSG is only useful if its output really is a set of non-overlapping,
//! non-degenerate solids. [`validate_csg_result`] checks both properties
//! directly on the geometry, independently of how the fragments were made.

use nalgebra::{Point3, Vector3};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::{CompileBrush, DIST_EPSILON, ON_EPSILON, Real};

/// Above this many output brushes the pairwise overlap check is skipped.
pub const OVERLAP_CHECK_LIMIT: usize = 500;

/// Maximum number of individual errors listed in a report.
pub const MAX_REPORTED_ERRORS: usize = 10;

/// Projections overlapping by no more than this count as touching.
///
/// A split keeps vertices within [`ON_EPSILON`] of the plane on both pieces,
/// so neighbouring fragments may cross their shared plane by that much from
/// each side. Interned planes may also differ by up to [`DIST_EPSILON`].
const SEPARATION_EPSILON: Real = 2.0 * ON_EPSILON + DIST_EPSILON;

/// Edge directions with a larger `|dot|` than this are the same axis.
const PARALLEL_DOT: Real = 0.999;

/// A single validation failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error("Brush {index} (source brush {brush_num}) is degenerate: {sides} sides, extent {extent:?}")]
    Degenerate {
        index: usize,
        brush_num: usize,
        sides: usize,
        extent: [Real; 3],
    },

    #[error("Brushes {first} and {second} overlap (source brushes {first_num} and {second_num})")]
    Overlap {
        first: usize,
        second: usize,
        first_num: usize,
        second_num: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
    pub input_brushes: usize,
    pub output_fragments: usize,
    pub degenerate_brushes: usize,
    pub overlapping_pairs: usize,
    /// Whether the overlap check was skipped for size.
    pub overlap_check_skipped: bool,
}

/// Outcome of [`validate_csg_result`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    /// Human-readable errors, capped at [`MAX_REPORTED_ERRORS`] plus a summary line.
    pub errors: Vec<String>,
    pub stats: ValidationStats,
}

/// Checks that `output` holds no degenerate brushes and no two brushes
/// that share volume.
pub fn validate_csg_result(input: &[CompileBrush], output: &[CompileBrush]) -> ValidationReport {
    validate_csg_result_with_limit(input, output, OVERLAP_CHECK_LIMIT)
}

/// [`validate_csg_result`] with a custom overlap check limit.
pub fn validate_csg_result_with_limit(
    input: &[CompileBrush],
    output: &[CompileBrush],
    overlap_check_limit: usize,
) -> ValidationReport {
    let mut issues = Vec::new();
    let mut stats = ValidationStats {
        input_brushes: input.len(),
        output_fragments: output.len(),
        ..Default::default()
    };

    let mut sound = Vec::with_capacity(output.len());
    for (index, brush) in output.iter().enumerate() {
        let extent = brush.bounds.extent();
        if brush.sides.len() < 4 || (0..3).any(|i| extent[i] <= 0.0) {
            stats.degenerate_brushes += 1;
            issues.push(ValidationIssue::Degenerate {
                index,
                brush_num: brush.original.brush_num,
                sides: brush.sides.len(),
                extent: [extent.x, extent.y, extent.z],
            });
        } else {
            sound.push((index, ConvexHull::new(brush)));
        }
    }

    if sound.len() > overlap_check_limit {
        warn!(
            brushes = sound.len(),
            limit = overlap_check_limit,
            "skipping pairwise overlap check"
        );
        stats.overlap_check_skipped = true;
    } else {
        for (a, (first, hull_a)) in sound.iter().enumerate() {
            for (second, hull_b) in &sound[a + 1..] {
                if hulls_overlap(hull_a, hull_b) {
                    stats.overlapping_pairs += 1;
                    issues.push(ValidationIssue::Overlap {
                        first: *first,
                        second: *second,
                        first_num: output[*first].original.brush_num,
                        second_num: output[*second].original.brush_num,
                    });
                }
            }
        }
    }

    let mut errors: Vec<String> = issues
        .iter()
        .take(MAX_REPORTED_ERRORS)
        .map(ToString::to_string)
        .collect();
    if issues.len() > MAX_REPORTED_ERRORS {
        errors.push(format!("... and {} more", issues.len() - MAX_REPORTED_ERRORS));
    }

    ValidationReport {
        valid: issues.is_empty(),
        errors,
        stats,
    }
}

/// The parts of a brush the separating axis test needs.
struct ConvexHull {
    points: Vec<Point3<Real>>,
    mins: Point3<Real>,
    maxs: Point3<Real>,
    normals: Vec<Vector3<Real>>,
    edges: Vec<Vector3<Real>>,
}

impl ConvexHull {
    fn new(brush: &CompileBrush) -> Self {
        let mut normals = Vec::new();
        let mut edges: Vec<Vector3<Real>> = Vec::new();

        for winding in brush.sides.iter().filter_map(|s| s.winding.as_ref()) {
            if let Some(plane) = winding.plane() {
                normals.push(plane.normal());
            }
            let points = winding.points();
            for i in 0..points.len() {
                let edge = points[(i + 1) % points.len()] - points[i];
                let len = edge.norm();
                if len < 1e-9 {
                    continue;
                }
                let dir = edge / len;
                if !edges.iter().any(|e| e.dot(&dir).abs() >= PARALLEL_DOT) {
                    edges.push(dir);
                }
            }
        }

        Self {
            points: brush.points().copied().collect(),
            mins: brush.bounds.mins,
            maxs: brush.bounds.maxs,
            normals,
            edges,
        }
    }

    fn project(&self, axis: &Vector3<Real>) -> (Real, Real) {
        self.points
            .iter()
            .map(|p| axis.dot(&p.coords))
            .fold((Real::MAX, Real::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)))
    }
}

fn separated_on(a: &ConvexHull, b: &ConvexHull, axis: &Vector3<Real>) -> bool {
    let (min_a, max_a) = a.project(axis);
    let (min_b, max_b) = b.project(axis);
    max_a <= min_b + SEPARATION_EPSILON || max_b <= min_a + SEPARATION_EPSILON
}

fn separated_by_bounds(a: &ConvexHull, b: &ConvexHull) -> bool {
    (0..3).any(|i| {
        a.maxs[i] <= b.mins[i] + SEPARATION_EPSILON || b.maxs[i] <= a.mins[i] + SEPARATION_EPSILON
    })
}

fn separated_by_face_normals(a: &ConvexHull, b: &ConvexHull) -> bool {
    a.normals
        .iter()
        .chain(b.normals.iter())
        .any(|axis| separated_on(a, b, axis))
}

fn separated_by_edge_axes(a: &ConvexHull, b: &ConvexHull) -> bool {
    a.edges.iter().any(|ea| {
        b.edges.iter().any(|eb| {
            let axis = ea.cross(eb);
            let len = axis.norm();
            len > 1e-6 && separated_on(a, b, &(axis / len))
        })
    })
}

/// Separating axis test for two convex brushes: bounding boxes first, then
/// face normals, then cross products of edge directions.
fn hulls_overlap(a: &ConvexHull, b: &ConvexHull) -> bool {
    !(separated_by_bounds(a, b) || separated_by_face_normals(a, b) || separated_by_edge_axes(a, b))
}
