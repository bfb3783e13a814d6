//! The compile pipeline.
//!
//! [`compile`] runs every stage in order: brush preparation, CSG,
//! validation, tree construction, face extraction, merging, face assignment
//! and flattening. It is a pure function of its inputs.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::error::Result;
use crate::{
    BrushDef, CompileBrush, CompileFace, Contents, FaceAssignment, FlatTree, MAX_TREE_DEPTH,
    OVERLAP_CHECK_LIMIT, PlaneSet, Tree, TreeBuilder, ValidationReport, assign_faces_to_nodes,
    extract_faces, flatten_tree, merge_coplanar_faces, process_csg, validate_csg_result_with_limit,
};

/// Compiler settings.
///
/// Missing fields take their default when parsed from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Keep detail brushes from carving structural brushes.
    pub preserve_detail: bool,
    pub merge_faces: bool,
    /// Run the CSG validator and include its report in the output.
    pub validate: bool,
    pub max_tree_depth: usize,
    pub overlap_check_limit: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            preserve_detail: false,
            merge_faces: true,
            validate: true,
            max_tree_depth: MAX_TREE_DEPTH,
            overlap_check_limit: OVERLAP_CHECK_LIMIT,
        }
    }
}

impl CompileOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileStats {
    pub input_brushes: usize,
    /// Brushes dropped before CSG (degenerate or origin brushes).
    pub dropped_brushes: usize,
    pub csg_fragments: usize,
    pub planes: usize,
    pub nodes: usize,
    pub leafs: usize,
    pub tree_depth: usize,
    pub extracted_faces: usize,
    pub final_faces: usize,
    pub unassigned_faces: usize,
}

/// Everything the pipeline produces.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub planes: PlaneSet,
    /// Non-overlapping CSG fragments.
    pub brushes: Vec<CompileBrush>,
    pub tree: Tree,
    /// Final faces after merging.
    pub faces: Vec<CompileFace>,
    pub assignment: FaceAssignment,
    pub flat: FlatTree,
    /// `None` when validation is disabled.
    pub report: Option<ValidationReport>,
    pub stats: CompileStats,
}

/// Compiles authored brushes into a tree and a face list.
///
/// Fails only on input that cannot describe geometry (see
/// [`crate::Error::InvalidPlane`]); degenerate brushes are dropped.
pub fn compile(defs: &[BrushDef], options: &CompileOptions) -> Result<CompileOutput> {
    let _span = info_span!("compile", brushes = defs.len()).entered();
    info!(brushes = defs.len(), "compiling brushes");

    let mut planes = PlaneSet::new();
    let mut brushes = Vec::with_capacity(defs.len());
    for (brush_num, def) in defs.iter().enumerate() {
        if def.contents.contains(Contents::ORIGIN) {
            debug!(brush = brush_num, "skipping origin brush");
            continue;
        }
        let brush = CompileBrush::prepare(def, brush_num, &mut planes)?;
        if brush.winding_count() == 0 || brush.is_degenerate() {
            debug!(brush = brush_num, "dropping degenerate brush");
            continue;
        }
        brushes.push(brush);
    }

    let fragments = info_span!("csg")
        .in_scope(|| process_csg(brushes.clone(), &mut planes, options.preserve_detail));

    let report = options.validate.then(|| {
        info_span!("validate").in_scope(|| {
            validate_csg_result_with_limit(&brushes, &fragments, options.overlap_check_limit)
        })
    });
    if let Some(report) = report.as_ref().filter(|r| !r.valid) {
        warn!(errors = report.errors.len(), "CSG validation failed");
    }

    let tree = info_span!("tree").in_scope(|| {
        TreeBuilder::new(&mut planes)
            .with_max_depth(options.max_tree_depth)
            .build(fragments.clone())
    });

    let (faces, extracted_faces) = info_span!("faces").in_scope(|| {
        let extracted = extract_faces(&fragments, &tree, &planes);
        let count = extracted.len();
        if options.merge_faces {
            (merge_coplanar_faces(extracted), count)
        } else {
            (extracted, count)
        }
    });

    let assignment = assign_faces_to_nodes(faces.clone(), &tree, &planes);
    let flat = flatten_tree(&tree, &assignment);

    let stats = CompileStats {
        input_brushes: defs.len(),
        dropped_brushes: defs.len() - brushes.len(),
        csg_fragments: fragments.len(),
        planes: planes.len(),
        nodes: tree.node_count(),
        leafs: tree.leaf_count(),
        tree_depth: tree.depth(),
        extracted_faces,
        final_faces: faces.len(),
        unassigned_faces: assignment.unassigned.len(),
    };
    info!(
        fragments = stats.csg_fragments,
        nodes = stats.nodes,
        leafs = stats.leafs,
        faces = stats.final_faces,
        "compile complete"
    );

    Ok(CompileOutput {
        planes,
        brushes: fragments,
        tree,
        faces,
        assignment,
        flat,
        report,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Real};
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Rotation3, Unit, Vector3};

    fn make_box(mins: [Real; 3], maxs: [Real; 3]) -> BrushDef {
        BrushDef::cuboid(Point3::from(mins), Point3::from(maxs), Contents::SOLID)
    }

    /// Seeded LCG for scattering brushes.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> Real {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((self.0 >> 33) as Real) / (u32::MAX as Real / 2.0)
        }
    }

    fn make_rotated_cube(center: Point3<Real>, size: Real, rotation: &Rotation3<Real>) -> BrushDef {
        let mut def = BrushDef::new(Contents::SOLID);
        for axis in [Vector3::x(), Vector3::y(), Vector3::z()] {
            for dir in [1.0, -1.0] {
                let normal = rotation * (axis * dir);
                def = def.with_side(normal, normal.dot(&center.coords) + size / 2.0, 0);
            }
        }
        def
    }

    fn make_scattered_cubes(seed: u64, count: usize) -> Vec<BrushDef> {
        let mut rng = Lcg(seed);
        (0..count)
            .map(|_| {
                let center = Point3::new(
                    (rng.next() - 0.5) * 30.0,
                    (rng.next() - 0.5) * 30.0,
                    (rng.next() - 0.5) * 30.0,
                );
                let size = 3.0 + rng.next() * 5.0;
                let axis = Vector3::new(rng.next() - 0.5, rng.next() - 0.5, rng.next() - 0.5);
                let axis = if axis.norm() > 0.01 {
                    Unit::new_normalize(axis)
                } else {
                    Vector3::x_axis()
                };
                let angle = rng.next() * std::f64::consts::TAU;
                make_rotated_cube(center, size, &Rotation3::from_axis_angle(&axis, angle))
            })
            .collect()
    }

    fn total_area(faces: &[CompileFace]) -> Real {
        faces.iter().map(|f| f.winding.area()).sum()
    }

    #[test]
    fn single_box() {
        let output = compile(&[make_box([0.0; 3], [10.0; 3])], &CompileOptions::default()).unwrap();

        assert_eq!(output.faces.len(), 6);
        assert_eq!(output.stats.csg_fragments, 1);
        assert_eq!(output.stats.nodes, 6);
        assert_eq!(output.stats.unassigned_faces, 0);
        assert!(output.report.unwrap().valid);
        assert_eq!(output.flat.faces.len(), 6);
    }

    #[test]
    fn cube_with_carved_center() {
        let defs = [make_box([0.0; 3], [10.0; 3]), make_box([4.0; 3], [6.0; 3])];
        let output = compile(&defs, &CompileOptions::default()).unwrap();

        assert!(output.brushes.len() > 2);
        let report = output.report.unwrap();
        assert!(report.valid, "{:?}", report.errors);
        assert_eq!(report.stats.overlapping_pairs, 0);

        // Only the outer shell is visible
        assert_relative_eq!(total_area(&output.faces), 600.0, epsilon = 1e-6);
        assert!(output.stats.final_faces <= output.stats.extracted_faces);
        assert!(output.stats.final_faces >= 6);
    }

    #[test]
    fn hollow_room() {
        let defs = [
            make_box([-8.0, -8.0, -8.0], [136.0, 136.0, 0.0]),
            make_box([-8.0, -8.0, 128.0], [136.0, 136.0, 136.0]),
            make_box([-8.0, -8.0, 0.0], [0.0, 136.0, 128.0]),
            make_box([128.0, -8.0, 0.0], [136.0, 136.0, 128.0]),
            make_box([0.0, -8.0, 0.0], [128.0, 0.0, 128.0]),
            make_box([0.0, 128.0, 0.0], [128.0, 136.0, 128.0]),
        ];
        let output = compile(&defs, &CompileOptions::default()).unwrap();
        assert!(output.report.as_ref().unwrap().valid);

        let planes = &output.planes;
        assert_eq!(output.tree.contents_at(&Point3::new(64.0, 64.0, 64.0), planes), Contents::empty());
        assert_eq!(output.tree.contents_at(&Point3::new(64.0, 64.0, -4.0), planes), Contents::SOLID);
        assert_eq!(output.tree.contents_at(&Point3::new(-4.0, 64.0, 64.0), planes), Contents::SOLID);

        // Interior (6 x 128^2) plus exterior (6 x 144^2) surfaces
        let expected = 6.0 * 128.0 * 128.0 + 6.0 * 144.0 * 144.0;
        assert_relative_eq!(total_area(&output.faces), expected, epsilon = 1e-3);
    }

    #[test]
    fn rotated_brushes_compile_valid() {
        for seed in 1..=5 {
            let defs = make_scattered_cubes(seed, 8);
            let output = compile(&defs, &CompileOptions::default()).unwrap();
            let report = output.report.unwrap();
            assert!(report.valid, "seed {seed}: {:?}", report.errors);
            assert!(output.stats.csg_fragments >= output.stats.input_brushes - output.stats.dropped_brushes);
        }
    }

    #[test]
    fn rotated_brush_carving_axial_brush_is_valid() {
        let angle = std::f64::consts::FRAC_PI_4;
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), angle)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), angle);
        let defs = [
            make_box([0.0; 3], [10.0; 3]),
            make_rotated_cube(Point3::new(10.0, 5.0, 5.0), 6.0, &rotation),
        ];
        let output = compile(&defs, &CompileOptions::default()).unwrap();
        assert!(output.brushes.len() > 2);
        let report = output.report.unwrap();
        assert!(report.valid, "{:?}", report.errors);
    }

    #[test]
    fn options_from_json() {
        let options = CompileOptions::from_json(r#"{ "preserve_detail": true, "max_tree_depth": 64 }"#).unwrap();
        assert!(options.preserve_detail);
        assert_eq!(options.max_tree_depth, 64);
        assert!(options.merge_faces);
        assert_eq!(options.overlap_check_limit, OVERLAP_CHECK_LIMIT);

        let err = CompileOptions::from_json("{ \"validate\": 3 }").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn invalid_plane_is_an_error() {
        let bad = BrushDef::new(Contents::SOLID).with_side(Vector3::new(Real::NAN, 0.0, 0.0), 1.0, 0);
        let err = compile(&[make_box([0.0; 3], [1.0; 3]), bad], &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidPlane { brush: 1, side: 0 }));
    }

    #[test]
    fn origin_and_degenerate_brushes_are_dropped() {
        let defs = [
            make_box([0.0; 3], [10.0; 3]),
            BrushDef::cuboid(Point3::new(20.0, 0.0, 0.0), Point3::new(30.0, 10.0, 0.05), Contents::SOLID),
            BrushDef::cuboid(Point3::new(40.0, 0.0, 0.0), Point3::new(42.0, 2.0, 2.0), Contents::ORIGIN),
        ];
        let output = compile(&defs, &CompileOptions::default()).unwrap();
        assert_eq!(output.stats.dropped_brushes, 2);
        assert_eq!(output.brushes.len(), 1);
    }

    #[test]
    fn validation_can_be_disabled() {
        let options = CompileOptions {
            validate: false,
            merge_faces: false,
            ..Default::default()
        };
        let output = compile(&[make_box([0.0; 3], [10.0; 3])], &options).unwrap();
        assert!(output.report.is_none());
        assert_eq!(output.stats.final_faces, output.stats.extracted_faces);
    }
}
