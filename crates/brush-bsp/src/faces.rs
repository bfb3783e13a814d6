//! Renderable faces: extraction from brush sides and assignment to tree nodes.

use nalgebra::Vector3;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{
    Classification, CompileBrush, Contents, Cuttable, NodeId, PlaneSet, Plane3D, Real, Tree,
    Winding,
};

/// Index of a brush side in the fragment list a face was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SideRef {
    pub brush: usize,
    pub side: usize,
}

/// A renderable polygon lying on one of the interned planes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileFace {
    pub plane_num: usize,
    /// 0 if the face points along its node's plane normal, 1 if against it.
    pub side: u8,
    pub tex_info: i32,
    pub winding: Winding,
    pub contents: Contents,
    pub original_side: Option<SideRef>,
    /// Set on a face that has been folded into another.
    pub merged: bool,
}

impl Cuttable for CompileFace {
    fn cut(&self, plane: &Plane3D) -> (Option<Self>, Option<Self>) {
        let split = self.winding.split(plane);
        let piece = |winding: Winding| CompileFace {
            winding,
            ..self.clone()
        };
        (split.front.map(piece), split.back.map(piece))
    }
}

/// Faces grouped by the tree node whose plane they lie on.
#[derive(Debug, Clone, Default)]
pub struct FaceAssignment {
    pub by_node: FxHashMap<NodeId, Vec<CompileFace>>,
    /// Faces that reached a leaf without meeting their plane.
    pub unassigned: Vec<CompileFace>,
}

impl FaceAssignment {
    /// Faces on `node`, empty if none.
    pub fn faces_for(&self, node: NodeId) -> &[CompileFace] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of faces assigned to nodes.
    pub fn assigned_count(&self) -> usize {
        self.by_node.values().map(Vec::len).sum()
    }

    /// Total number of faces, assigned or not.
    pub fn len(&self) -> usize {
        self.assigned_count() + self.unassigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pushes every visible brush side through the tree, keeping the pieces
/// that end up outside solid space.
///
/// A piece lying on a node's plane continues on the side its own normal
/// points to, so a face always ends up in the region it faces. Pieces that
/// land in a solid leaf are hidden behind or inside other geometry and are
/// dropped.
pub fn extract_faces(brushes: &[CompileBrush], tree: &Tree, planes: &PlaneSet) -> Vec<CompileFace> {
    let mut faces = Vec::new();

    for (brush_index, brush) in brushes.iter().enumerate() {
        for (side_index, side) in brush.sides.iter().enumerate() {
            if side.bevel || !side.visible {
                continue;
            }
            let Some(winding) = &side.winding else {
                continue;
            };

            let normal = planes.get(side.plane_num).normal;
            let mut pieces = Vec::new();
            clip_to_tree(winding.clone(), &normal, tree, planes, &mut pieces);

            faces.extend(pieces.into_iter().map(|winding| CompileFace {
                plane_num: side.plane_num,
                side: 0,
                tex_info: side.tex_info,
                winding,
                contents: brush.contents(),
                original_side: Some(SideRef {
                    brush: brush_index,
                    side: side_index,
                }),
                merged: false,
            }));
        }
    }

    debug!(faces = faces.len(), "extracted faces");
    faces
}

fn clip_to_tree(
    winding: Winding,
    face_normal: &Vector3<Real>,
    tree: &Tree,
    planes: &PlaneSet,
    out: &mut Vec<Winding>,
) {
    match tree {
        Tree::Leaf(leaf) => {
            if !leaf.contents.is_solid() {
                out.push(winding);
            }
        }
        Tree::Node(node) => {
            let plane = planes.plane(node.plane_num);
            match winding.classify(&plane) {
                Classification::Front => clip_to_tree(winding, face_normal, node.front(), planes, out),
                Classification::Back => clip_to_tree(winding, face_normal, node.back(), planes, out),
                Classification::Coplanar => {
                    let child = if face_normal.dot(&plane.normal()) > 0.0 {
                        node.front()
                    } else {
                        node.back()
                    };
                    clip_to_tree(winding, face_normal, child, planes, out);
                }
                Classification::Spanning => {
                    let (front, back) = winding.cut(&plane);
                    if let Some(front) = front {
                        clip_to_tree(front, face_normal, node.front(), planes, out);
                    }
                    if let Some(back) = back {
                        clip_to_tree(back, face_normal, node.back(), planes, out);
                    }
                }
            }
        }
    }
}

/// Files each face under the node whose plane it lies on.
///
/// Faces straddling a node plane on the way down are split and each piece
/// placed separately.
pub fn assign_faces_to_nodes(faces: Vec<CompileFace>, tree: &Tree, planes: &PlaneSet) -> FaceAssignment {
    let mut assignment = FaceAssignment::default();
    for face in faces {
        assign_face(face, tree, planes, &mut assignment);
    }
    if !assignment.unassigned.is_empty() {
        debug!(
            unassigned = assignment.unassigned.len(),
            "faces reached a leaf without a matching node"
        );
    }
    assignment
}

fn assign_face(mut face: CompileFace, tree: &Tree, planes: &PlaneSet, out: &mut FaceAssignment) {
    let Tree::Node(node) = tree else {
        out.unassigned.push(face);
        return;
    };

    let plane = planes.plane(node.plane_num);
    match face.winding.classify(&plane) {
        Classification::Coplanar => {
            let facing = planes.get(face.plane_num).normal.dot(&plane.normal());
            face.side = if facing > 0.0 { 0 } else { 1 };
            out.by_node.entry(node.id).or_default().push(face);
        }
        Classification::Front => assign_face(face, node.front(), planes, out),
        Classification::Back => assign_face(face, node.back(), planes, out),
        Classification::Spanning => {
            let (front, back) = face.cut(&plane);
            if let Some(front) = front {
                assign_face(front, node.front(), planes, out);
            }
            if let Some(back) = back {
                assign_face(back, node.back(), planes, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BrushDef, build_tree, process_csg};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn make_box(planes: &mut PlaneSet, num: usize, mins: [Real; 3], maxs: [Real; 3]) -> CompileBrush {
        let def = BrushDef::cuboid(Point3::from(mins), Point3::from(maxs), Contents::SOLID);
        CompileBrush::prepare(&def, num, planes).unwrap()
    }

    fn compile_faces(planes: &mut PlaneSet, brushes: Vec<CompileBrush>) -> (Vec<CompileBrush>, Tree, Vec<CompileFace>) {
        let fragments = process_csg(brushes, planes, false);
        let tree = build_tree(fragments.clone(), planes);
        let faces = extract_faces(&fragments, &tree, planes);
        (fragments, tree, faces)
    }

    fn total_area(faces: &[CompileFace]) -> Real {
        faces.iter().map(|f| f.winding.area()).sum()
    }

    #[test]
    fn single_box_faces() {
        let mut planes = PlaneSet::new();
        let brush = make_box(&mut planes, 0, [0.0; 3], [10.0; 3]);
        let (_, tree, faces) = compile_faces(&mut planes, vec![brush]);

        assert_eq!(faces.len(), 6);
        assert_relative_eq!(total_area(&faces), 600.0, epsilon = 1e-6);
        for face in &faces {
            assert_eq!(face.contents, Contents::SOLID);
            assert!(face.original_side.is_some());
        }

        let assignment = assign_faces_to_nodes(faces, &tree, &planes);
        assert_eq!(assignment.assigned_count(), 6);
        assert!(assignment.unassigned.is_empty());
        for faces in assignment.by_node.values() {
            assert!(faces.iter().all(|f| f.side == 0));
        }
    }

    #[test]
    fn touching_boxes_hide_shared_faces() {
        let mut planes = PlaneSet::new();
        let brushes = vec![
            make_box(&mut planes, 0, [0.0; 3], [10.0; 3]),
            make_box(&mut planes, 1, [10.0, 0.0, 0.0], [20.0, 10.0, 10.0]),
        ];
        let (_, _, faces) = compile_faces(&mut planes, brushes);

        assert_eq!(faces.len(), 10);
        assert_relative_eq!(total_area(&faces), 1000.0, epsilon = 1e-6);
        let shared = planes.find(Vector3::x(), 10.0).unwrap();
        assert!(faces.iter().all(|f| f.plane_num != shared));
    }

    #[test]
    fn partially_covered_face_is_clipped() {
        let mut planes = PlaneSet::new();
        let brushes = vec![
            make_box(&mut planes, 0, [0.0, 0.0, 0.0], [20.0, 10.0, 10.0]),
            make_box(&mut planes, 1, [0.0, 0.0, 10.0], [10.0, 10.0, 20.0]),
        ];
        let (_, _, faces) = compile_faces(&mut planes, brushes);

        assert_relative_eq!(total_area(&faces), 1400.0, epsilon = 1e-6);
        let top = planes.find(Vector3::z(), 10.0).unwrap();
        let exposed: Vec<&CompileFace> = faces.iter().filter(|f| f.plane_num == top).collect();
        let area: Real = exposed.iter().map(|f| f.winding.area()).sum();
        assert_relative_eq!(area, 100.0, epsilon = 1e-6);
        assert!(exposed.iter().all(|f| f.winding.center().x > 10.0));
    }

    #[test]
    fn enclosed_brush_has_no_faces() {
        let mut planes = PlaneSet::new();
        let brushes = vec![
            make_box(&mut planes, 0, [0.0; 3], [10.0; 3]),
            make_box(&mut planes, 1, [4.0; 3], [6.0; 3]),
        ];
        let (fragments, _, faces) = compile_faces(&mut planes, brushes);

        let inner = fragments.len() - 1;
        assert!(faces
            .iter()
            .all(|f| f.original_side.is_some_and(|s| s.brush != inner)));
        assert_relative_eq!(total_area(&faces), 600.0, epsilon = 1e-6);
    }

    #[test]
    fn unassigned_faces_are_kept() {
        let planes = {
            let mut planes = PlaneSet::new();
            planes.find_or_add(Vector3::z(), 0.0);
            planes
        };
        let face = CompileFace {
            plane_num: 0,
            side: 0,
            tex_info: 0,
            winding: Winding::new(vec![
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
            ]),
            contents: Contents::SOLID,
            original_side: None,
            merged: false,
        };
        let tree = Tree::Leaf(Default::default());
        let assignment = assign_faces_to_nodes(vec![face], &tree, &planes);
        assert_eq!(assignment.unassigned.len(), 1);
        assert_eq!(assignment.len(), 1);
    }
}
