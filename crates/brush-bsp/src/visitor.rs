//! Ordered traversal of assigned faces.
//!
//! Once faces are filed under tree nodes, walking the tree relative to an
//! eye position yields them in painter's order without sorting.

use nalgebra::Point3;

use crate::{CompileFace, FaceAssignment, PlaneSet, Real, Tree};

/// Visitor for processing faces during tree traversal.
pub trait FaceVisitor {
    /// Called once per node that has faces, with all faces on that node.
    fn visit(&mut self, faces: &[CompileFace]);
}

/// A simple visitor that collects all visited faces.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    collected: Vec<CompileFace>,
}

impl CollectingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_faces(self) -> Vec<CompileFace> {
        self.collected
    }

    pub fn faces(&self) -> &[CompileFace] {
        &self.collected
    }
}

impl FaceVisitor for CollectingVisitor {
    fn visit(&mut self, faces: &[CompileFace]) {
        self.collected.extend(faces.iter().cloned());
    }
}

/// A visitor that calls a closure for each face group.
pub struct FnVisitor<F>
where
    F: FnMut(&[CompileFace]),
{
    func: F,
}

impl<F> FnVisitor<F>
where
    F: FnMut(&[CompileFace]),
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> FaceVisitor for FnVisitor<F>
where
    F: FnMut(&[CompileFace]),
{
    fn visit(&mut self, faces: &[CompileFace]) {
        (self.func)(faces);
    }
}

impl Tree {
    /// Visits assigned faces nearest-first as seen from `eye`.
    ///
    /// Unassigned faces are not visited.
    pub fn traverse_front_to_back<V: FaceVisitor>(
        &self,
        faces: &FaceAssignment,
        planes: &PlaneSet,
        eye: &Point3<Real>,
        visitor: &mut V,
    ) {
        traverse(self, faces, planes, eye, visitor, true);
    }

    /// Visits assigned faces farthest-first as seen from `eye`.
    pub fn traverse_back_to_front<V: FaceVisitor>(
        &self,
        faces: &FaceAssignment,
        planes: &PlaneSet,
        eye: &Point3<Real>,
        visitor: &mut V,
    ) {
        traverse(self, faces, planes, eye, visitor, false);
    }
}

fn traverse<V: FaceVisitor>(
    tree: &Tree,
    faces: &FaceAssignment,
    planes: &PlaneSet,
    eye: &Point3<Real>,
    visitor: &mut V,
    front_to_back: bool,
) {
    let Tree::Node(node) = tree else {
        return;
    };

    // The child on the eye's side is nearer
    let eye_in_front = planes.plane(node.plane_num).signed_distance(eye) >= 0.0;
    let (near, far) = if eye_in_front {
        (node.front(), node.back())
    } else {
        (node.back(), node.front())
    };
    let (first, last) = if front_to_back { (near, far) } else { (far, near) };

    traverse(first, faces, planes, eye, visitor, front_to_back);
    let here = faces.faces_for(node.id);
    if !here.is_empty() {
        visitor.visit(here);
    }
    traverse(last, faces, planes, eye, visitor, front_to_back);
}
