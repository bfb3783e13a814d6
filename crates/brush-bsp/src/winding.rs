//! Convex polygon windings.
//!
//! A [`Winding`] is an ordered, closed loop of points bounding a convex
//! polygon. Windings are values: clipping never mutates a winding in place,
//! it returns new ones.
//!
//! Windings built by [`Winding::base_for_plane`] run clockwise when viewed
//! from the front of their plane, and every clipping operation preserves that
//! order. [`Winding::plane`] relies on it to recover the facing direction.

use nalgebra::{Point3, Vector3};

use crate::{Bounds3, Classification, ON_EPSILON, Plane3D, PlaneSide, Real};

/// Half-size of the square produced by [`Winding::base_for_plane`].
pub const MAX_WORLD_COORD: Real = 1_048_576.0;

/// Edges shorter than this are treated as zero length.
const DEGENERATE_EDGE: Real = 0.01;

/// Successive edge directions with a dot product at or above this are collinear.
const COLINEAR_DOT: Real = 0.999;

/// The pieces of a winding on either side of a plane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindingSplit {
    pub front: Option<Winding>,
    pub back: Option<Winding>,
}

/// An ordered loop of at least three coplanar points.
#[derive(Debug, Clone, PartialEq)]
pub struct Winding {
    points: Vec<Point3<Real>>,
}

impl Winding {
    /// Creates a winding from its points.
    ///
    /// # Panics (debug builds only)
    /// Panics if fewer than 3 points are provided.
    pub fn new(points: Vec<Point3<Real>>) -> Self {
        debug_assert!(points.len() >= 3, "Winding must have at least 3 points");
        Self { points }
    }

    /// Creates a winding, or `None` if there are fewer than 3 points.
    pub fn from_points(points: Vec<Point3<Real>>) -> Option<Self> {
        (points.len() >= 3).then_some(Self { points })
    }

    /// A huge square lying on `plane`, clockwise seen from its front.
    ///
    /// Clipping this square by the other planes of a brush yields the face
    /// of the brush on `plane`.
    pub fn base_for_plane(plane: &Plane3D) -> Self {
        let normal = plane.normal();

        // Pick an "up" vector that is not close to the normal
        let mut major = 0;
        let mut max = -1.0;
        for i in 0..3 {
            let v = normal[i].abs();
            if v > max {
                max = v;
                major = i;
            }
        }
        let up = if major == 2 {
            Vector3::x()
        } else {
            Vector3::z()
        };

        let up = (up - normal * up.dot(&normal)).normalize();
        let right = up.cross(&normal);

        let org = Point3::from(normal * plane.dist());
        let up = up * MAX_WORLD_COORD;
        let right = right * MAX_WORLD_COORD;

        Self {
            points: vec![
                org - right + up,
                org + right + up,
                org + right - up,
                org - right - up,
            ],
        }
    }

    /// Returns the points of the winding.
    #[inline]
    pub fn points(&self) -> &[Point3<Real>] {
        &self.points
    }

    /// Returns the number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the winding has no points (never for a valid winding).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The plane the winding lies on, facing the side it runs clockwise from.
    ///
    /// Returns `None` if the first three points are collinear.
    pub fn plane(&self) -> Option<Plane3D> {
        Plane3D::from_points(self.points[0], self.points[1], self.points[2])
    }

    /// Polygon area.
    pub fn area(&self) -> Real {
        let p0 = self.points[0];
        let mut total = 0.0;
        for i in 2..self.points.len() {
            let d1 = self.points[i - 1] - p0;
            let d2 = self.points[i] - p0;
            total += d1.cross(&d2).norm();
        }
        total * 0.5
    }

    /// Average of the points.
    pub fn center(&self) -> Point3<Real> {
        let sum: Vector3<Real> = self.points.iter().map(|p| p.coords).sum();
        Point3::from(sum / self.points.len() as Real)
    }

    pub fn bounds(&self) -> Bounds3 {
        Bounds3::from_points(&self.points)
    }

    /// The same polygon with the opposite facing.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Classifies the winding against a plane using [`ON_EPSILON`].
    pub fn classify(&self, plane: &Plane3D) -> Classification {
        let mut front = false;
        let mut back = false;
        for point in &self.points {
            match plane.classify_point(point) {
                PlaneSide::Front => front = true,
                PlaneSide::Back => back = true,
                PlaneSide::OnPlane => {}
            }
        }
        match (front, back) {
            (true, true) => Classification::Spanning,
            (true, false) => Classification::Front,
            (false, true) => Classification::Back,
            (false, false) => Classification::Coplanar,
        }
    }

    /// Splits the winding by a plane using [`ON_EPSILON`].
    ///
    /// A coplanar winding is returned on both sides. Pieces with fewer than
    /// three points are dropped.
    pub fn split(&self, plane: &Plane3D) -> WindingSplit {
        self.split_with_epsilon(plane, ON_EPSILON)
    }

    /// Splits the winding by a plane with a custom epsilon.
    ///
    /// Walks the edges Sutherland-Hodgman style, building front and back
    /// point lists and inserting an intersection wherever an edge crosses.
    pub fn split_with_epsilon(&self, plane: &Plane3D, epsilon: Real) -> WindingSplit {
        let n = self.points.len();
        let dists: Vec<Real> = self
            .points
            .iter()
            .map(|p| plane.signed_distance(p))
            .collect();
        let sides: Vec<PlaneSide> = dists
            .iter()
            .map(|&d| {
                if d > epsilon {
                    PlaneSide::Front
                } else if d < -epsilon {
                    PlaneSide::Back
                } else {
                    PlaneSide::OnPlane
                }
            })
            .collect();

        let has_front = sides.contains(&PlaneSide::Front);
        let has_back = sides.contains(&PlaneSide::Back);
        if !has_front && !has_back {
            return WindingSplit {
                front: Some(self.clone()),
                back: Some(self.clone()),
            };
        }
        if !has_front {
            return WindingSplit {
                front: None,
                back: Some(self.clone()),
            };
        }
        if !has_back {
            return WindingSplit {
                front: Some(self.clone()),
                back: None,
            };
        }

        let normal = plane.normal();
        let mut front_points = Vec::with_capacity(n + 4);
        let mut back_points = Vec::with_capacity(n + 4);

        for i in 0..n {
            let current = self.points[i];
            match sides[i] {
                PlaneSide::OnPlane => {
                    front_points.push(current);
                    back_points.push(current);
                    continue;
                }
                PlaneSide::Front => front_points.push(current),
                PlaneSide::Back => back_points.push(current),
            }

            let next_idx = (i + 1) % n;
            if sides[next_idx] == PlaneSide::OnPlane || sides[next_idx] == sides[i] {
                continue;
            }

            let next = self.points[next_idx];
            let t = dists[i] / (dists[i] - dists[next_idx]);
            let mut mid = current + (next - current) * t;
            // Axial planes get an exact coordinate
            for j in 0..3 {
                if normal[j] == 1.0 {
                    mid[j] = plane.dist();
                } else if normal[j] == -1.0 {
                    mid[j] = -plane.dist();
                }
            }
            front_points.push(mid);
            back_points.push(mid);
        }

        WindingSplit {
            front: Winding::from_points(front_points),
            back: Winding::from_points(back_points),
        }
    }

    /// Keeps the part of the winding behind `plane`.
    pub fn clip_back(&self, plane: &Plane3D) -> Option<Winding> {
        match self.classify(plane) {
            Classification::Back | Classification::Coplanar => Some(self.clone()),
            Classification::Front => None,
            Classification::Spanning => self.split(plane).back,
        }
    }

    /// Clips the winding behind each plane in turn.
    ///
    /// Returns `None` as soon as nothing is left.
    pub fn chop_by_planes<'a>(self, planes: impl IntoIterator<Item = &'a Plane3D>) -> Option<Winding> {
        let mut winding = self;
        for plane in planes {
            winding = winding.clip_back(plane)?;
        }
        Some(winding)
    }

    /// Removes duplicate points and points lying on a straight edge.
    pub fn remove_colinear_points(&self) -> Winding {
        let mut unique: Vec<Point3<Real>> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            if unique
                .last()
                .is_none_or(|last| (p - last).norm() >= DEGENERATE_EDGE)
            {
                unique.push(*p);
            }
        }
        while unique.len() > 1
            && (unique[unique.len() - 1] - unique[0]).norm() < DEGENERATE_EDGE
        {
            unique.pop();
        }

        let n = unique.len();
        if n < 3 {
            return Winding { points: unique };
        }

        let mut kept = Vec::with_capacity(n);
        for i in 0..n {
            let prev = unique[(i + n - 1) % n];
            let next = unique[(i + 1) % n];
            let v1 = (unique[i] - prev).normalize();
            let v2 = (next - unique[i]).normalize();
            if v1.dot(&v2) < COLINEAR_DOT {
                kept.push(unique[i]);
            }
        }
        Winding { points: kept }
    }
}

/// Geometry that can be split by a plane.
pub trait Cuttable: Sized {
    /// Splits into `(front, back)` pieces.
    ///
    /// Geometry wholly on one side comes back unchanged on that side.
    fn cut(&self, plane: &Plane3D) -> (Option<Self>, Option<Self>);
}

impl Cuttable for Winding {
    fn cut(&self, plane: &Plane3D) -> (Option<Self>, Option<Self>) {
        let split = self.split(plane);
        (split.front, split.back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn make_square(x0: Real, y0: Real, x1: Real, y1: Real) -> Winding {
        // Clockwise seen from +Z
        Winding::new(vec![
            Point3::new(x0, y1, 0.0),
            Point3::new(x1, y1, 0.0),
            Point3::new(x1, y0, 0.0),
            Point3::new(x0, y0, 0.0),
        ])
    }

    #[test]
    fn base_winding_lies_on_plane() {
        let normals = [
            Vector3::x(),
            -Vector3::z(),
            Vector3::new(1.0, 2.0, 3.0).normalize(),
            Vector3::new(-0.3, 0.1, 0.05).normalize(),
        ];
        for normal in normals {
            let plane = Plane3D::new(normal, 42.0);
            let w = Winding::base_for_plane(&plane);
            assert_eq!(w.len(), 4);
            for p in w.points() {
                assert_abs_diff_eq!(plane.signed_distance(p), 0.0, epsilon = 1e-6);
            }
            let recovered = w.plane().unwrap();
            assert_relative_eq!(recovered.normal(), normal, epsilon = 1e-9);
        }
    }

    #[test]
    fn square_plane_and_area() {
        let w = make_square(0.0, 0.0, 2.0, 3.0);
        assert_relative_eq!(w.plane().unwrap().normal(), Vector3::z());
        assert_relative_eq!(w.area(), 6.0);
        assert_relative_eq!(w.center(), Point3::new(1.0, 1.5, 0.0));
    }

    #[test]
    fn split_spanning() {
        let w = make_square(0.0, 0.0, 10.0, 10.0);
        let plane = Plane3D::new(Vector3::x(), 4.0);
        let split = w.split(&plane);

        let front = split.front.unwrap();
        let back = split.back.unwrap();
        assert_relative_eq!(front.area(), 60.0, epsilon = 1e-9);
        assert_relative_eq!(back.area(), 40.0, epsilon = 1e-9);
        assert!(front.points().iter().all(|p| p.x >= 4.0));
        assert!(back.points().iter().all(|p| p.x <= 4.0));
        // Orientation survives the split
        assert_relative_eq!(front.plane().unwrap().normal(), Vector3::z());
    }

    #[test]
    fn split_one_sided() {
        let w = make_square(0.0, 0.0, 1.0, 1.0);
        let split = w.split(&Plane3D::new(Vector3::x(), -5.0));
        assert_eq!(split.front.as_ref(), Some(&w));
        assert!(split.back.is_none());

        // Touching within epsilon still counts as one side
        let split = w.split(&Plane3D::new(Vector3::x(), 1.05));
        assert!(split.front.is_none());
        assert_eq!(split.back.as_ref(), Some(&w));
    }

    #[test]
    fn split_coplanar_goes_both_ways() {
        let w = make_square(0.0, 0.0, 1.0, 1.0);
        let split = w.split(&Plane3D::new(Vector3::z(), 0.0));
        assert_eq!(split.front.as_ref(), Some(&w));
        assert_eq!(split.back.as_ref(), Some(&w));
    }

    #[test]
    fn classify_winding() {
        let w = make_square(0.0, 0.0, 1.0, 1.0);
        assert_eq!(w.classify(&Plane3D::new(Vector3::z(), 0.0)), Classification::Coplanar);
        assert_eq!(w.classify(&Plane3D::new(Vector3::x(), 0.5)), Classification::Spanning);
        assert_eq!(w.classify(&Plane3D::new(Vector3::x(), 1.0)), Classification::Back);
        assert_eq!(w.classify(&Plane3D::new(Vector3::x(), 0.0)), Classification::Front);
    }

    #[test]
    fn chop_to_box_face() {
        let top = Plane3D::new(Vector3::z(), 10.0);
        let sides = [
            Plane3D::new(Vector3::x(), 10.0),
            Plane3D::new(-Vector3::x(), 0.0),
            Plane3D::new(Vector3::y(), 10.0),
            Plane3D::new(-Vector3::y(), 0.0),
        ];
        let face = Winding::base_for_plane(&top).chop_by_planes(&sides).unwrap();
        assert_relative_eq!(face.area(), 100.0, epsilon = 1e-6);
        assert_relative_eq!(face.plane().unwrap().normal(), Vector3::z(), epsilon = 1e-9);
    }

    #[test]
    fn chop_away_everything() {
        let w = make_square(0.0, 0.0, 1.0, 1.0);
        let planes = [Plane3D::new(-Vector3::x(), -5.0)];
        assert!(w.chop_by_planes(&planes).is_none());
    }

    #[test]
    fn remove_colinear_and_duplicates() {
        let w = Winding::new(vec![
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ]);
        let cleaned = w.remove_colinear_points();
        assert_eq!(cleaned.len(), 4);
        assert_relative_eq!(cleaned.area(), 2.0);
    }

    #[test]
    fn reversed_flips_normal() {
        let w = make_square(0.0, 0.0, 1.0, 1.0);
        assert_relative_eq!(w.reversed().plane().unwrap().normal(), -Vector3::z());
    }

    #[test]
    fn cut_trait() {
        let w = make_square(0.0, 0.0, 2.0, 2.0);
        let (front, back) = w.cut(&Plane3D::new(Vector3::y(), 1.0));
        assert!(front.is_some());
        assert!(back.is_some());
    }
}
