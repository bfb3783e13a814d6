//! Axis-aligned bounding boxes.

use nalgebra::{Point3, Vector3};

use crate::Real;

/// An axis-aligned bounding box.
///
/// A freshly created box is empty (mins above maxs) and grows with
/// [`Bounds3::add_point`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    pub mins: Point3<Real>,
    pub maxs: Point3<Real>,
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounds3 {
    /// Creates an empty box that contains no points.
    pub fn empty() -> Self {
        Self {
            mins: Point3::new(Real::MAX, Real::MAX, Real::MAX),
            maxs: Point3::new(Real::MIN, Real::MIN, Real::MIN),
        }
    }

    pub fn new(mins: Point3<Real>, maxs: Point3<Real>) -> Self {
        Self { mins, maxs }
    }

    /// Builds the smallest box containing every point.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<Real>>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.add_point(p);
        }
        bounds
    }

    /// Returns `true` if no point has been added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mins.x > self.maxs.x || self.mins.y > self.maxs.y || self.mins.z > self.maxs.z
    }

    /// Grows the box to contain `point`.
    pub fn add_point(&mut self, point: &Point3<Real>) {
        for i in 0..3 {
            self.mins[i] = self.mins[i].min(point[i]);
            self.maxs[i] = self.maxs[i].max(point[i]);
        }
    }

    /// Returns the smallest box containing both boxes.
    pub fn union(&self, other: &Bounds3) -> Bounds3 {
        let mut out = *self;
        if !other.is_empty() {
            out.add_point(&other.mins);
            out.add_point(&other.maxs);
        }
        out
    }

    /// Returns `true` if the boxes overlap or touch.
    pub fn intersects(&self, other: &Bounds3) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        (0..3).all(|i| self.mins[i] <= other.maxs[i] && self.maxs[i] >= other.mins[i])
    }

    /// Size along each axis. Zero for an empty box.
    pub fn extent(&self) -> Vector3<Real> {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.maxs - self.mins
    }
}
