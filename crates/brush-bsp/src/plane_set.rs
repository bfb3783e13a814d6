//! Deduplicating plane table.
//!
//! Every plane referenced by a brush side, a split or a tree node is interned
//! here and referred to by index. Planes that agree within tolerance share
//! one index, which is what lets coplanar faces from different brushes be
//! grouped and merged later.

use nalgebra::Vector3;

use crate::{Plane3D, PlaneType, Real};

/// Number of hash buckets, keyed on the quantized distance.
pub const PLANE_HASHES: usize = 1024;

/// Normal components closer than this are considered equal.
pub const NORMAL_EPSILON: Real = 1e-4;

/// Distances closer than this are considered equal.
pub const DIST_EPSILON: Real = 0.01;

/// Normal components this close to ±1 are snapped onto the axis.
const SNAP_EPSILON: Real = 1e-5;

/// An interned plane.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilePlane {
    pub normal: Vector3<Real>,
    pub dist: Real,
    pub plane_type: PlaneType,
    /// Next plane in the same hash bucket.
    pub hash_chain: Option<usize>,
}

impl CompilePlane {
    #[inline]
    pub fn plane(&self) -> Plane3D {
        Plane3D::new(self.normal, self.dist)
    }

    fn matches(&self, normal: &Vector3<Real>, dist: Real) -> bool {
        (self.normal.x - normal.x).abs() < NORMAL_EPSILON
            && (self.normal.y - normal.y).abs() < NORMAL_EPSILON
            && (self.normal.z - normal.z).abs() < NORMAL_EPSILON
            && (self.dist - dist).abs() < DIST_EPSILON
    }
}

/// The plane table. Indices are stable and only ever grow.
#[derive(Debug, Clone)]
pub struct PlaneSet {
    planes: Vec<CompilePlane>,
    buckets: Box<[Option<usize>; PLANE_HASHES]>,
}

impl Default for PlaneSet {
    fn default() -> Self {
        Self::new()
    }
}

fn quantize(dist: Real) -> i64 {
    (dist * 100.0).round() as i64
}

fn bucket(q: i64) -> usize {
    q.rem_euclid(PLANE_HASHES as i64) as usize
}

/// Snaps near-axial normals onto the axis so axial planes type as axial.
fn snap_normal(normal: Vector3<Real>) -> Vector3<Real> {
    for i in 0..3 {
        if (normal[i] - 1.0).abs() < SNAP_EPSILON {
            let mut snapped = Vector3::zeros();
            snapped[i] = 1.0;
            return snapped;
        }
        if (normal[i] + 1.0).abs() < SNAP_EPSILON {
            let mut snapped = Vector3::zeros();
            snapped[i] = -1.0;
            return snapped;
        }
    }
    normal
}

impl PlaneSet {
    pub fn new() -> Self {
        Self {
            planes: Vec::new(),
            buckets: Box::new([None; PLANE_HASHES]),
        }
    }

    /// Number of interned planes.
    #[inline]
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Returns the plane at `index`.
    ///
    /// # Panics
    /// Panics if `index` was not returned by this table.
    #[inline]
    pub fn get(&self, index: usize) -> &CompilePlane {
        &self.planes[index]
    }

    /// Returns the geometric plane at `index`.
    #[inline]
    pub fn plane(&self, index: usize) -> Plane3D {
        self.planes[index].plane()
    }

    /// All interned planes, in index order.
    #[inline]
    pub fn planes(&self) -> &[CompilePlane] {
        &self.planes
    }

    /// Looks up a plane without inserting it.
    pub fn find(&self, normal: Vector3<Real>, dist: Real) -> Option<usize> {
        let normal = snap_normal(normal);
        let q = quantize(dist);
        for h in [q - 1, q, q + 1] {
            let mut cursor = self.buckets[bucket(h)];
            while let Some(index) = cursor {
                let plane = &self.planes[index];
                if plane.matches(&normal, dist) {
                    return Some(index);
                }
                cursor = plane.hash_chain;
            }
        }
        None
    }

    /// Returns the index of a plane matching `normal`/`dist` within
    /// tolerance, interning a new one if none exists.
    ///
    /// `normal` must be unit length.
    pub fn find_or_add(&mut self, normal: Vector3<Real>, dist: Real) -> usize {
        if let Some(index) = self.find(normal, dist) {
            return index;
        }

        let normal = snap_normal(normal);
        let index = self.planes.len();
        let slot = bucket(quantize(dist));
        self.planes.push(CompilePlane {
            normal,
            dist,
            plane_type: PlaneType::for_normal(&normal),
            hash_chain: self.buckets[slot],
        });
        self.buckets[slot] = Some(index);
        index
    }

    /// Interns the plane facing the opposite way from `index`.
    pub fn find_or_add_inverse(&mut self, index: usize) -> usize {
        let plane = &self.planes[index];
        let (normal, dist) = (-plane.normal, -plane.dist);
        self.find_or_add(normal, dist)
    }

    /// Looks up the plane facing the opposite way from `index`.
    pub fn find_inverse(&self, index: usize) -> Option<usize> {
        let plane = &self.planes[index];
        self.find(-plane.normal, -plane.dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_within_tolerance() {
        let mut planes = PlaneSet::new();
        let a = planes.find_or_add(Vector3::x(), 10.0);
        let b = planes.find_or_add(Vector3::x(), 10.005);
        let c = planes.find_or_add(Vector3::new(1.0, 0.00005, 0.0), 9.996);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(planes.len(), 1);
    }

    #[test]
    fn distinct_planes_get_increasing_indices() {
        let mut planes = PlaneSet::new();
        let indices: Vec<usize> = [
            (Vector3::x(), 0.0),
            (Vector3::x(), 1.0),
            (-Vector3::x(), 0.0),
            (Vector3::y(), 0.0),
            (Vector3::new(1.0, 1.0, 0.0).normalize(), 0.0),
        ]
        .into_iter()
        .map(|(n, d)| planes.find_or_add(n, d))
        .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn quantization_boundary_neighbors() {
        // 0.004 and 0.006 quantize into different buckets but match in tolerance
        let mut planes = PlaneSet::new();
        let a = planes.find_or_add(Vector3::z(), 0.004);
        let b = planes.find_or_add(Vector3::z(), 0.006);
        assert_eq!(a, b);

        let c = planes.find_or_add(Vector3::z(), -3.004);
        let d = planes.find_or_add(Vector3::z(), -3.006);
        assert_eq!(c, d);
    }

    #[test]
    fn chains_share_buckets() {
        let mut planes = PlaneSet::new();
        // 10.24 apart lands in the same bucket
        let a = planes.find_or_add(Vector3::z(), 1.0);
        let b = planes.find_or_add(Vector3::z(), 11.24);
        assert_ne!(a, b);
        assert_eq!(planes.get(b).hash_chain, Some(a));
        assert_eq!(planes.find(Vector3::z(), 1.0), Some(a));
        assert_eq!(planes.find(Vector3::z(), 11.24), Some(b));
    }

    #[test]
    fn plane_type_set_once() {
        let mut planes = PlaneSet::new();
        let axial = planes.find_or_add(Vector3::new(0.0, -0.999_999_9, 0.0), 5.0);
        assert_eq!(planes.get(axial).plane_type, PlaneType::Y);
        assert_eq!(planes.get(axial).normal, -Vector3::y());

        let general = planes.find_or_add(Vector3::new(0.6, 0.0, 0.8), 5.0);
        assert_eq!(planes.get(general).plane_type, PlaneType::AnyZ);
    }

    #[test]
    fn inverse_planes() {
        let mut planes = PlaneSet::new();
        let p = planes.find_or_add(Vector3::x(), 4.0);
        assert_eq!(planes.find_inverse(p), None);
        let inv = planes.find_or_add_inverse(p);
        assert_ne!(p, inv);
        assert_eq!(planes.get(inv).normal, -Vector3::x());
        assert_eq!(planes.get(inv).dist, -4.0);
        assert_eq!(planes.find_inverse(p), Some(inv));
        assert_eq!(planes.find_or_add_inverse(inv), p);
    }
}
