//! Plane representation and point classification.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Scalar type used for all compiler geometry.
pub type Real = f64;

/// Points within this distance of a plane are considered "on" the plane.
///
/// Used for brush splitting, tree partitioning and face clipping alike, so a
/// brush that survives one stage classifies the same way in the next.
pub const ON_EPSILON: Real = 0.1;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

/// Classification of a point set (winding, brush) relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No point is behind the plane and at least one is in front
    Front,
    /// No point is in front of the plane and at least one is behind
    Back,
    /// All points are on the plane
    Coplanar,
    /// Points on both sides
    Spanning,
}

/// Orientation class of a plane normal.
///
/// Axial planes have a normal exactly along a coordinate axis. The `Any*`
/// variants record the dominant axis of a general plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaneType {
    X,
    Y,
    Z,
    AnyX,
    AnyY,
    AnyZ,
}

impl PlaneType {
    /// Classifies a unit normal.
    pub fn for_normal(normal: &Vector3<Real>) -> Self {
        if normal.x == 1.0 || normal.x == -1.0 {
            return PlaneType::X;
        }
        if normal.y == 1.0 || normal.y == -1.0 {
            return PlaneType::Y;
        }
        if normal.z == 1.0 || normal.z == -1.0 {
            return PlaneType::Z;
        }

        let ax = normal.x.abs();
        let ay = normal.y.abs();
        let az = normal.z.abs();
        if ax >= ay && ax >= az {
            PlaneType::AnyX
        } else if ay >= az {
            PlaneType::AnyY
        } else {
            PlaneType::AnyZ
        }
    }

    /// Returns `true` for planes whose normal lies on a coordinate axis.
    #[inline]
    pub fn is_axial(self) -> bool {
        matches!(self, PlaneType::X | PlaneType::Y | PlaneType::Z)
    }
}

/// A plane in 3D space, represented as `normal · point = dist`.
///
/// The normal is expected to be unit length. Constructors that derive the
/// normal from points normalize it themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane3D {
    normal: Vector3<Real>,
    dist: Real,
}

impl Plane3D {
    /// Creates a plane from a unit normal and distance from the origin.
    pub fn new(normal: Vector3<Real>, dist: Real) -> Self {
        Self { normal, dist }
    }

    /// Creates a plane through three points.
    ///
    /// The normal is `(c - a) × (b - a)`, which faces the viewer when the
    /// points run clockwise. Returns `None` if the points are collinear.
    pub fn from_points(a: Point3<Real>, b: Point3<Real>, c: Point3<Real>) -> Option<Self> {
        let normal = (c - a).cross(&(b - a));
        let len = normal.norm();
        if len < 1e-9 {
            return None;
        }
        let normal = normal / len;
        Some(Self {
            normal,
            dist: normal.dot(&a.coords),
        })
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn dist(&self) -> Real {
        self.dist
    }

    /// Computes the signed distance from a point to the plane.
    /// - Positive: point is in front (same side as normal)
    /// - Negative: point is behind (opposite side from normal)
    #[inline]
    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.dist
    }

    /// Classifies which side of the plane a point lies on using [`ON_EPSILON`].
    #[inline]
    pub fn classify_point(&self, point: &Point3<Real>) -> PlaneSide {
        self.classify_point_with_epsilon(point, ON_EPSILON)
    }

    /// Classifies which side of the plane a point lies on, with a custom epsilon.
    pub fn classify_point_with_epsilon(&self, point: &Point3<Real>, epsilon: Real) -> PlaneSide {
        let dist = self.signed_distance(point);
        if dist > epsilon {
            PlaneSide::Front
        } else if dist < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// Returns the plane facing the opposite direction.
    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            dist: -self.dist,
        }
    }
}
