//! Brushes: convex solids bounded by planes.
//!
//! A [`BrushDef`] is what a map author writes: a list of half-spaces plus
//! contents. [`CompileBrush::prepare`] interns its planes, builds a winding
//! for every side and adds axial bevels. Everything after that (CSG, tree
//! building, face extraction) works on [`CompileBrush`] fragments.

use nalgebra::{Point3, Vector3};
use tracing::trace;

use crate::error::{Error, Result};
use crate::{Bounds3, Classification, Contents, PlaneSet, PlaneSide, Plane3D, Real, Winding};

/// Brushes thinner than this on any axis are degenerate.
pub const MIN_BRUSH_EXTENT: Real = 0.1;

/// One half-space of an authored brush: the solid lies behind the plane.
#[derive(Debug, Clone, PartialEq)]
pub struct SideDef {
    pub normal: Vector3<Real>,
    pub dist: Real,
    pub tex_info: i32,
}

/// An authored brush.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrushDef {
    pub sides: Vec<SideDef>,
    pub contents: Contents,
    pub entity_num: usize,
}

impl BrushDef {
    pub fn new(contents: Contents) -> Self {
        Self {
            sides: Vec::new(),
            contents,
            entity_num: 0,
        }
    }

    /// Adds a side. `normal` does not need to be unit length.
    pub fn with_side(mut self, normal: Vector3<Real>, dist: Real, tex_info: i32) -> Self {
        self.sides.push(SideDef {
            normal,
            dist,
            tex_info,
        });
        self
    }

    /// An axis-aligned box.
    pub fn cuboid(mins: Point3<Real>, maxs: Point3<Real>, contents: Contents) -> Self {
        let mut def = Self::new(contents);
        for i in 0..3 {
            let mut axis = Vector3::zeros();
            axis[i] = 1.0;
            def = def
                .with_side(axis, maxs[i], 0)
                .with_side(-axis, -mins[i], 0);
        }
        def
    }
}

/// One side of a prepared brush or fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushSide {
    pub plane_num: usize,
    pub tex_info: i32,
    /// The face on this side; `None` when the side contributes no geometry.
    pub winding: Option<Winding>,
    /// Whether the side produces a renderable face.
    pub visible: bool,
    /// Set once the side's plane has been used as a splitter on the way down the tree.
    pub tested: bool,
    /// Bounding-only side added by [`CompileBrush::add_box_bevels`].
    pub bevel: bool,
}

/// Identity of the authored brush a fragment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrushOrigin {
    pub brush_num: usize,
    pub entity_num: usize,
    pub contents: Contents,
}

/// A prepared brush or a fragment of one.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileBrush {
    pub original: BrushOrigin,
    pub sides: Vec<BrushSide>,
    pub bounds: Bounds3,
}

impl CompileBrush {
    /// Builds a compile brush from its authored definition.
    ///
    /// Interns each side plane, clips a base winding for each side against
    /// every other side, computes bounds and adds axial bevels. Sides whose
    /// winding clips away entirely are kept but marked invisible.
    pub fn prepare(def: &BrushDef, brush_num: usize, planes: &mut PlaneSet) -> Result<Self> {
        let mut sides: Vec<BrushSide> = Vec::with_capacity(def.sides.len() + 6);

        for (side_num, side) in def.sides.iter().enumerate() {
            let len = side.normal.norm();
            if !len.is_finite() || len < 1e-6 || !side.dist.is_finite() {
                return Err(Error::InvalidPlane {
                    brush: brush_num,
                    side: side_num,
                });
            }
            let plane_num = planes.find_or_add(side.normal / len, side.dist / len);

            if sides.iter().any(|s| s.plane_num == plane_num) {
                trace!(brush = brush_num, side = side_num, "duplicate brush plane");
                continue;
            }
            sides.push(BrushSide {
                plane_num,
                tex_info: side.tex_info,
                winding: None,
                visible: true,
                tested: false,
                bevel: false,
            });
        }

        let side_planes: Vec<Plane3D> = sides.iter().map(|s| planes.plane(s.plane_num)).collect();
        for (i, side) in sides.iter_mut().enumerate() {
            let others = side_planes
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, p)| p);
            side.winding = Winding::base_for_plane(&side_planes[i]).chop_by_planes(others);
            side.visible = side.winding.is_some();
        }

        let mut brush = Self {
            original: BrushOrigin {
                brush_num,
                entity_num: def.entity_num,
                contents: def.contents,
            },
            sides,
            bounds: Bounds3::empty(),
        };
        brush.update_bounds();
        brush.add_box_bevels(planes);
        Ok(brush)
    }

    /// Recomputes bounds from the side windings.
    pub fn update_bounds(&mut self) {
        self.bounds = Bounds3::from_points(self.points());
    }

    /// Adds invisible axial sides on any bounding-box face not already
    /// covered by an axial side.
    ///
    /// Bevels carry no winding; they only tighten the brush for tracing.
    pub fn add_box_bevels(&mut self, planes: &mut PlaneSet) {
        if self.bounds.is_empty() {
            return;
        }
        for axis in 0..3 {
            for dir in [-1.0, 1.0] {
                let covered = self
                    .sides
                    .iter()
                    .any(|s| planes.get(s.plane_num).normal[axis] == dir);
                if covered {
                    continue;
                }

                let mut normal = Vector3::zeros();
                normal[axis] = dir;
                let dist = if dir > 0.0 {
                    self.bounds.maxs[axis]
                } else {
                    -self.bounds.mins[axis]
                };
                let plane_num = planes.find_or_add(normal, dist);
                self.sides.push(BrushSide {
                    plane_num,
                    tex_info: self.sides.first().map_or(0, |s| s.tex_info),
                    winding: None,
                    visible: false,
                    tested: false,
                    bevel: true,
                });
            }
        }
    }

    /// Every point of every side winding.
    pub fn points(&self) -> impl Iterator<Item = &Point3<Real>> {
        self.sides
            .iter()
            .filter_map(|s| s.winding.as_ref())
            .flat_map(|w| w.points().iter())
    }

    /// Contents of the authored brush.
    #[inline]
    pub fn contents(&self) -> Contents {
        self.original.contents
    }

    #[inline]
    pub fn is_detail(&self) -> bool {
        self.original.contents.contains(Contents::DETAIL)
    }

    /// Returns `true` if the bounds are too thin on some axis.
    pub fn is_degenerate(&self) -> bool {
        let extent = self.bounds.extent();
        (0..3).any(|i| extent[i] <= MIN_BRUSH_EXTENT)
    }

    /// Number of sides with a winding.
    pub fn winding_count(&self) -> usize {
        self.sides.iter().filter(|s| s.winding.is_some()).count()
    }

    /// Classifies the whole brush against a plane.
    ///
    /// Points within [`crate::ON_EPSILON`] are ignored; a brush lying
    /// entirely on the plane is `Coplanar`.
    pub fn classify(&self, plane: &Plane3D) -> Classification {
        let mut front = false;
        let mut back = false;
        for point in self.points() {
            match plane.classify_point(point) {
                PlaneSide::Front => front = true,
                PlaneSide::Back => back = true,
                PlaneSide::OnPlane => {}
            }
            if front && back {
                return Classification::Spanning;
            }
        }
        match (front, back) {
            (true, false) => Classification::Front,
            (false, true) => Classification::Back,
            _ => Classification::Coplanar,
        }
    }
}

/// Contents of a region occupied by both brushes.
#[inline]
pub fn combine_contents(a: Contents, b: Contents) -> Contents {
    a | b
}
