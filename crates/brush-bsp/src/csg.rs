//! Constructive solid geometry over brushes.
//!
//! Authored brushes may overlap freely. [`process_csg`] carves them into a
//! list of fragments that share no volume: each brush, in declaration order,
//! is subtracted from every fragment already in the list and then appended
//! whole, so later brushes win wherever brushes overlap.

use tracing::{debug, trace};

use crate::{
    BrushList, BrushSide, Classification, CompileBrush, ON_EPSILON, PlaneSet, Plane3D, Real, Winding,
};

/// Pieces of a brush on either side of a plane.
#[derive(Debug, Clone, Default)]
pub struct BrushSplit {
    pub front: Option<CompileBrush>,
    pub back: Option<CompileBrush>,
}

/// Splits a brush by the plane `plane_num`.
///
/// Each side winding is clipped by the plane, and each non-empty piece gets
/// one new, invisible side closing it off: the front piece on the inverted
/// plane, the back piece on the plane itself. Pieces that come out thinner
/// than [`crate::MIN_BRUSH_EXTENT`] on some axis are dropped.
///
/// A brush that does not reach more than [`ON_EPSILON`] past the plane on
/// one side is returned whole on the other.
pub fn split_brush(
    brush: CompileBrush,
    plane_num: usize,
    planes: &mut PlaneSet,
    tex_info: i32,
) -> BrushSplit {
    let plane = planes.plane(plane_num);

    let mut d_front: Real = 0.0;
    let mut d_back: Real = 0.0;
    for point in brush.points() {
        let d = plane.signed_distance(point);
        d_front = d_front.max(d);
        d_back = d_back.min(d);
    }
    if d_front < ON_EPSILON {
        return BrushSplit {
            front: None,
            back: Some(brush),
        };
    }
    if d_back > -ON_EPSILON {
        return BrushSplit {
            front: Some(brush),
            back: None,
        };
    }

    let mut front_sides = Vec::with_capacity(brush.sides.len() + 1);
    let mut back_sides = Vec::with_capacity(brush.sides.len() + 1);
    for side in &brush.sides {
        let Some(winding) = &side.winding else {
            continue;
        };

        if winding.classify(&plane) == Classification::Coplanar {
            // A side facing along the plane normal bounds the solid behind it
            if planes.get(side.plane_num).normal.dot(&plane.normal()) > 0.0 {
                back_sides.push(side.clone());
            } else {
                front_sides.push(side.clone());
            }
            continue;
        }

        let split = winding.split(&plane);
        if let Some(w) = split.front {
            front_sides.push(BrushSide {
                winding: Some(w),
                ..side.clone()
            });
        }
        if let Some(w) = split.back {
            back_sides.push(BrushSide {
                winding: Some(w),
                ..side.clone()
            });
        }
    }

    if front_sides.is_empty() {
        return BrushSplit {
            front: None,
            back: Some(brush),
        };
    }
    if back_sides.is_empty() {
        return BrushSplit {
            front: Some(brush),
            back: None,
        };
    }

    let inverse = planes.find_or_add_inverse(plane_num);
    let front = close_fragment(&brush, front_sides, inverse, planes, tex_info);
    let back = close_fragment(&brush, back_sides, plane_num, planes, tex_info);
    trace!(
        brush = brush.original.brush_num,
        plane = plane_num,
        front = front.is_some(),
        back = back.is_some(),
        "split brush"
    );
    BrushSplit { front, back }
}

/// Adds the closing side on `cap_plane` and drops degenerate results.
fn close_fragment(
    parent: &CompileBrush,
    mut sides: Vec<BrushSide>,
    cap_plane: usize,
    planes: &PlaneSet,
    tex_info: i32,
) -> Option<CompileBrush> {
    let clip_planes: Vec<Plane3D> = sides.iter().map(|s| planes.plane(s.plane_num)).collect();
    let cap = Winding::base_for_plane(&planes.plane(cap_plane)).chop_by_planes(&clip_planes);
    if let Some(winding) = cap {
        sides.push(BrushSide {
            plane_num: cap_plane,
            tex_info,
            winding: Some(winding),
            visible: false,
            tested: false,
            bevel: false,
        });
    }

    let mut fragment = CompileBrush {
        original: parent.original,
        sides,
        bounds: parent.bounds,
    };
    fragment.update_bounds();
    if fragment.sides.len() < 4 || fragment.is_degenerate() {
        debug!(
            brush = parent.original.brush_num,
            "dropping degenerate split fragment"
        );
        return None;
    }
    Some(fragment)
}

/// Computes `a - b` as a list of fragments of `a`.
///
/// Walks the sides of `b`, peeling off the part of `a` in front of each one.
/// An empty result means `a` lies entirely inside `b`. If `a` turns out not
/// to reach inside `b` at all, it comes back as the only element, unsplit.
pub fn subtract_brush(a: &CompileBrush, b: &CompileBrush, planes: &mut PlaneSet) -> Vec<CompileBrush> {
    if !a.bounds.intersects(&b.bounds) {
        return vec![a.clone()];
    }

    let mut outside = Vec::new();
    let mut inside = a.clone();
    for side in b.sides.iter().filter(|s| !s.bevel) {
        let split = split_brush(inside, side.plane_num, planes, side.tex_info);
        if let Some(front) = split.front {
            outside.push(front);
        }
        match split.back {
            Some(back) => inside = back,
            None => return vec![a.clone()],
        }
    }
    outside
}

/// Carves overlapping brushes into non-overlapping fragments.
///
/// Brushes are processed in order. With `preserve_detail`, a detail brush
/// never cuts into structural fragments, so structural geometry stays whole.
pub fn process_csg(
    brushes: Vec<CompileBrush>,
    planes: &mut PlaneSet,
    preserve_detail: bool,
) -> Vec<CompileBrush> {
    let input_count = brushes.len();
    let mut list = BrushList::new();

    for brush in brushes {
        let mut prev = None;
        let mut cursor = list.head();
        while let Some(key) = cursor {
            let next = list.next(key);
            let fragments = match list.get(key) {
                Some(existing)
                    if existing.bounds.intersects(&brush.bounds)
                        && !(preserve_detail && brush.is_detail() && !existing.is_detail()) =>
                {
                    Some(subtract_brush(existing, &brush, planes))
                }
                _ => None,
            };
            prev = match fragments {
                Some(fragments) => list.splice(prev, key, fragments),
                None => Some(key),
            };
            cursor = next;
        }
        list.push(brush);
    }

    debug!(input = input_count, output = list.len(), "CSG complete");
    list.into_vec()
}
