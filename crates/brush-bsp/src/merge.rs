//! Greedy merging of coplanar faces.
//!
//! Splitting brushes during CSG and tree building chops faces into many
//! pieces. Adjacent pieces with the same plane, texture and contents are
//! joined back together whenever the union is still convex.

use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{CompileFace, Contents, Real, Winding};

/// Points closer than this are the same vertex.
const MERGE_EPSILON: Real = 0.01;

/// Convexity tolerance for the merged winding.
const CONVEX_EPSILON: Real = -0.01;

fn points_match(a: &Point3<Real>, b: &Point3<Real>) -> bool {
    (a - b).norm() < MERGE_EPSILON
}

/// Joins two windings that share an edge.
///
/// Both windings must run the same way around `normal`. Returns `None` when
/// they share no edge or when their union is not convex.
pub fn try_merge_winding(w1: &Winding, w2: &Winding, normal: &Vector3<Real>) -> Option<Winding> {
    let p1 = w1.points();
    let p2 = w2.points();
    let n1 = p1.len();
    let n2 = p2.len();

    // Find an edge of w1 that appears reversed in w2
    let (i, j) = (0..n1).find_map(|i| {
        let a = &p1[i];
        let b = &p1[(i + 1) % n1];
        (0..n2)
            .find(|&j| points_match(b, &p2[j]) && points_match(a, &p2[(j + 1) % n2]))
            .map(|j| (i, j))
    })?;

    let mut points = Vec::with_capacity(n1 + n2 - 2);
    for k in 0..n1 {
        points.push(p1[(i + 1 + k) % n1]);
    }
    for k in 0..n2 - 2 {
        points.push(p2[(j + 2 + k) % n2]);
    }

    let merged = Winding::from_points(points)?.remove_colinear_points();
    if merged.len() < 3 || !is_convex(&merged, normal) {
        return None;
    }
    Some(merged)
}

/// Checks that every corner turns the same way around `normal`.
fn is_convex(winding: &Winding, normal: &Vector3<Real>) -> bool {
    let points = winding.points();
    let n = points.len();
    (0..n).all(|i| {
        let e1 = points[(i + 1) % n] - points[i];
        let e2 = points[(i + 2) % n] - points[(i + 1) % n];
        e2.cross(&e1).dot(normal) >= CONVEX_EPSILON
    })
}

/// Merges coplanar faces until no pair can be merged.
///
/// Faces are grouped by plane, texture and contents, keeping the order in
/// which groups first appear. Within a group, pairs are tried in order; each
/// successful merge replaces the first face's winding with the union, drops
/// the second face and starts over from the first pair.
pub fn merge_coplanar_faces(faces: Vec<CompileFace>) -> Vec<CompileFace> {
    let input = faces.len();

    let mut group_index: FxHashMap<(usize, i32, Contents), usize> = FxHashMap::default();
    let mut groups: Vec<Vec<CompileFace>> = Vec::new();
    for face in faces {
        let key = (face.plane_num, face.tex_info, face.contents);
        let index = *group_index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[index].push(face);
    }

    let mut out = Vec::with_capacity(input);
    for mut group in groups {
        merge_group(&mut group);
        out.extend(group);
    }

    debug!(input, output = out.len(), "merged coplanar faces");
    out
}

fn merge_group(group: &mut Vec<CompileFace>) {
    // Every merge restarts the scan from the first face
    while let Some((a, b, winding)) = find_merge(group) {
        group[a].winding = winding;
        group[b].merged = true;
        group.retain(|face| !face.merged);
    }
}

/// First pair in scan order that merges, with the merged winding.
fn find_merge(group: &[CompileFace]) -> Option<(usize, usize, Winding)> {
    for a in 0..group.len() {
        let Some(normal) = group[a].winding.plane().map(|p| p.normal()) else {
            continue;
        };
        for b in (a + 1)..group.len() {
            if let Some(merged) = try_merge_winding(&group[a].winding, &group[b].winding, &normal) {
                return Some((a, b, merged));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn make_rect(x0: Real, y0: Real, x1: Real, y1: Real) -> Winding {
        // Clockwise seen from +Z
        Winding::new(vec![
            Point3::new(x0, y1, 0.0),
            Point3::new(x1, y1, 0.0),
            Point3::new(x1, y0, 0.0),
            Point3::new(x0, y0, 0.0),
        ])
    }

    fn make_face(winding: Winding, tex_info: i32) -> CompileFace {
        CompileFace {
            plane_num: 0,
            side: 0,
            tex_info,
            winding,
            contents: Contents::SOLID,
            original_side: None,
            merged: false,
        }
    }

    #[test]
    fn merge_two_squares() {
        let merged = try_merge_winding(
            &make_rect(0.0, 0.0, 1.0, 1.0),
            &make_rect(1.0, 0.0, 2.0, 1.0),
            &Vector3::z(),
        )
        .unwrap();
        assert_eq!(merged.len(), 4);
        assert_abs_diff_eq!(merged.area(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn no_shared_edge() {
        let merged = try_merge_winding(
            &make_rect(0.0, 0.0, 1.0, 1.0),
            &make_rect(2.0, 0.0, 3.0, 1.0),
            &Vector3::z(),
        );
        assert!(merged.is_none());
    }

    #[test]
    fn l_shape_is_rejected() {
        // A 2x1 rectangle with a vertex in the middle of its top edge
        let wide = Winding::new(vec![
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ]);
        let square = make_rect(0.0, 1.0, 1.0, 2.0);
        assert!(try_merge_winding(&wide, &square, &Vector3::z()).is_none());
    }

    #[test]
    fn four_squares_merge_to_one() {
        let faces = vec![
            make_face(make_rect(0.0, 0.0, 1.0, 1.0), 0),
            make_face(make_rect(0.0, 1.0, 1.0, 2.0), 0),
            make_face(make_rect(1.0, 0.0, 2.0, 1.0), 0),
            make_face(make_rect(1.0, 1.0, 2.0, 2.0), 0),
        ];
        let merged = merge_coplanar_faces(faces);
        assert_eq!(merged.len(), 1);
        assert_abs_diff_eq!(merged[0].winding.area(), 4.0, epsilon = 1e-6);
        assert!(!merged[0].merged);
    }

    #[test]
    fn merged_face_is_retried_from_the_start() {
        // The top strip only fits the union of the two squares below it; once
        // that union exists it is tried before the square to the right
        let faces = vec![
            make_face(make_rect(1.0, 1.0, 3.0, 2.0), 0),
            make_face(make_rect(1.0, 0.0, 2.0, 1.0), 0),
            make_face(make_rect(2.0, 0.0, 3.0, 1.0), 0),
            make_face(make_rect(3.0, 0.0, 4.0, 1.0), 0),
        ];
        let merged = merge_coplanar_faces(faces);
        assert_eq!(merged.len(), 2);
        assert_abs_diff_eq!(merged[0].winding.area(), 4.0, epsilon = 1e-6);
        assert_abs_diff_eq!(merged[1].winding.area(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(merged[1].winding.center().x, 3.5, epsilon = 1e-6);
    }

    #[test]
    fn different_textures_never_merge() {
        let faces = vec![
            make_face(make_rect(0.0, 0.0, 1.0, 1.0), 0),
            make_face(make_rect(1.0, 0.0, 2.0, 1.0), 1),
        ];
        let merged = merge_coplanar_faces(faces);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].tex_info, 0);
        assert_eq!(merged[1].tex_info, 1);
    }

    #[test]
    fn different_planes_never_merge() {
        let mut other = make_face(make_rect(1.0, 0.0, 2.0, 1.0), 0);
        other.plane_num = 1;
        let merged = merge_coplanar_faces(vec![make_face(make_rect(0.0, 0.0, 1.0, 1.0), 0), other]);
        assert_eq!(merged.len(), 2);
    }
}
