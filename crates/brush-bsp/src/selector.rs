//! Split plane selection for BSP tree construction.
//!
//! The choice of splitting plane decides how many brushes get cut and how
//! balanced the tree comes out. Selection is behind [`PlaneSelector`] so the
//! heuristic can be swapped without touching the builder.

use rustc_hash::FxHashSet;

use crate::{Classification, CompileBrush, PlaneSet};

/// Cost of each brush a candidate plane would cut.
const SPLIT_PENALTY: i64 = 4;

/// Bonus for axis-aligned candidates.
const AXIAL_BONUS: i64 = 5;

/// A scored split plane candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitCandidate {
    pub plane_num: usize,
    pub score: i64,
    /// Brushes in front of or on the plane.
    pub front_count: usize,
    pub back_count: usize,
    /// Brushes the plane cuts.
    pub split_count: usize,
}

/// Strategy for choosing the plane that splits a set of brushes.
pub trait PlaneSelector {
    /// Picks a plane among the brushes' sides that is not in `used`.
    ///
    /// Returns `None` when no unused plane remains; the builder then makes
    /// a leaf.
    fn select(
        &self,
        brushes: &[CompileBrush],
        planes: &PlaneSet,
        used: &FxHashSet<usize>,
    ) -> Option<SplitCandidate>;
}

/// Prefers planes that cut few brushes, split the rest evenly, and are axial.
///
/// Score is `-4 * cuts - |front - back|`, plus 5 for axial planes. The first
/// candidate seen wins ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalancedSelector;

impl PlaneSelector for BalancedSelector {
    fn select(
        &self,
        brushes: &[CompileBrush],
        planes: &PlaneSet,
        used: &FxHashSet<usize>,
    ) -> Option<SplitCandidate> {
        select_split_plane(brushes, planes, used)
    }
}

/// Scores every unused plane referenced by a face of `brushes` and returns
/// the best.
///
/// Bevel sides and sides without a winding are not candidates.
pub fn select_split_plane(
    brushes: &[CompileBrush],
    planes: &PlaneSet,
    used: &FxHashSet<usize>,
) -> Option<SplitCandidate> {
    let mut seen = FxHashSet::default();
    let mut best: Option<SplitCandidate> = None;

    for brush in brushes {
        for side in &brush.sides {
            if side.bevel || side.winding.is_none() {
                continue;
            }
            if used.contains(&side.plane_num) || !seen.insert(side.plane_num) {
                continue;
            }

            let candidate = score_plane(brushes, planes, side.plane_num);
            if best.is_none_or(|b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }
    }
    best
}

/// Classifies every brush against `plane_num` and scores the result.
pub fn score_plane(brushes: &[CompileBrush], planes: &PlaneSet, plane_num: usize) -> SplitCandidate {
    let plane = planes.plane(plane_num);
    let mut front_count = 0;
    let mut back_count = 0;
    let mut split_count = 0;

    for brush in brushes {
        match brush.classify(&plane) {
            Classification::Front | Classification::Coplanar => front_count += 1,
            Classification::Back => back_count += 1,
            Classification::Spanning => split_count += 1,
        }
    }

    let mut score = -SPLIT_PENALTY * split_count as i64 - (front_count as i64 - back_count as i64).abs();
    if planes.get(plane_num).plane_type.is_axial() {
        score += AXIAL_BONUS;
    }

    SplitCandidate {
        plane_num,
        score,
        front_count,
        back_count,
        split_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BrushDef, Contents, Real, partition_brushes};
    use nalgebra::{Point3, Vector3};

    fn make_box(planes: &mut PlaneSet, mins: [Real; 3], maxs: [Real; 3]) -> CompileBrush {
        let def = BrushDef::cuboid(Point3::from(mins), Point3::from(maxs), Contents::SOLID);
        CompileBrush::prepare(&def, 0, planes).unwrap()
    }

    #[test]
    fn empty_list() {
        let planes = PlaneSet::new();
        assert!(select_split_plane(&[], &planes, &FxHashSet::default()).is_none());
    }

    #[test]
    fn score_counts() {
        let mut planes = PlaneSet::new();
        let brushes = vec![
            make_box(&mut planes, [0.0; 3], [10.0; 3]),
            make_box(&mut planes, [20.0, 0.0, 0.0], [30.0, 10.0, 10.0]),
        ];

        // Cuts the first box
        let cut = planes.find_or_add(Vector3::x(), 5.0);
        let candidate = score_plane(&brushes, &planes, cut);
        assert_eq!(candidate.split_count, 1);
        assert_eq!(candidate.front_count, 1);
        assert_eq!(candidate.score, -4 - 1 + 5);

        // Separates them
        let between = planes.find_or_add(Vector3::x(), 10.0);
        let candidate = score_plane(&brushes, &planes, between);
        assert_eq!((candidate.front_count, candidate.back_count), (1, 1));
        assert_eq!(candidate.score, 5);
    }

    #[test]
    fn general_planes_get_no_bonus() {
        let mut planes = PlaneSet::new();
        let brushes = vec![make_box(&mut planes, [0.0; 3], [10.0; 3])];
        let far = planes.find_or_add(Vector3::new(1.0, 1.0, 0.0).normalize(), 100.0);
        assert_eq!(score_plane(&brushes, &planes, far).score, -1);
    }

    #[test]
    fn picks_separating_plane() {
        let mut planes = PlaneSet::new();
        let brushes = vec![
            make_box(&mut planes, [0.0; 3], [10.0; 3]),
            make_box(&mut planes, [10.0, 0.0, 0.0], [20.0, 10.0, 10.0]),
        ];
        let best = BalancedSelector
            .select(&brushes, &planes, &FxHashSet::default())
            .unwrap();
        assert_eq!(best.plane_num, planes.find(Vector3::x(), 10.0).unwrap());
        assert_eq!(best.score, 5);
    }

    #[test]
    fn used_planes_are_skipped() {
        let mut planes = PlaneSet::new();
        let brushes = vec![make_box(&mut planes, [0.0; 3], [10.0; 3])];
        let mut used: FxHashSet<usize> = brushes[0].sides.iter().map(|s| s.plane_num).collect();
        assert!(select_split_plane(&brushes, &planes, &used).is_none());

        let top = planes.find(Vector3::z(), 10.0).unwrap();
        used.remove(&top);
        assert_eq!(select_split_plane(&brushes, &planes, &used).unwrap().plane_num, top);
    }

    #[test]
    fn inverse_of_used_plane_is_a_candidate() {
        let mut planes = PlaneSet::new();
        let wide = make_box(&mut planes, [0.0; 3], [30.0, 10.0, 10.0]);
        let cut = planes.find_or_add(Vector3::x(), 10.0);
        let (front, _) = partition_brushes(vec![wide], cut, &mut planes);
        let inverse = planes.find_inverse(cut).unwrap();

        // Only the tested closing side on the inverse plane is left
        let cap = front[0].sides.iter().find(|s| s.plane_num == inverse).unwrap();
        assert!(cap.tested);
        let mut used: FxHashSet<usize> = front[0]
            .sides
            .iter()
            .map(|s| s.plane_num)
            .filter(|&p| p != inverse)
            .collect();
        used.insert(cut);

        let best = select_split_plane(&front, &planes, &used).unwrap();
        assert_eq!(best.plane_num, inverse);
    }
}
