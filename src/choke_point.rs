//! Frontiers between two areas.
//!
//! Natural choke points come from clustering the frontier cells recorded by
//! region building. Pseudo choke points sit on top of blocking neutrals and
//! start out blocked.

use crate::area::*;
use crate::grid::*;
use crate::location::*;
use crate::neutral::*;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChokePointId(usize);

impl ChokePointId {
    pub(crate) fn new(index: usize) -> ChokePointId {
        ChokePointId(index)
    }

    /// Row and column of this choke point in the distance and path matrices.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ChokePointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cp{}", self.0)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Node {
    End1,
    Middle,
    End2,
}

impl Node {
    pub const ALL: [Node; 3] = [Node::End1, Node::Middle, Node::End2];

    fn index(self) -> usize {
        match self {
            Node::End1 => 0,
            Node::Middle => 1,
            Node::End2 => 2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChokePoint {
    id: ChokePointId,
    areas: (AreaId, AreaId),
    geometry: Vec<WalkPosition>,
    nodes: [WalkPosition; 3],
    nodes_in_area: [(WalkPosition, WalkPosition); 3],
    blocked: bool,
    pseudo: bool,
    blocking_neutral: Option<NeutralId>,
}

impl ChokePoint {
    /// `blocking_neutral` must be the bottom neutral of its stack.
    pub(crate) fn new(
        grid: &Grid,
        id: ChokePointId,
        areas: (AreaId, AreaId),
        geometry: Vec<WalkPosition>,
        blocking_neutral: Option<NeutralId>,
    ) -> ChokePoint {
        assert!(!geometry.is_empty(), "choke point {} has no geometry", id);

        let middle = geometry[find_middle(grid, &geometry)];
        let nodes = [geometry[0], middle, geometry[geometry.len() - 1]];
        let blocked = blocking_neutral.is_some();

        let in_area = |start: WalkPosition, area: AreaId| {
            nearest_free_cell_of_area(grid, start, area, blocked).unwrap_or_else(|| {
                warn!("{}: no free cell of area {} reachable from {}", id, area, start);
                start
            })
        };

        let mut nodes_in_area = [(middle, middle); 3];
        for node in Node::ALL.iter() {
            let start = nodes[node.index()];
            nodes_in_area[node.index()] = (in_area(start, areas.0), in_area(start, areas.1));
        }

        ChokePoint {
            id,
            areas,
            geometry,
            nodes,
            nodes_in_area,
            blocked,
            pseudo: blocked,
            blocking_neutral,
        }
    }

    pub fn id(&self) -> ChokePointId {
        self.id
    }

    /// The two areas joined, lower id first.
    pub fn areas(&self) -> (AreaId, AreaId) {
        self.areas
    }

    pub fn geometry(&self) -> &[WalkPosition] {
        &self.geometry
    }

    pub fn pos(&self, node: Node) -> WalkPosition {
        self.nodes[node.index()]
    }

    pub fn center(&self) -> WalkPosition {
        self.pos(Node::Middle)
    }

    /// A cell of `area` near `node` that is not under a neutral.
    ///
    /// # Panics
    ///
    /// Panics if `area` is not one of the two areas of this choke point.
    pub fn pos_in_area(&self, node: Node, area: AreaId) -> WalkPosition {
        let (first, second) = self.nodes_in_area[node.index()];
        if area == self.areas.0 {
            first
        } else {
            assert_eq!(area, self.areas.1, "{} does not touch area {}", self.id, area);
            second
        }
    }

    pub fn blocked(&self) -> bool {
        self.blocked
    }

    pub fn is_pseudo(&self) -> bool {
        self.pseudo
    }

    /// Bottom neutral of the stack this pseudo choke point sits on, if any remains.
    pub fn blocking_neutral(&self) -> Option<NeutralId> {
        self.blocking_neutral
    }

    pub fn other_area(&self, area: AreaId) -> AreaId {
        if area == self.areas.0 {
            self.areas.1
        } else {
            self.areas.0
        }
    }

    /// Follows the stack of a destroyed blocking neutral. Must be called after
    /// the neutral left the tiles, so `replacement` is the new bottom of the stack.
    pub(crate) fn on_blocking_neutral_destroyed(&mut self, destroyed: NeutralId, replacement: Option<NeutralId>) {
        if self.blocking_neutral != Some(destroyed) {
            return;
        }

        self.blocking_neutral = replacement;
        if replacement.is_none() {
            self.blocked = false;
        }
    }
}

/// Nearest cell of `area` whose tile holds no neutral. Search spreads inside the area and,
/// when `through_blocked`, across blocked cells.
fn nearest_free_cell_of_area(
    grid: &Grid,
    start: WalkPosition,
    area: AreaId,
    through_blocked: bool,
) -> Option<WalkPosition> {
    let id = area.get();
    grid.breadth_first_search(
        start,
        |mini_tile: &MiniTile, w: WalkPosition| {
            mini_tile.area_id() == id && grid.tile(TilePosition::from(w)).neutral().is_none()
        },
        |mini_tile: &MiniTile, _| mini_tile.area_id() == id || (through_blocked && mini_tile.blocked()),
    )
}

/// Index of the geometry cell reached by climbing altitude from the middle of the sequence.
///
/// Runs of equal altitude are crossed when they lead to a higher cell.
pub fn find_middle(grid: &Grid, geometry: &[WalkPosition]) -> usize {
    let altitude = |i: usize| grid.mini_tile(geometry[i]).altitude();

    let climb = |from: usize, step: isize| -> Option<usize> {
        let base = altitude(from);
        let mut i = from as isize + step;
        while i >= 0 && (i as usize) < geometry.len() {
            let current = altitude(i as usize);
            if current > base {
                return Some(i as usize);
            }
            if current < base {
                return None;
            }
            i += step;
        }
        None
    };

    let mut i = geometry.len() / 2;
    loop {
        if let Some(higher) = climb(i, -1).or_else(|| climb(i, 1)) {
            i = higher;
        } else {
            return i;
        }
    }
}

/// Groups frontier cells, given from the highest altitude down, into chains.
///
/// A cell joins the first chain whose front or back lies within `min_distance`
/// queen moves, on whichever end is closer. Otherwise it starts a chain.
pub fn cluster_frontier(points: &[WalkPosition], min_distance: i32) -> Vec<VecDeque<WalkPosition>> {
    let mut clusters: Vec<VecDeque<WalkPosition>> = Vec::new();

    'points: for &w in points {
        for cluster in clusters.iter_mut() {
            let (front, back) = match (cluster.front(), cluster.back()) {
                (Some(&front), Some(&back)) => (front, back),
                _ => continue,
            };

            let to_front = front.queen_wise_distance(w);
            let to_back = back.queen_wise_distance(w);
            if to_front.min(to_back) <= min_distance {
                if to_front < to_back {
                    cluster.push_front(w);
                } else {
                    cluster.push_back(w);
                }
                continue 'points;
            }
        }

        clusters.push(VecDeque::from(vec![w]));
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_points_share_a_cluster() {
        let points = [
            WalkPosition::new(10, 10),
            WalkPosition::new(10, 11),
            WalkPosition::new(10, 9),
            WalkPosition::new(10, 60),
            WalkPosition::new(10, 12),
        ];

        let clusters = cluster_frontier(&points, 17);

        assert_eq!(clusters.len(), 2);
        assert_eq!(
            clusters[0].iter().copied().collect::<Vec<_>>(),
            vec![
                WalkPosition::new(10, 9),
                WalkPosition::new(10, 10),
                WalkPosition::new(10, 11),
                WalkPosition::new(10, 12)
            ]
        );
        assert_eq!(clusters[1].len(), 1);
    }

    #[test]
    fn distance_threshold_is_inclusive() {
        let points = [WalkPosition::new(0, 0), WalkPosition::new(17, 5), WalkPosition::new(35, 5)];
        let clusters = cluster_frontier(&points, 17);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].back(), Some(&WalkPosition::new(17, 5)));
    }

    fn grid_with_altitudes(altitudes: &[i32]) -> (Grid, Vec<WalkPosition>) {
        let mut grid = Grid::new(TilePosition::new(4, 4));
        let geometry: Vec<WalkPosition> = (0..altitudes.len()).map(|i| WalkPosition::new(i as i32, 0)).collect();
        for (&w, &altitude) in geometry.iter().zip(altitudes.iter()) {
            grid.mini_tile_mut(w).set_altitude(altitude);
        }
        (grid, geometry)
    }

    #[test]
    fn middle_climbs_to_the_peak() {
        let (grid, geometry) = grid_with_altitudes(&[8, 16, 24, 40, 32, 24, 16, 8]);
        assert_eq!(find_middle(&grid, &geometry), 3);

        let (grid, geometry) = grid_with_altitudes(&[8, 16, 16, 16, 16, 24, 8]);
        assert_eq!(find_middle(&grid, &geometry), 5);
    }

    /// Two tiles side by side: area 1 in walk columns 0..2, `between` in columns 2..4,
    /// area 2 in columns 4..8.
    fn two_areas_with(between: fn(&mut MiniTile)) -> Grid {
        let mut grid = Grid::new(TilePosition::new(2, 1));
        for y in 0..4 {
            for x in 0..8 {
                let mini_tile = grid.mini_tile_mut(WalkPosition::new(x, y));
                match x {
                    0..=1 => mini_tile.set_area_id(1),
                    2..=3 => between(mini_tile),
                    _ => mini_tile.set_area_id(2),
                }
            }
        }
        grid
    }

    #[test]
    fn free_cell_is_found_across_blocked_cells_only_when_allowed() {
        let grid = two_areas_with(MiniTile::set_blocked);
        let start = WalkPosition::new(4, 1);
        let first = AreaId::from_index(0);

        let found = nearest_free_cell_of_area(&grid, start, first, true).unwrap();
        assert_eq!(found.x, 1);
        assert_eq!(grid.mini_tile(found).area_id(), 1);

        assert_eq!(nearest_free_cell_of_area(&grid, start, first, false), None);
        assert_eq!(nearest_free_cell_of_area(&grid, start, AreaId::from_index(1), false), Some(start));
    }

    #[test]
    fn free_cell_search_does_not_cross_lakes() {
        let grid = two_areas_with(|mini_tile| {
            mini_tile.set_walkable(false);
            mini_tile.set_lake();
        });

        let start = WalkPosition::new(4, 1);
        assert_eq!(nearest_free_cell_of_area(&grid, start, AreaId::from_index(0), true), None);
    }

    #[test]
    fn free_cell_skips_tiles_under_a_neutral() {
        let mut grid = two_areas_with(MiniTile::set_blocked);
        grid.tile_mut(TilePosition::new(1, 0)).set_neutral(Some(NeutralId::new(0)));

        let start = WalkPosition::new(4, 1);
        assert_eq!(nearest_free_cell_of_area(&grid, start, AreaId::from_index(1), true), None);

        let found = nearest_free_cell_of_area(&grid, start, AreaId::from_index(0), true);
        assert_eq!(found.map(|w| w.x), Some(1));
    }

    #[test]
    fn middle_stays_on_a_plateau_top() {
        let (grid, geometry) = grid_with_altitudes(&[8, 24, 24, 24, 8]);
        assert_eq!(find_middle(&grid, &geometry), 2);
    }
}
