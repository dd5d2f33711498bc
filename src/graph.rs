//! Areas, choke points and bases of a map, with ground distances between choke points.
//!
//! Distances are computed in two passes. The first runs Dijkstra over the
//! tiles of each area between the choke points of that area. The second runs
//! Dijkstra over the choke points themselves, linked through shared areas,
//! and never crosses a blocked choke point.

use crate::area::*;
use crate::base::*;
use crate::base_locator::*;
use crate::choke_point::*;
use crate::config::*;
use crate::constants::*;
use crate::grid::*;
use crate::location::*;
use crate::neutral::*;
use crate::regions::*;
use crate::search::*;
use itertools::Itertools;
use log::*;
use std::collections::BTreeMap;

/// Tiles of one area, plus tiles shared with other regions.
struct AreaTiles<'a> {
    grid: &'a Grid,
    area: AreaId,
}

impl<'a> SearchGraph for AreaTiles<'a> {
    fn node_count(&self) -> usize {
        let size = self.grid.size();
        (size.x * size.y) as usize
    }

    fn for_each_edge<F: FnMut(usize, i32)>(&self, node: usize, mut edge: F) {
        let current = self.grid.tile_at_index(node);
        for &(dx, dy) in NEIGHBORS_8.iter() {
            let next = current.offset(dx, dy);
            if !self.grid.valid_tile(next) {
                continue;
            }

            let id = self.grid.tile(next).area_id();
            if id == self.area.get() || id == TILE_AREA_ID_MIXED {
                let cost = if dx != 0 && dy != 0 {
                    DIAGONAL_MOVE_COST
                } else {
                    STRAIGHT_MOVE_COST
                };
                edge(self.grid.tile_index(next), cost);
            }
        }
    }
}

/// Choke points linked by the distances already known inside each area.
struct ChokePointLinks<'a> {
    areas: &'a [Area],
    choke_points: &'a [ChokePoint],
    distances: &'a [i32],
}

impl<'a> SearchGraph for ChokePointLinks<'a> {
    fn node_count(&self) -> usize {
        self.choke_points.len()
    }

    fn for_each_edge<F: FnMut(usize, i32)>(&self, node: usize, mut edge: F) {
        let count = self.choke_points.len();
        let (a, b) = self.choke_points[node].areas();

        for area in [a, b].iter() {
            for next in self.areas[area.index()].choke_points() {
                if next.index() == node {
                    continue;
                }

                let distance = self.distances[node * count + next.index()];
                if distance >= 0 {
                    edge(next.index(), distance);
                }
            }
        }
    }

    fn expandable(&self, node: usize) -> bool {
        !self.choke_points[node].blocked()
    }
}

/// Area whose tiles cover most of the footprint, the higher id on ties.
fn main_area(grid: &Grid, top_left: TilePosition, size: TilePosition) -> Option<AreaId> {
    let mut frequencies: BTreeMap<AreaId, usize> = BTreeMap::new();

    for dy in 0..size.y {
        for dx in 0..size.x {
            let t = top_left.offset(dx, dy);
            if !grid.valid_tile(t) {
                continue;
            }
            if let Some(area) = AreaId::from_region_id(grid.tile(t).area_id()) {
                *frequencies.entry(area).or_insert(0) += 1;
            }
        }
    }

    frequencies
        .into_iter()
        .max_by_key(|&(area, count)| (count, area))
        .map(|(area, _)| area)
}

fn tile_distance_to_pixels(distance: i32) -> i32 {
    (0.5 + distance as f64 * TILE_PIXEL_SIZE as f64 / STRAIGHT_MOVE_COST as f64) as i32
}

#[derive(Clone, Debug, Default)]
pub struct RegionGraph {
    areas: Vec<Area>,
    choke_points: Vec<ChokePoint>,
    /// Row `j` holds, for each `i < j`, the choke points between areas of index `i` and `j`.
    choke_points_matrix: Vec<Vec<Vec<ChokePointId>>>,
    distances: Vec<i32>,
    paths: Vec<Vec<ChokePointId>>,
    bases: Vec<Base>,
}

impl RegionGraph {
    pub(crate) fn new(seeds: &[AreaSeed], grid: &Grid) -> RegionGraph {
        let areas = seeds
            .iter()
            .enumerate()
            .map(|(index, seed)| {
                let id = AreaId::from_index(index);
                debug_assert_eq!(grid.mini_tile(seed.top).area_id(), id.get());
                Area::new(id, seed.top, grid.mini_tile(seed.top).altitude(), seed.mini_tiles)
            })
            .collect::<Vec<_>>();

        let choke_points_matrix = (0..areas.len()).map(|row| vec![Vec::new(); row]).collect();

        RegionGraph {
            areas,
            choke_points_matrix,
            ..RegionGraph::default()
        }
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// # Panics
    ///
    /// Panics if no area has id `id`.
    pub fn area(&self, id: AreaId) -> &Area {
        assert!(id.index() < self.areas.len(), "unknown area {}", id);
        &self.areas[id.index()]
    }

    pub fn try_area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(id.index())
    }

    pub fn choke_points(&self) -> &[ChokePoint] {
        &self.choke_points
    }

    pub fn choke_point(&self, id: ChokePointId) -> &ChokePoint {
        assert!(id.index() < self.choke_points.len(), "unknown choke point {}", id);
        &self.choke_points[id.index()]
    }

    /// Choke points between two distinct areas, in either order.
    pub fn choke_points_between(&self, a: AreaId, b: AreaId) -> &[ChokePointId] {
        assert!(a != b, "choke points between area {} and itself", a);
        assert!(
            a.index() < self.areas.len() && b.index() < self.areas.len(),
            "unknown area pair ({}, {})",
            a,
            b
        );

        let (low, high) = if a < b { (a, b) } else { (b, a) };
        &self.choke_points_matrix[high.index()][low.index()]
    }

    /// Ground distance in pixels between two choke points, -1 if one cannot be reached from the other.
    pub fn distance(&self, a: ChokePointId, b: ChokePointId) -> i32 {
        self.distances[a.index() * self.choke_points.len() + b.index()]
    }

    /// Choke points crossed going from `a` to `b`, both included. Empty if `b` cannot be reached.
    pub fn path_between(&self, a: ChokePointId, b: ChokePointId) -> &[ChokePointId] {
        &self.paths[a.index() * self.choke_points.len() + b.index()]
    }

    pub fn bases(&self) -> &[Base] {
        &self.bases
    }

    pub fn base(&self, id: BaseId) -> &Base {
        assert!(id.index() < self.bases.len(), "unknown base {}", id);
        &self.bases[id.index()]
    }

    pub(crate) fn bases_mut(&mut self) -> &mut [Base] {
        &mut self.bases
    }

    /// Clusters the frontier of every pair of areas into choke points, then adds
    /// one pseudo choke point per pair of areas separated by each blocking neutral.
    pub(crate) fn create_choke_points(
        &mut self,
        grid: &Grid,
        neutrals: &Neutrals,
        frontier: &[FrontierPoint],
        config: &AnalysisConfig,
    ) {
        let mut frontier_by_pair: BTreeMap<(AreaId, AreaId), Vec<WalkPosition>> = BTreeMap::new();
        for point in frontier {
            let (a, b) = point.areas;
            match (AreaId::from_region_id(a.min(b)), AreaId::from_region_id(a.max(b))) {
                (Some(low), Some(high)) if low != high => {
                    frontier_by_pair.entry((low, high)).or_default().push(point.position);
                }
                _ => debug_assert!(false, "frontier point {} between {} and {}", point.position, a, b),
            }
        }

        let cluster_distance = config.cluster_min_distance();
        for (&pair, points) in frontier_by_pair.iter() {
            for cluster in cluster_frontier(points, cluster_distance) {
                self.add_choke_point(grid, pair, cluster.into_iter().collect(), None);
            }
        }
        let natural = self.choke_points.len();

        let blocking: Vec<&Neutral> = neutrals
            .static_buildings()
            .chain(neutrals.minerals())
            .filter(|n| n.blocking() && n.next_stacked().is_none())
            .collect();

        for neutral in blocking {
            let blocked_areas: Vec<AreaId> = neutral
                .doors()
                .iter()
                .filter_map(|&door| AreaId::from_region_id(grid.mini_tile(door).area_id()))
                .collect();

            let center = grid.breadth_first_search(
                WalkPosition::from(neutral.pos()),
                |mini_tile: &MiniTile, _| mini_tile.walkable(),
                |_: &MiniTile, _| true,
            );
            let center = match center {
                Some(center) => center,
                None => {
                    warn!("blocking neutral {} has no walkable cell nearby", neutral.id());
                    continue;
                }
            };

            let bottom = grid.tile(neutral.top_left()).neutral();

            for (i, &a) in blocked_areas.iter().enumerate() {
                for &b in blocked_areas[..i].iter() {
                    if b == a {
                        break;
                    }
                    let pair = if a < b { (a, b) } else { (b, a) };
                    self.add_choke_point(grid, pair, vec![center], bottom);
                }
            }
        }

        for high in 0..self.areas.len() {
            for low in 0..high {
                let list = self.choke_points_matrix[high][low].clone();
                if list.is_empty() {
                    continue;
                }
                self.areas[high].add_choke_points(AreaId::from_index(low), &list);
                self.areas[low].add_choke_points(AreaId::from_index(high), &list);
            }
        }

        debug!(
            "choke points: {} natural, {} pseudo",
            natural,
            self.choke_points.len() - natural
        );
    }

    fn add_choke_point(
        &mut self,
        grid: &Grid,
        (low, high): (AreaId, AreaId),
        geometry: Vec<WalkPosition>,
        blocking_neutral: Option<NeutralId>,
    ) {
        let id = ChokePointId::new(self.choke_points.len());
        self.choke_points
            .push(ChokePoint::new(grid, id, (low, high), geometry, blocking_neutral));
        self.choke_points_matrix[high.index()][low.index()].push(id);
    }

    fn set_distance(&mut self, a: ChokePointId, b: ChokePointId, distance: i32, path: Vec<ChokePointId>) {
        let count = self.choke_points.len();
        self.distances[a.index() * count + b.index()] = distance;
        self.distances[b.index() * count + a.index()] = distance;

        let mut reversed = path.clone();
        reversed.reverse();
        self.paths[a.index() * count + b.index()] = path;
        self.paths[b.index() * count + a.index()] = reversed;
    }

    fn improves(&self, a: ChokePointId, b: ChokePointId, distance: i32) -> bool {
        let existing = self.distance(a, b);
        existing == -1 || distance < existing
    }

    /// Tile of `area` closest to where `choke_point` meets it.
    fn entry_tile(&self, grid: &Grid, choke_point: ChokePointId, area: AreaId) -> Option<TilePosition> {
        let start = TilePosition::from(self.choke_point(choke_point).pos_in_area(Node::Middle, area));
        grid.breadth_first_search(start, |tile: &Tile, _| tile.area_id() == area.get(), |_: &Tile, _| true)
    }

    fn compute_area_distances(&mut self, grid: &Grid, area: AreaId, scratch: &mut SearchScratch) {
        let choke_points = self.area(area).choke_points().to_vec();
        let entries: Vec<Option<usize>> = choke_points
            .iter()
            .map(|&cp| self.entry_tile(grid, cp, area).map(|t| grid.tile_index(t)))
            .collect();

        let tiles = AreaTiles { grid, area };

        for (i, &start) in choke_points.iter().enumerate() {
            let start_node = match entries[i] {
                Some(node) => node,
                None => {
                    warn!("choke point {} has no tile in area {}", start, area);
                    continue;
                }
            };

            let targets: Vec<(ChokePointId, usize)> = (0..i)
                .filter_map(|j| entries[j].map(|node| (choke_points[j], node)))
                .collect();
            let target_nodes: Vec<usize> = targets.iter().map(|&(_, node)| node).collect();

            let found = dijkstra(&tiles, scratch, start_node, &target_nodes);

            for (&(target, _), distance) in targets.iter().zip(found) {
                match distance {
                    Some(distance) => {
                        let distance = tile_distance_to_pixels(distance);
                        if self.improves(start, target, distance) {
                            self.set_distance(start, target, distance, vec![start, target]);
                        }
                    }
                    None => warn!("area {}: {} cannot reach {} through its tiles", area, start, target),
                }
            }
        }
    }

    fn compute_linked_distances(&mut self, scratch: &mut SearchScratch) {
        for start in 0..self.choke_points.len() {
            let targets: Vec<usize> = (0..start).collect();

            let updates: Vec<(ChokePointId, i32, Vec<ChokePointId>)> = {
                let links = ChokePointLinks {
                    areas: &self.areas,
                    choke_points: &self.choke_points,
                    distances: &self.distances,
                };

                let found = dijkstra(&links, scratch, start, &targets);

                targets
                    .iter()
                    .zip(found)
                    .filter_map(|(&target, distance)| distance.map(|d| (target, d)))
                    .filter(|&(target, d)| {
                        self.improves(ChokePointId::new(start), ChokePointId::new(target), d)
                    })
                    .map(|(target, d)| {
                        let path = scratch.path_to(target).into_iter().map(ChokePointId::new).collect();
                        (ChokePointId::new(target), d, path)
                    })
                    .collect()
            };

            for (target, distance, path) in updates {
                self.set_distance(ChokePointId::new(start), target, distance, path);
            }
        }
    }

    /// Rebuilds the distance and path matrices, then accessibility and groups.
    pub(crate) fn compute_choke_point_distance_matrix(&mut self, grid: &Grid) {
        let count = self.choke_points.len();
        self.distances = vec![-1; count * count];
        self.paths = vec![Vec::new(); count * count];

        let mut scratch = SearchScratch::new();

        for index in 0..self.areas.len() {
            self.compute_area_distances(grid, AreaId::from_index(index), &mut scratch);
        }

        self.compute_linked_distances(&mut scratch);

        for index in 0..count {
            let id = ChokePointId::new(index);
            self.set_distance(id, id, 0, vec![id]);
        }

        self.update_accessible_neighbors();
        self.update_group_ids();

        debug!(
            "distances: {} choke point pairs reachable, {} groups",
            self.distances.iter().filter(|&&d| d > 0).count() / 2,
            self.areas.iter().map(|a| a.group_id()).unique().count()
        );
    }

    fn update_accessible_neighbors(&mut self) {
        let choke_points = &self.choke_points;
        for area in self.areas.iter_mut() {
            let neighbors = area
                .choke_points_by_area()
                .iter()
                .filter(|(_, list)| list.iter().any(|cp| !choke_points[cp.index()].blocked()))
                .map(|(&neighbor, _)| neighbor)
                .collect();
            area.set_accessible_neighbors(neighbors);
        }
    }

    fn update_group_ids(&mut self) {
        let mut marked = vec![false; self.areas.len()];
        let mut next_group_id: GroupId = 1;

        for start in 0..self.areas.len() {
            if marked[start] {
                continue;
            }

            marked[start] = true;
            let mut to_visit = vec![start];
            while let Some(current) = to_visit.pop() {
                self.areas[current].set_group_id(next_group_id);

                for neighbor in self.areas[current].accessible_neighbors() {
                    if !marked[neighbor.index()] {
                        marked[neighbor.index()] = true;
                        to_visit.push(neighbor.index());
                    }
                }
            }

            next_group_id += 1;
        }
    }

    /// Assigns resources to areas and gathers tile statistics.
    pub(crate) fn collect_information(&mut self, grid: &Grid, neutrals: &Neutrals) {
        for mineral in neutrals.minerals() {
            if let Some(area) = main_area(grid, mineral.top_left(), mineral.size()) {
                self.areas[area.index()].add_mineral(mineral.id());
            }
        }

        for geyser in neutrals.geysers() {
            if let Some(area) = main_area(grid, geyser.top_left(), geyser.size()) {
                self.areas[area.index()].add_geyser(geyser.id());
            }
        }

        for (t, tile) in grid.tiles() {
            if let Some(area) = AreaId::from_region_id(tile.area_id()) {
                self.areas[area.index()].add_tile_information(t, tile);
            }
        }
    }

    pub(crate) fn create_bases(&mut self, grid: &Grid, neutrals: &Neutrals, config: &AnalysisConfig) {
        let mut field = PotentialField::new(grid.size());

        for index in 0..self.areas.len() {
            let placements = locate_bases(&self.areas[index], grid, neutrals, config, &mut field);

            for placement in placements {
                let id = BaseId::new(self.bases.len());
                self.bases.push(Base::new(
                    id,
                    self.areas[index].id(),
                    placement.location,
                    config.base_footprint,
                    placement.minerals,
                    placement.geysers,
                    placement.blocking_minerals,
                ));
                self.areas[index].add_base(id);
            }
        }

        debug_assert!(field.is_clear());
        debug!("bases: {} placed", self.bases.len());
    }

    pub(crate) fn on_mineral_destroyed(&mut self, id: NeutralId) {
        for area in self.areas.iter_mut() {
            area.on_mineral_destroyed(id);
        }
        for base in self.bases.iter_mut() {
            base.on_mineral_destroyed(id);
        }
    }

    /// `replacement` is the neutral now at the bottom of the destroyed neutral's stack.
    pub(crate) fn on_blocking_neutral_destroyed(&mut self, destroyed: NeutralId, replacement: Option<NeutralId>) {
        for choke_point in self.choke_points.iter_mut() {
            choke_point.on_blocking_neutral_destroyed(destroyed, replacement);
        }
    }

    /// Choke points to cross from `a` in `area_a` to `b` in `area_b`, and the length in pixels.
    ///
    /// The length is -1 and the path empty when `b` cannot be reached.
    pub(crate) fn path(
        &self,
        a: PixelPosition,
        area_a: AreaId,
        b: PixelPosition,
        area_b: AreaId,
    ) -> (&[ChokePointId], i32) {
        if area_a == area_b {
            return (&[], a.approx_distance(b));
        }

        let first = self.area(area_a);
        let second = self.area(area_b);
        if !first.accessible_from(second) {
            return (&[], -1);
        }

        let mut best: Option<(i32, ChokePointId, ChokePointId)> = None;

        for &cp_a in first.choke_points() {
            if self.choke_point(cp_a).blocked() {
                continue;
            }
            let to_a = a.approx_distance(PixelPosition::from(self.choke_point(cp_a).center()));

            for &cp_b in second.choke_points() {
                if self.choke_point(cp_b).blocked() {
                    continue;
                }

                let between = self.distance(cp_a, cp_b);
                if between < 0 {
                    continue;
                }

                let to_b = b.approx_distance(PixelPosition::from(self.choke_point(cp_b).center()));
                let length = to_a + to_b + between;
                if best.map(|(best_length, _, _)| length < best_length).unwrap_or(true) {
                    best = Some((length, cp_a, cp_b));
                }
            }
        }

        let (mut length, cp_a, cp_b) = match best {
            Some(best) => best,
            None => return (&[], -1),
        };

        let path = self.path_between(cp_a, cp_b);

        if path.len() == 1 {
            let choke_point = self.choke_point(path[0]);
            let end1 = choke_point.pos(Node::End1).center();
            let end2 = choke_point.pos(Node::End2).center();

            if segments_intersect(a, b, end1, end2) {
                length = a.approx_distance(b);
            } else {
                for end in [end1, end2].iter() {
                    length = length.min(a.approx_distance(*end) + b.approx_distance(*end));
                }
            }
        }

        (path, length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_moves_convert_to_pixels() {
        assert_eq!(tile_distance_to_pixels(0), 0);
        assert_eq!(tile_distance_to_pixels(STRAIGHT_MOVE_COST), 32);
        assert_eq!(tile_distance_to_pixels(DIAGONAL_MOVE_COST), 45);
        assert_eq!(tile_distance_to_pixels(3 * STRAIGHT_MOVE_COST + 2 * DIAGONAL_MOVE_COST), 187);
    }

    #[test]
    fn main_area_prefers_most_frequent_then_higher_id() {
        let mut grid = Grid::new(TilePosition::new(4, 2));
        for (x, id) in [(0, 1), (1, 2), (2, 2), (3, 1)].iter() {
            let top_left = WalkPosition::from(TilePosition::new(*x, 0));
            for dy in 0..TILE_WALK_SIZE {
                for dx in 0..TILE_WALK_SIZE {
                    grid.mini_tile_mut(top_left.offset(dx, dy)).set_area_id(*id);
                }
            }
            grid.set_area_id_in_tile(TilePosition::new(*x, 0));
        }

        assert_eq!(
            main_area(&grid, TilePosition::new(0, 0), TilePosition::new(3, 1)),
            AreaId::from_region_id(2)
        );
        assert_eq!(
            main_area(&grid, TilePosition::new(2, 0), TilePosition::new(2, 1)),
            AreaId::from_region_id(2)
        );
        assert_eq!(main_area(&grid, TilePosition::new(0, 1), TilePosition::new(4, 1)), None);
    }
}
