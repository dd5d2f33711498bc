//! Partition of walkable mini tiles into areas.
//!
//! Cells are visited from the highest altitude down. A cell next to no region
//! starts one, a cell next to one region joins it, and a cell between two
//! regions either merges them or becomes a frontier point between them.

use crate::config::*;
use crate::constants::*;
use crate::grid::*;
use crate::location::*;
use fnv::FnvHashMap;
use log::*;

/// A cell where two regions met without being merged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrontierPoint {
    pub areas: (i32, i32),
    pub position: WalkPosition,
}

/// Decides which of two regions absorbs a frontier cell.
///
/// Alternates between the two on every call for the same pair, starting with the lower id.
#[derive(Clone, Debug, Default)]
pub struct TieBreaker {
    counters: FnvHashMap<(i32, i32), u32>,
}

impl TieBreaker {
    pub fn new() -> TieBreaker {
        TieBreaker::default()
    }

    pub fn choose(&mut self, a: i32, b: i32) -> i32 {
        let key = (a.min(b), a.max(b));
        let counter = self.counters.entry(key).or_insert(0);
        let chosen = if *counter % 2 == 0 { key.0 } else { key.1 };
        *counter += 1;
        chosen
    }
}

#[derive(Clone, Debug)]
struct TempArea {
    valid: bool,
    id: i32,
    top: WalkPosition,
    highest_altitude: Altitude,
    size: i32,
}

impl TempArea {
    fn new(id: i32, top: WalkPosition, altitude: Altitude) -> TempArea {
        TempArea {
            valid: true,
            id,
            top,
            highest_altitude: altitude,
            size: 1,
        }
    }
}

/// A finished area before it gets a graph entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AreaSeed {
    pub top: WalkPosition,
    pub mini_tiles: i32,
}

#[derive(Clone, Debug, Default)]
pub struct RegionOutput {
    /// Area `i + 1` is `areas[i]`.
    pub areas: Vec<AreaSeed>,
    /// Frontier points in processing order, with final area ids.
    pub frontier: Vec<FrontierPoint>,
    /// Regions created before merging and filtering.
    pub temporary_regions: usize,
}

/// Ids of the regions around `w`: the first one seen and the lowest other one.
fn find_neighboring_areas(grid: &Grid, w: WalkPosition) -> (i32, i32) {
    let mut result = (0, 0);

    for &(dx, dy) in NEIGHBORS_4.iter() {
        let next = w.offset(dx, dy);
        if !grid.valid_walk(next) {
            continue;
        }

        let id = grid.mini_tile(next).area_id();
        if id <= 0 {
            continue;
        }

        if result.0 == 0 {
            result.0 = id;
        } else if id != result.0 && (result.1 == 0 || id < result.1) {
            result.1 = id;
        }
    }

    result
}

struct RegionBuilder<'a> {
    grid: &'a mut Grid,
    config: &'a AnalysisConfig,
    starting_locations: &'a [TilePosition],
    tie_breaker: &'a mut TieBreaker,
    temp_areas: Vec<TempArea>,
    frontier: Vec<FrontierPoint>,
}

impl<'a> RegionBuilder<'a> {
    /// Relabels the 4-connected region of `from`'s id to `new_id`.
    fn replace_area_ids(&mut self, from: WalkPosition, new_id: i32) {
        let old_id = self.grid.mini_tile(from).area_id();
        debug_assert!(old_id != new_id);

        self.grid.mini_tile_mut(from).replace_area_id(new_id);

        let mut to_search = vec![from];
        while let Some(current) = to_search.pop() {
            for &(dx, dy) in NEIGHBORS_4.iter() {
                let next = current.offset(dx, dy);
                if self.grid.valid_walk(next) && self.grid.mini_tile(next).area_id() == old_id {
                    to_search.push(next);
                    self.grid.mini_tile_mut(next).replace_area_id(new_id);
                }
            }
        }

        if new_id > 0 {
            for point in self.frontier.iter_mut() {
                if point.areas.0 == old_id {
                    point.areas.0 = new_id;
                }
                if point.areas.1 == old_id {
                    point.areas.1 = new_id;
                }
            }
        }
    }

    fn should_merge(&self, cell: WalkPosition, altitude: Altitude, smaller: usize, bigger: usize) -> bool {
        let small = &self.temp_areas[smaller];
        let big = &self.temp_areas[bigger];
        let ratio = self.config.merge_altitude_ratio;

        small.size < self.config.merge_max_size
            || small.highest_altitude < self.config.merge_max_altitude
            || altitude as f64 / big.highest_altitude as f64 >= ratio
            || altitude as f64 / small.highest_altitude as f64 >= ratio
            || self.starting_locations.iter().any(|&start| {
                TilePosition::from(cell).distance(start + TilePosition::new(2, 1))
                    <= self.config.starting_location_merge_radius
            })
    }

    fn process(&mut self, cell: WalkPosition) {
        let altitude = self.grid.mini_tile(cell).altitude();
        let neighbors = find_neighboring_areas(self.grid, cell);

        if neighbors.0 == 0 {
            let id = self.temp_areas.len() as i32;
            self.temp_areas.push(TempArea::new(id, cell, altitude));
            self.grid.mini_tile_mut(cell).set_area_id(id);
            return;
        }

        if neighbors.1 == 0 {
            self.temp_areas[neighbors.0 as usize].size += 1;
            self.grid.mini_tile_mut(cell).set_area_id(neighbors.0);
            return;
        }

        let (smaller, bigger) = {
            let a = neighbors.0 as usize;
            let b = neighbors.1 as usize;
            // On equal sizes the first region seen counts as the smaller one.
            if self.temp_areas[a].size > self.temp_areas[b].size {
                (b, a)
            } else {
                (a, b)
            }
        };

        if self.should_merge(cell, altitude, smaller, bigger) {
            let bigger_id = self.temp_areas[bigger].id;
            self.temp_areas[bigger].size += 1;
            self.grid.mini_tile_mut(cell).set_area_id(bigger_id);

            let small_top = self.temp_areas[smaller].top;
            let small_size = self.temp_areas[smaller].size;
            self.replace_area_ids(small_top, bigger_id);

            self.temp_areas[bigger].size += small_size;
            self.temp_areas[smaller].valid = false;
        } else {
            let chosen = self.tie_breaker.choose(neighbors.0, neighbors.1);
            self.temp_areas[chosen as usize].size += 1;
            self.grid.mini_tile_mut(cell).set_area_id(chosen);

            self.frontier.push(FrontierPoint {
                areas: neighbors,
                position: cell,
            });
        }
    }
}

/// Assigns every walkable, unblocked mini tile to an area or to a tiny region.
///
/// Surviving areas are numbered from 1 in order of creation; discarded regions get
/// ids -2, -3 and so on. Tile aggregates are refreshed afterwards.
pub fn compute_areas(
    grid: &mut Grid,
    config: &AnalysisConfig,
    starting_locations: &[TilePosition],
    tie_breaker: &mut TieBreaker,
) -> RegionOutput {
    let mut cells: Vec<(WalkPosition, Altitude)> = grid
        .mini_tiles()
        .filter(|(_, m)| m.area_id_missing())
        .map(|(w, m)| (w, m.altitude()))
        .collect();

    // Stable, so equal altitudes keep row major order.
    cells.sort_by(|a, b| b.1.cmp(&a.1));

    let mut builder = RegionBuilder {
        grid: &mut *grid,
        config,
        starting_locations,
        tie_breaker,
        // Index 0 stands for "no region".
        temp_areas: vec![TempArea {
            valid: false,
            id: 0,
            top: WalkPosition::new(0, 0),
            highest_altitude: 0,
            size: 0,
        }],
        frontier: Vec::new(),
    };

    for &(cell, _) in cells.iter() {
        builder.process(cell);
    }

    let temporary_regions = builder.temp_areas.len() - 1;

    builder.frontier.retain(|p| p.areas.0 != p.areas.1);

    let mut areas = Vec::new();
    let mut next_area_id = 1;
    let mut next_tiny_id = FIRST_TINY_AREA_ID;

    let survivors: Vec<TempArea> = builder.temp_areas.iter().filter(|t| t.valid).cloned().collect();
    for temp in survivors {
        let new_id = if temp.size >= config.area_min_mini_tiles {
            areas.push(AreaSeed {
                top: temp.top,
                mini_tiles: temp.size,
            });
            let id = next_area_id;
            next_area_id += 1;
            id
        } else {
            let id = next_tiny_id;
            next_tiny_id -= 1;
            id
        };

        if new_id != temp.id {
            builder.replace_area_ids(temp.top, new_id);
        }
    }

    let frontier = builder.frontier;

    grid.set_area_ids_in_tiles();

    debug!(
        "regions: {} temporary, {} areas, {} frontier points",
        temporary_regions,
        areas.len(),
        frontier.len()
    );

    RegionOutput {
        areas,
        frontier,
        temporary_regions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::altitude::*;
    use crate::map_data::*;

    #[test]
    fn tie_breaker_alternates_per_pair() {
        let mut tie_breaker = TieBreaker::new();
        assert_eq!(tie_breaker.choose(5, 3), 3);
        assert_eq!(tie_breaker.choose(3, 5), 5);
        assert_eq!(tie_breaker.choose(1, 2), 1);
        assert_eq!(tie_breaker.choose(5, 3), 3);
    }

    fn analysed_grid(data: &RawMapData) -> (Grid, RegionOutput) {
        let config = AnalysisConfig::default();
        let mut grid = Grid::load(data, &config).unwrap();
        decide_seas_or_lakes(&mut grid, &config);
        compute_altitude(&mut grid);
        let output = compute_areas(&mut grid, &config, &[], &mut TieBreaker::new());
        (grid, output)
    }

    #[test]
    fn open_map_is_one_area() {
        let (grid, output) = analysed_grid(&RawMapData::new(10, 10));

        assert_eq!(output.areas.len(), 1);
        assert_eq!(output.areas[0].mini_tiles, 1600);
        assert!(output.frontier.is_empty());
        assert!(grid.mini_tiles().all(|(_, m)| m.area_id() == 1));
        assert!(grid.tiles().all(|(_, t)| t.area_id() == 1));
    }

    #[test]
    fn narrow_gap_separates_two_areas() {
        let mut data = RawMapData::new(11, 10);
        data.set_tile_rect_walkable(TilePosition::new(5, 0), TilePosition::new(1, 10), false);
        data.set_tile_rect_walkable(TilePosition::new(5, 5), TilePosition::new(1, 1), true);

        let (grid, output) = analysed_grid(&data);

        assert_eq!(output.areas.len(), 2);
        assert!(!output.frontier.is_empty());
        for point in output.frontier.iter() {
            let (a, b) = point.areas;
            assert!(a != b && a >= 1 && b >= 1 && a <= 2 && b <= 2);
            assert!(point.position.x >= 18 && point.position.x <= 25, "{}", point.position);
        }

        let left = grid.mini_tile(WalkPosition::new(5, 20)).area_id();
        let right = grid.mini_tile(WalkPosition::new(38, 20)).area_id();
        assert!(left >= 1 && right >= 1 && left != right);
    }

    /// One walkable row: `left` slope, a low cell, then `right` slope. Every other cell is unwalkable.
    fn row_with_two_slopes(left: &[Altitude], right: &[Altitude]) -> (Grid, RegionOutput) {
        let mut grid = Grid::new(TilePosition::new(6, 1));
        let walk_size = grid.walk_size();
        for y in 0..walk_size.y {
            for x in 0..walk_size.x {
                let w = WalkPosition::new(x, y);
                let altitude = match x as usize {
                    _ if y > 0 => None,
                    i if i < left.len() => Some(left[i]),
                    i if i == left.len() => Some(5),
                    i => right.get(i - left.len() - 1).copied(),
                };
                match altitude {
                    Some(altitude) => grid.mini_tile_mut(w).set_altitude(altitude),
                    None => grid.mini_tile_mut(w).set_walkable(false),
                }
            }
        }

        let config = AnalysisConfig {
            merge_max_size: 5,
            area_min_mini_tiles: 1,
            ..AnalysisConfig::default()
        };
        let output = compute_areas(&mut grid, &config, &[], &mut TieBreaker::new());
        (grid, output)
    }

    #[test]
    fn equal_sized_regions_take_the_first_seen_as_smaller() {
        let high: Vec<Altitude> = (0..10).map(|i| 200 - 10 * i).collect();
        let low: Vec<Altitude> = (0..10).map(|i| 25 + 5 * i).collect();

        // The left region is seen first at the meeting cell. Its peak is high, so no merge.
        let (grid, output) = row_with_two_slopes(&high, &low);
        assert_eq!(output.areas.len(), 2);
        assert_eq!(output.frontier.len(), 1);
        assert_eq!(output.frontier[0].position, WalkPosition::new(10, 0));
        assert_ne!(
            grid.mini_tile(WalkPosition::new(0, 0)).area_id(),
            grid.mini_tile(WalkPosition::new(20, 0)).area_id()
        );

        // Mirrored: the low left region is the smaller one and gets absorbed.
        let low_first: Vec<Altitude> = low.iter().rev().copied().collect();
        let high_last: Vec<Altitude> = high.iter().rev().copied().collect();
        let (grid, output) = row_with_two_slopes(&low_first, &high_last);
        assert_eq!(output.areas.len(), 1);
        assert_eq!(output.areas[0].mini_tiles, 21);
        assert!(output.frontier.is_empty());
        assert_eq!(grid.mini_tile(WalkPosition::new(0, 0)).area_id(), 1);
        assert_eq!(grid.mini_tile(WalkPosition::new(20, 0)).area_id(), 1);
    }

    #[test]
    fn small_pocket_gets_negative_id() {
        let mut data = RawMapData::new(10, 10);
        // A 4x4 pocket cut off by a ring wall.
        data.set_walkable_rect(WalkPosition::new(20, 20), WalkPosition::new(10, 10), false);
        data.set_walkable_rect(WalkPosition::new(23, 23), WalkPosition::new(4, 4), true);

        let (grid, output) = analysed_grid(&data);

        assert_eq!(output.areas.len(), 1);
        assert_eq!(grid.mini_tile(WalkPosition::new(24, 24)).area_id(), FIRST_TINY_AREA_ID);
        assert_eq!(grid.mini_tile(WalkPosition::new(5, 5)).area_id(), 1);
    }
}
