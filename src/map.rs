//! Public API of the terrain analysis.
//!
//! The `MapBuilder` provides a fluent API for configuring the analysis. It
//! produces a `Map`, which owns the grid, the neutrals and the region graph
//! and answers position, distance and path queries.

use crate::altitude::*;
use crate::area::*;
use crate::base::*;
use crate::choke_point::*;
use crate::config::*;
use crate::constants::*;
use crate::doors::*;
use crate::error::*;
use crate::graph::*;
use crate::grid::*;
use crate::location::*;
use crate::map_data::*;
use crate::neutral::*;
use crate::regions::*;
use log::*;
use std::time::Instant;

/// Builder for configuring the analysis.
#[derive(Clone, Debug, Default)]
pub struct MapBuilder {
    config: AnalysisConfig,
    automatic_path_update: bool,
}

impl MapBuilder {
    pub fn new() -> Self {
        MapBuilder::default()
    }

    /// Replace the analysis thresholds (default: [`AnalysisConfig::default`]).
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Recompute distances and groups whenever a blocking neutral is destroyed (default: false).
    pub fn automatic_path_update(mut self, enabled: bool) -> Self {
        self.automatic_path_update = enabled;
        self
    }

    /// Run every analysis phase over `source`.
    pub fn build(self, source: &dyn MapDataSource) -> Result<Map, MapError> {
        let config = self.config;
        let started = Instant::now();

        let mut grid = Grid::load(source, &config)?;

        let starting_locations = source.starting_locations().to_vec();
        if let Some(&outside) = starting_locations.iter().find(|&&t| !grid.valid_tile(t)) {
            return Err(MapError::StartingLocationOutOfBounds(outside));
        }

        let mut neutrals = Neutrals::place(source.neutrals(), &mut grid)?;
        debug!(
            "load: {} tiles, {} neutrals, {} starting locations in {} ms",
            grid.size(),
            neutrals.len(),
            starting_locations.len(),
            started.elapsed().as_millis()
        );

        let phase = Instant::now();
        let (seas, lakes) = decide_seas_or_lakes(&mut grid, &config);
        debug!("seas and lakes: {} seas, {} lakes in {} ms", seas, lakes, phase.elapsed().as_millis());

        let phase = Instant::now();
        let max_altitude = compute_altitude(&mut grid);
        debug!("altitude: max {} in {} ms", max_altitude, phase.elapsed().as_millis());

        let phase = Instant::now();
        let blocking = process_blocking_neutrals(&mut grid, &mut neutrals, &config);
        debug!("blocking neutrals: {} stacks in {} ms", blocking, phase.elapsed().as_millis());

        let phase = Instant::now();
        let regions = compute_areas(&mut grid, &config, &starting_locations, &mut TieBreaker::new());
        debug!("areas: {} in {} ms", regions.areas.len(), phase.elapsed().as_millis());

        let phase = Instant::now();
        let mut graph = RegionGraph::new(&regions.areas, &grid);
        graph.create_choke_points(&grid, &neutrals, &regions.frontier, &config);
        debug!(
            "choke points: {} in {} ms",
            graph.choke_points().len(),
            phase.elapsed().as_millis()
        );

        let phase = Instant::now();
        graph.compute_choke_point_distance_matrix(&grid);
        debug!("distance matrix in {} ms", phase.elapsed().as_millis());

        let phase = Instant::now();
        graph.collect_information(&grid, &neutrals);
        graph.create_bases(&grid, &neutrals, &config);
        debug!("bases: {} in {} ms", graph.bases().len(), phase.elapsed().as_millis());

        debug!("analysis complete in {} ms", started.elapsed().as_millis());

        Ok(Map {
            config,
            grid,
            neutrals,
            graph,
            starting_locations,
            raw_frontier: regions.frontier,
            max_altitude,
            automatic_path_update: self.automatic_path_update,
        })
    }
}

/// Analyse `source` with the default configuration.
pub fn analyze_map(source: &dyn MapDataSource) -> Result<Map, MapError> {
    MapBuilder::default().build(source)
}

/// The analysed map.
#[derive(Clone, Debug)]
pub struct Map {
    config: AnalysisConfig,
    grid: Grid,
    neutrals: Neutrals,
    graph: RegionGraph,
    starting_locations: Vec<TilePosition>,
    raw_frontier: Vec<FrontierPoint>,
    max_altitude: Altitude,
    automatic_path_update: bool,
}

impl Map {
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn graph(&self) -> &RegionGraph {
        &self.graph
    }

    pub fn neutrals(&self) -> &Neutrals {
        &self.neutrals
    }

    /// Size in tiles.
    pub fn size(&self) -> TilePosition {
        self.grid.size()
    }

    pub fn walk_size(&self) -> WalkPosition {
        self.grid.walk_size()
    }

    pub fn center(&self) -> PixelPosition {
        self.grid.center()
    }

    pub fn valid_tile(&self, t: TilePosition) -> bool {
        self.grid.valid_tile(t)
    }

    pub fn valid_walk(&self, w: WalkPosition) -> bool {
        self.grid.valid_walk(w)
    }

    pub fn valid_pixel(&self, p: PixelPosition) -> bool {
        self.grid.valid_pixel(p)
    }

    pub fn tile(&self, t: TilePosition) -> &Tile {
        self.grid.tile(t)
    }

    pub fn mini_tile(&self, w: WalkPosition) -> &MiniTile {
        self.grid.mini_tile(w)
    }

    pub fn max_altitude(&self) -> Altitude {
        self.max_altitude
    }

    pub fn starting_locations(&self) -> &[TilePosition] {
        &self.starting_locations
    }

    /// Cells where two areas met during region building, highest altitude first.
    pub fn raw_frontier(&self) -> &[FrontierPoint] {
        &self.raw_frontier
    }

    pub fn areas(&self) -> &[Area] {
        self.graph.areas()
    }

    pub fn area(&self, id: AreaId) -> &Area {
        self.graph.area(id)
    }

    pub fn area_at_walk(&self, w: WalkPosition) -> Option<&Area> {
        AreaId::from_region_id(self.grid.mini_tile(w).area_id()).map(|id| self.graph.area(id))
    }

    pub fn area_at_tile(&self, t: TilePosition) -> Option<&Area> {
        AreaId::from_region_id(self.grid.tile(t).area_id()).map(|id| self.graph.area(id))
    }

    /// The area at `w`, or the closest one by breadth first search over mini tiles.
    pub fn nearest_area_walk(&self, w: WalkPosition) -> Option<&Area> {
        if let Some(area) = self.area_at_walk(w) {
            return Some(area);
        }

        self.grid
            .breadth_first_search(w, |mini_tile: &MiniTile, _| mini_tile.area_id() > 0, |_: &MiniTile, _| true)
            .and_then(|found| self.area_at_walk(found))
    }

    /// The area at `t`, or the closest one by breadth first search over tiles.
    pub fn nearest_area_tile(&self, t: TilePosition) -> Option<&Area> {
        if let Some(area) = self.area_at_tile(t) {
            return Some(area);
        }

        self.grid
            .breadth_first_search(t, |tile: &Tile, _| tile.area_id() > 0, |_: &Tile, _| true)
            .and_then(|found| self.area_at_tile(found))
    }

    pub fn choke_points(&self) -> &[ChokePoint] {
        self.graph.choke_points()
    }

    pub fn choke_point(&self, id: ChokePointId) -> &ChokePoint {
        self.graph.choke_point(id)
    }

    pub fn choke_points_between(&self, a: AreaId, b: AreaId) -> &[ChokePointId] {
        self.graph.choke_points_between(a, b)
    }

    /// Ground distance in pixels between two choke points, -1 if unreachable.
    pub fn distance(&self, a: ChokePointId, b: ChokePointId) -> i32 {
        self.graph.distance(a, b)
    }

    pub fn path_between(&self, a: ChokePointId, b: ChokePointId) -> &[ChokePointId] {
        self.graph.path_between(a, b)
    }

    /// Choke points to cross going from `a` to `b` on the ground, and the length of the trip in pixels.
    ///
    /// The path is empty when both positions share an area. The length is -1
    /// when `b` cannot be reached from `a`.
    pub fn path(&self, a: PixelPosition, b: PixelPosition) -> (&[ChokePointId], i32) {
        let area_a = self.nearest_area_of_pixel(a);
        let area_b = self.nearest_area_of_pixel(b);

        match (area_a, area_b) {
            (Some(area_a), Some(area_b)) => self.graph.path(a, area_a, b, area_b),
            _ => (&[], -1),
        }
    }

    pub fn ground_distance(&self, a: PixelPosition, b: PixelPosition) -> i32 {
        self.path(a, b).1
    }

    fn nearest_area_of_pixel(&self, p: PixelPosition) -> Option<AreaId> {
        if !self.grid.valid_pixel(p) {
            return None;
        }
        self.nearest_area_walk(WalkPosition::from(p)).map(|area| area.id())
    }

    pub fn bases(&self) -> &[Base] {
        self.graph.bases()
    }

    pub fn base(&self, id: BaseId) -> &Base {
        self.graph.base(id)
    }

    /// Marks as starting the first base close enough to each starting location and snaps it there.
    ///
    /// Returns false if some starting location found no base.
    pub fn find_bases_for_starting_locations(&mut self) -> bool {
        let max_distance = self.config.max_tiles_between_starting_location_and_its_base;
        let mut all_found = true;

        for &location in self.starting_locations.iter() {
            let base = self
                .graph
                .bases_mut()
                .iter_mut()
                .find(|base| base.location().queen_wise_distance(location) <= max_distance);

            match base {
                Some(base) => {
                    trace!("starting location {} matched {}", location, base.id());
                    base.set_starting_location(location);
                }
                None => {
                    debug!("starting location {} has no base", location);
                    all_found = false;
                }
            }
        }

        all_found
    }

    pub fn automatic_path_update(&self) -> bool {
        self.automatic_path_update
    }

    pub fn enable_automatic_path_update(&mut self) {
        self.automatic_path_update = true;
    }

    /// Recomputes choke point distances, accessible neighbours and groups.
    pub fn recompute_paths(&mut self) {
        self.graph.compute_choke_point_distance_matrix(&self.grid);
    }

    fn live_neutral(&self, id: NeutralId) -> Result<&Neutral, MapError> {
        self.neutrals
            .try_get(id)
            .filter(|neutral| !neutral.removed())
            .ok_or(MapError::UnknownNeutral(id))
    }

    /// Call when a mineral has been mined out.
    pub fn on_mineral_destroyed(&mut self, id: NeutralId) -> Result<(), MapError> {
        let neutral = self.live_neutral(id)?;
        if !neutral.is_mineral() {
            return Err(MapError::UnexpectedNeutralKind {
                id,
                expected: "mineral",
            });
        }
        let blocking = neutral.blocking();

        self.neutrals.remove_from_tiles(id, &mut self.grid);
        self.graph.on_mineral_destroyed(id);

        if blocking {
            self.on_blocking_neutral_destroyed(id);
        }

        Ok(())
    }

    /// Call when a static building has been destroyed.
    pub fn on_static_building_destroyed(&mut self, id: NeutralId) -> Result<(), MapError> {
        let neutral = self.live_neutral(id)?;
        if !neutral.is_static_building() {
            return Err(MapError::UnexpectedNeutralKind {
                id,
                expected: "static building",
            });
        }
        let blocking = neutral.blocking();

        self.neutrals.remove_from_tiles(id, &mut self.grid);

        if blocking {
            self.on_blocking_neutral_destroyed(id);
        }

        Ok(())
    }

    /// Unblocks the pseudo choke points of a destroyed neutral and, once no
    /// neutral remains on its footprint, hands its cells to an adjoining area.
    fn on_blocking_neutral_destroyed(&mut self, id: NeutralId) {
        let (top_left, size, doors) = {
            let neutral = self.neutrals.get(id);
            (neutral.top_left(), neutral.size(), neutral.doors().to_vec())
        };

        let replacement = self.grid.tile(top_left).neutral();
        self.graph.on_blocking_neutral_destroyed(id, replacement);

        if replacement.is_some() {
            trace!("blocking neutral {} destroyed, {:?} still blocks", id, replacement);
            return;
        }

        let new_id = doors
            .iter()
            .find_map(|&door| AreaId::from_region_id(self.grid.mini_tile(door).area_id()));

        match new_id {
            Some(new_id) => {
                let walk_top_left = WalkPosition::from(top_left);
                for dy in 0..size.y * TILE_WALK_SIZE {
                    for dx in 0..size.x * TILE_WALK_SIZE {
                        let w = walk_top_left.offset(dx, dy);
                        if self.grid.mini_tile(w).blocked() {
                            self.grid.mini_tile_mut(w).replace_blocked_area_id(new_id.get());
                        }
                    }
                }

                for dy in 0..size.y {
                    for dx in 0..size.x {
                        let t = top_left.offset(dx, dy);
                        self.grid.tile_mut(t).reset_area_id();
                        self.grid.set_area_id_in_tile(t);
                    }
                }

                trace!("blocking neutral {} destroyed, footprint joins area {}", id, new_id);
            }
            None => warn!("blocking neutral {} destroyed but none of its doors lies in an area", id),
        }

        if self.automatic_path_update {
            self.recompute_paths();
        }
    }
}
