//! Mini tile and tile storage for a whole map.

use crate::config::*;
use crate::constants::*;
use crate::error::*;
use crate::location::*;
use crate::map_data::*;
use crate::neutral::*;
use bitflags::*;
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::hash::Hash;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TileFlags: u8 {
        const NONE = 0;
        const BUILDABLE = 1;
        const DOODAD = 2;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MiniTileKind {
    /// Walkable ground.
    Terrain,
    /// Part of a large unwalkable blob. Altitude 0.
    Sea,
    /// Part of a small unwalkable blob. Unwalkable but carries an altitude like terrain.
    Lake,
}

/// An 8x8 pixel cell.
///
/// The area id is 0 for unwalkable cells, positive for cells of an area, and
/// negative for walkable cells of regions too small to become areas.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MiniTile {
    kind: MiniTileKind,
    altitude: Altitude,
    area_id: i32,
}

impl MiniTile {
    fn walkable_cell() -> MiniTile {
        MiniTile {
            kind: MiniTileKind::Terrain,
            altitude: ALTITUDE_MISSING,
            area_id: AREA_ID_MISSING,
        }
    }

    #[inline]
    pub fn walkable(&self) -> bool {
        self.area_id != AREA_ID_UNWALKABLE
    }

    #[inline]
    pub fn altitude(&self) -> Altitude {
        self.altitude
    }

    #[inline]
    pub fn kind(&self) -> MiniTileKind {
        self.kind
    }

    #[inline]
    pub fn sea(&self) -> bool {
        self.kind == MiniTileKind::Sea
    }

    #[inline]
    pub fn lake(&self) -> bool {
        self.kind == MiniTileKind::Lake
    }

    /// Walkable or lake.
    #[inline]
    pub fn terrain_or_lake(&self) -> bool {
        !self.sea()
    }

    #[inline]
    pub fn area_id(&self) -> i32 {
        self.area_id
    }

    /// Walkable, but under a neutral that separates two areas.
    #[inline]
    pub fn blocked(&self) -> bool {
        self.area_id == AREA_ID_BLOCKED
    }

    pub(crate) fn set_walkable(&mut self, walkable: bool) {
        *self = if walkable {
            MiniTile::walkable_cell()
        } else {
            MiniTile {
                kind: MiniTileKind::Sea,
                altitude: 0,
                area_id: AREA_ID_UNWALKABLE,
            }
        };
    }

    pub(crate) fn set_lake(&mut self) {
        debug_assert!(self.sea());
        self.kind = MiniTileKind::Lake;
        self.altitude = ALTITUDE_MISSING;
    }

    #[inline]
    pub(crate) fn altitude_missing(&self) -> bool {
        self.altitude == ALTITUDE_MISSING
    }

    pub(crate) fn set_altitude(&mut self, altitude: Altitude) {
        debug_assert!(self.altitude_missing() && altitude > 0);
        self.altitude = altitude;
    }

    #[inline]
    pub(crate) fn area_id_missing(&self) -> bool {
        self.area_id == AREA_ID_MISSING
    }

    pub(crate) fn set_area_id(&mut self, id: i32) {
        debug_assert!(self.area_id_missing() && id >= 1);
        self.area_id = id;
    }

    pub(crate) fn replace_area_id(&mut self, id: i32) {
        debug_assert!(self.area_id > 0 && (id >= 1 || id <= FIRST_TINY_AREA_ID) && id != self.area_id);
        self.area_id = id;
    }

    pub(crate) fn set_blocked(&mut self) {
        debug_assert!(self.area_id_missing());
        self.area_id = AREA_ID_BLOCKED;
    }

    pub(crate) fn replace_blocked_area_id(&mut self, id: i32) {
        debug_assert!(self.blocked() && id >= 1);
        self.area_id = id;
    }
}

/// A 32x32 pixel cell covering 4x4 mini tiles.
///
/// The area id is the common id of its walkable mini tiles, 0 if none is
/// walkable, or -1 if they belong to different regions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    flags: TileFlags,
    ground_height: u8,
    area_id: i32,
    min_altitude: Altitude,
    neutral: Option<NeutralId>,
}

impl Default for Tile {
    fn default() -> Self {
        Tile {
            flags: TileFlags::NONE,
            ground_height: 0,
            area_id: AREA_ID_UNWALKABLE,
            min_altitude: 0,
            neutral: None,
        }
    }
}

impl Tile {
    #[inline]
    pub fn buildable(&self) -> bool {
        self.flags.contains(TileFlags::BUILDABLE)
    }

    #[inline]
    pub fn doodad(&self) -> bool {
        self.flags.contains(TileFlags::DOODAD)
    }

    /// 0 low ground, 1 high ground, 2 very high ground.
    #[inline]
    pub fn ground_height(&self) -> u8 {
        self.ground_height
    }

    #[inline]
    pub fn area_id(&self) -> i32 {
        self.area_id
    }

    #[inline]
    pub fn walkable(&self) -> bool {
        self.area_id != AREA_ID_UNWALKABLE
    }

    #[inline]
    pub fn min_altitude(&self) -> Altitude {
        self.min_altitude
    }

    /// Bottom neutral of the stack covering this tile.
    #[inline]
    pub fn neutral(&self) -> Option<NeutralId> {
        self.neutral
    }

    pub(crate) fn set_buildable(&mut self) {
        self.flags.insert(TileFlags::BUILDABLE);
    }

    pub(crate) fn set_doodad(&mut self) {
        self.flags.insert(TileFlags::DOODAD);
    }

    pub(crate) fn set_ground_height(&mut self, height: u8) {
        debug_assert!(height <= 2);
        self.ground_height = height;
    }

    pub(crate) fn set_area_id(&mut self, id: i32) {
        debug_assert!(id == TILE_AREA_ID_MIXED || (self.area_id == AREA_ID_UNWALKABLE && id != AREA_ID_UNWALKABLE));
        self.area_id = id;
    }

    pub(crate) fn reset_area_id(&mut self) {
        self.area_id = AREA_ID_UNWALKABLE;
    }

    pub(crate) fn set_min_altitude(&mut self, altitude: Altitude) {
        debug_assert!(altitude >= 0);
        self.min_altitude = altitude;
    }

    pub(crate) fn set_neutral(&mut self, neutral: Option<NeutralId>) {
        self.neutral = neutral;
    }
}

/// A position type that addresses a cell array of [`Grid`].
pub trait GridPosition: Copy + Eq + Hash {
    type Cell;

    fn cell(self, grid: &Grid) -> &Self::Cell;

    fn is_valid(self, grid: &Grid) -> bool;

    fn neighbor(self, dx: i32, dy: i32) -> Self;
}

impl GridPosition for WalkPosition {
    type Cell = MiniTile;

    fn cell(self, grid: &Grid) -> &MiniTile {
        grid.mini_tile(self)
    }

    fn is_valid(self, grid: &Grid) -> bool {
        grid.valid_walk(self)
    }

    fn neighbor(self, dx: i32, dy: i32) -> Self {
        self.offset(dx, dy)
    }
}

impl GridPosition for TilePosition {
    type Cell = Tile;

    fn cell(self, grid: &Grid) -> &Tile {
        grid.tile(self)
    }

    fn is_valid(self, grid: &Grid) -> bool {
        grid.valid_tile(self)
    }

    fn neighbor(self, dx: i32, dy: i32) -> Self {
        self.offset(dx, dy)
    }
}

/// Tiles and mini tiles of a map, stored row by row.
#[derive(Clone, Debug)]
pub struct Grid {
    size: TilePosition,
    walk_size: WalkPosition,
    tiles: Vec<Tile>,
    mini_tiles: Vec<MiniTile>,
}

impl Grid {
    /// A map of `size` tiles with every mini tile walkable and every tile unbuildable.
    pub fn new(size: TilePosition) -> Grid {
        let size = TilePosition::new(size.x.max(0), size.y.max(0));
        let walk_size = WalkPosition::from(size);

        Grid {
            size,
            walk_size,
            tiles: vec![Tile::default(); (size.x * size.y) as usize],
            mini_tiles: vec![MiniTile::walkable_cell(); (walk_size.x * walk_size.y) as usize],
        }
    }

    /// Copies walkability, buildability and height from `source`.
    pub fn load(source: &dyn MapDataSource, config: &AnalysisConfig) -> Result<Grid, MapError> {
        let size = source.size();
        if size.x <= 0 || size.y <= 0 {
            return Err(MapError::EmptyMap(size));
        }

        let mut grid = Grid::new(size);

        for y in 0..grid.walk_size.y {
            for x in 0..grid.walk_size.x {
                let w = WalkPosition::new(x, y);
                if source.is_walkable(w) {
                    continue;
                }

                grid.mini_tile_mut(w).set_walkable(false);

                if config.dilate_unwalkable {
                    for &(dx, dy) in NEIGHBORS_8.iter() {
                        let neighbor = w.offset(dx, dy);
                        if grid.valid_walk(neighbor) {
                            grid.mini_tile_mut(neighbor).set_walkable(false);
                        }
                    }
                }
            }
        }

        for y in 0..size.y {
            for x in 0..size.x {
                let t = TilePosition::new(x, y);

                let height = source.ground_height(t);
                if height > 2 {
                    return Err(MapError::InvalidGroundHeight { tile: t, height });
                }
                grid.tile_mut(t).set_ground_height(height);

                if source.is_doodad(t) {
                    grid.tile_mut(t).set_doodad();
                }

                if source.is_buildable(t) {
                    grid.set_buildable(t);
                }
            }
        }

        Ok(grid)
    }

    /// Size in tiles.
    #[inline]
    pub fn size(&self) -> TilePosition {
        self.size
    }

    /// Size in mini tiles.
    #[inline]
    pub fn walk_size(&self) -> WalkPosition {
        self.walk_size
    }

    pub fn center(&self) -> PixelPosition {
        PixelPosition::new(self.size.x * TILE_PIXEL_SIZE / 2, self.size.y * TILE_PIXEL_SIZE / 2)
    }

    #[inline]
    pub fn valid_tile(&self, t: TilePosition) -> bool {
        t.x >= 0 && t.y >= 0 && t.x < self.size.x && t.y < self.size.y
    }

    #[inline]
    pub fn valid_walk(&self, w: WalkPosition) -> bool {
        w.x >= 0 && w.y >= 0 && w.x < self.walk_size.x && w.y < self.walk_size.y
    }

    #[inline]
    pub fn valid_pixel(&self, p: PixelPosition) -> bool {
        self.valid_walk(WalkPosition::from(p)) && p.x >= 0 && p.y >= 0
    }

    #[inline]
    pub fn tile_index(&self, t: TilePosition) -> usize {
        (t.y * self.size.x + t.x) as usize
    }

    #[inline]
    pub fn walk_index(&self, w: WalkPosition) -> usize {
        (w.y * self.walk_size.x + w.x) as usize
    }

    #[inline]
    pub fn tile_at_index(&self, index: usize) -> TilePosition {
        TilePosition::new(index as i32 % self.size.x, index as i32 / self.size.x)
    }

    /// # Panics
    ///
    /// Panics if `t` lies outside the map.
    #[inline]
    pub fn tile(&self, t: TilePosition) -> &Tile {
        assert!(self.valid_tile(t), "tile {} outside the map", t);
        &self.tiles[self.tile_index(t)]
    }

    /// # Panics
    ///
    /// Panics if `w` lies outside the map.
    #[inline]
    pub fn mini_tile(&self, w: WalkPosition) -> &MiniTile {
        assert!(self.valid_walk(w), "mini tile {} outside the map", w);
        &self.mini_tiles[self.walk_index(w)]
    }

    #[inline]
    pub(crate) fn tile_mut(&mut self, t: TilePosition) -> &mut Tile {
        let index = self.tile_index(t);
        &mut self.tiles[index]
    }

    #[inline]
    pub(crate) fn mini_tile_mut(&mut self, w: WalkPosition) -> &mut MiniTile {
        let index = self.walk_index(w);
        &mut self.mini_tiles[index]
    }

    pub fn tiles(&self) -> impl Iterator<Item = (TilePosition, &Tile)> {
        let width = self.size.x;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| (TilePosition::new(i as i32 % width, i as i32 / width), tile))
    }

    pub fn mini_tiles(&self) -> impl Iterator<Item = (WalkPosition, &MiniTile)> {
        let width = self.walk_size.x;
        self.mini_tiles
            .iter()
            .enumerate()
            .map(move |(i, mini_tile)| (WalkPosition::new(i as i32 % width, i as i32 / width), mini_tile))
    }

    /// Marks a tile buildable, which makes its 16 mini tiles walkable.
    pub(crate) fn set_buildable(&mut self, t: TilePosition) {
        self.tile_mut(t).set_buildable();

        let top_left = WalkPosition::from(t);
        for dy in 0..TILE_WALK_SIZE {
            for dx in 0..TILE_WALK_SIZE {
                self.mini_tile_mut(top_left.offset(dx, dy)).set_walkable(true);
            }
        }
    }

    /// A sea mini tile with a 4-neighbour that is not sea.
    pub fn sea_side(&self, w: WalkPosition) -> bool {
        if !self.mini_tile(w).sea() {
            return false;
        }

        NEIGHBORS_4.iter().any(|&(dx, dy)| {
            let next = w.offset(dx, dy);
            self.valid_walk(next) && !self.mini_tile(next).sea()
        })
    }

    /// Recomputes the aggregate area id of a tile from its mini tiles.
    pub(crate) fn set_area_id_in_tile(&mut self, t: TilePosition) {
        debug_assert_eq!(self.tile(t).area_id(), AREA_ID_UNWALKABLE);

        let top_left = WalkPosition::from(t);
        for dy in 0..TILE_WALK_SIZE {
            for dx in 0..TILE_WALK_SIZE {
                let id = self.mini_tile(top_left.offset(dx, dy)).area_id();
                if id == AREA_ID_UNWALKABLE {
                    continue;
                }

                let tile_id = self.tile(t).area_id();
                if tile_id == AREA_ID_UNWALKABLE {
                    self.tile_mut(t).set_area_id(id);
                } else if tile_id != id {
                    self.tile_mut(t).set_area_id(TILE_AREA_ID_MIXED);
                    return;
                }
            }
        }
    }

    pub(crate) fn set_min_altitude_in_tile(&mut self, t: TilePosition) {
        let top_left = WalkPosition::from(t);

        let mut min_altitude = Altitude::MAX;
        for dy in 0..TILE_WALK_SIZE {
            for dx in 0..TILE_WALK_SIZE {
                min_altitude = min_altitude.min(self.mini_tile(top_left.offset(dx, dy)).altitude());
            }
        }

        self.tile_mut(t).set_min_altitude(min_altitude);
    }

    pub(crate) fn set_area_ids_in_tiles(&mut self) {
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                let t = TilePosition::new(x, y);
                self.set_area_id_in_tile(t);
                self.set_min_altitude_in_tile(t);
            }
        }
    }

    /// Explores 8-connected neighbours of `start` in FIFO order and returns the first position
    /// satisfying `find`. Only positions satisfying `visit` are expanded.
    pub fn breadth_first_search<P, F, V>(&self, start: P, mut find: F, mut visit: V) -> Option<P>
    where
        P: GridPosition,
        F: FnMut(&P::Cell, P) -> bool,
        V: FnMut(&P::Cell, P) -> bool,
    {
        if find(start.cell(self), start) {
            return Some(start);
        }

        let mut visited = FnvHashSet::default();
        visited.insert(start);

        let mut to_visit = VecDeque::new();
        to_visit.push_back(start);

        while let Some(current) = to_visit.pop_front() {
            for &(dx, dy) in NEIGHBORS_8.iter() {
                let next = current.neighbor(dx, dy);
                if !next.is_valid(self) {
                    continue;
                }

                let cell = next.cell(self);
                if find(cell, next) {
                    return Some(next);
                }

                if visit(cell, next) && visited.insert(next) {
                    to_visit.push_back(next);
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dilate: bool) -> AnalysisConfig {
        AnalysisConfig {
            dilate_unwalkable: dilate,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn unwalkable_input_dilates_to_neighbours() {
        let mut data = RawMapData::new(4, 4);
        data.set_walkable(WalkPosition::new(6, 6), false);

        let grid = Grid::load(&data, &config(true)).unwrap();
        let unwalkable = grid.mini_tiles().filter(|(_, m)| !m.walkable()).count();
        assert_eq!(unwalkable, 9);
        assert!(!grid.mini_tile(WalkPosition::new(5, 7)).walkable());
        assert!(grid.mini_tile(WalkPosition::new(4, 6)).walkable());

        let grid = Grid::load(&data, &config(false)).unwrap();
        assert_eq!(grid.mini_tiles().filter(|(_, m)| !m.walkable()).count(), 1);
    }

    #[test]
    fn buildable_tile_forces_walkable_mini_tiles() {
        let mut data = RawMapData::new(4, 4);
        data.set_tile_rect_walkable(TilePosition::new(1, 1), TilePosition::new(1, 1), false);
        data.set_buildable(TilePosition::new(1, 1), true);
        data.set_ground_height(TilePosition::new(1, 1), 2);

        let grid = Grid::load(&data, &config(false)).unwrap();
        let tile = grid.tile(TilePosition::new(1, 1));
        assert!(tile.buildable());
        assert_eq!(tile.ground_height(), 2);
        assert!(grid.mini_tiles().all(|(_, m)| m.walkable()));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert_eq!(
            Grid::load(&RawMapData::new(0, 3), &config(true)).err(),
            Some(MapError::EmptyMap(TilePosition::new(0, 3)))
        );

        let mut data = RawMapData::new(2, 2);
        data.set_ground_height(TilePosition::new(1, 0), 3);
        assert!(matches!(
            Grid::load(&data, &config(true)),
            Err(MapError::InvalidGroundHeight { height: 3, .. })
        ));
    }

    #[test]
    fn sea_side_requires_a_non_sea_neighbour() {
        let mut data = RawMapData::new(2, 2);
        data.set_walkable_rect(WalkPosition::new(0, 0), WalkPosition::new(3, 3), false);

        let grid = Grid::load(&data, &config(false)).unwrap();
        assert!(!grid.sea_side(WalkPosition::new(1, 1)));
        assert!(grid.sea_side(WalkPosition::new(2, 1)));
        assert!(!grid.sea_side(WalkPosition::new(4, 4)));
    }

    #[test]
    fn tile_area_id_aggregates_mini_tiles() {
        let mut grid = Grid::new(TilePosition::new(2, 1));
        for dy in 0..4 {
            for dx in 0..4 {
                grid.mini_tile_mut(WalkPosition::new(dx, dy)).set_area_id(1);
                let id = if dx < 2 { 1 } else { 2 };
                grid.mini_tile_mut(WalkPosition::new(4 + dx, dy)).set_area_id(id);
            }
        }
        grid.mini_tile_mut(WalkPosition::new(0, 0)).set_walkable(false);

        grid.set_area_id_in_tile(TilePosition::new(0, 0));
        grid.set_area_id_in_tile(TilePosition::new(1, 0));
        assert_eq!(grid.tile(TilePosition::new(0, 0)).area_id(), 1);
        assert_eq!(grid.tile(TilePosition::new(1, 0)).area_id(), TILE_AREA_ID_MIXED);
    }

    #[test]
    fn breadth_first_search_finds_nearest_match() {
        let mut grid = Grid::new(TilePosition::new(4, 4));
        for y in 0..16 {
            grid.mini_tile_mut(WalkPosition::new(8, y)).set_walkable(false);
        }

        let found = grid.breadth_first_search(
            WalkPosition::new(2, 2),
            |_, w: WalkPosition| w.x == 12,
            |m: &MiniTile, _| m.walkable(),
        );
        assert_eq!(found, None);

        let found = grid.breadth_first_search(
            WalkPosition::new(2, 2),
            |m: &MiniTile, _| !m.walkable(),
            |m: &MiniTile, _| m.walkable(),
        );
        assert_eq!(found.map(|w| w.x), Some(8));

        let tile = grid.breadth_first_search(
            TilePosition::new(0, 0),
            |_, t: TilePosition| t == TilePosition::new(3, 3),
            |_, _| true,
        );
        assert_eq!(tile, Some(TilePosition::new(3, 3)));
    }
}
