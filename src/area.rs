//! Areas of walkable ground and their per-area statistics.

use crate::base::*;
use crate::choke_point::*;
use crate::constants::*;
use crate::grid::*;
use crate::location::*;
use crate::neutral::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Positive id of an area. Stable for the lifetime of a map.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaId(i32);

impl AreaId {
    /// Turns a positive region id into an area id.
    pub fn from_region_id(id: i32) -> Option<AreaId> {
        if id > 0 {
            Some(AreaId(id))
        } else {
            None
        }
    }

    pub(crate) fn from_index(index: usize) -> AreaId {
        AreaId(index as i32 + 1)
    }

    /// The region id stored in mini tiles and tiles.
    pub fn get(self) -> i32 {
        self.0
    }

    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id of a set of areas mutually reachable through unblocked choke points.
pub type GroupId = u32;

#[derive(Clone, Debug)]
pub struct Area {
    id: AreaId,
    group_id: GroupId,
    top: WalkPosition,
    top_left: TilePosition,
    bottom_right: TilePosition,
    max_altitude: Altitude,
    mini_tiles: i32,
    tiles: i32,
    buildable_tiles: i32,
    high_ground_tiles: i32,
    very_high_ground_tiles: i32,
    choke_points_by_area: BTreeMap<AreaId, Vec<ChokePointId>>,
    choke_points: Vec<ChokePointId>,
    accessible_neighbors: Vec<AreaId>,
    minerals: Vec<NeutralId>,
    geysers: Vec<NeutralId>,
    bases: Vec<BaseId>,
}

impl Area {
    pub(crate) fn new(id: AreaId, top: WalkPosition, max_altitude: Altitude, mini_tiles: i32) -> Area {
        Area {
            id,
            group_id: 0,
            top,
            top_left: TilePosition::new(i32::MAX, i32::MAX),
            bottom_right: TilePosition::new(i32::MIN, i32::MIN),
            max_altitude,
            mini_tiles,
            tiles: 0,
            buildable_tiles: 0,
            high_ground_tiles: 0,
            very_high_ground_tiles: 0,
            choke_points_by_area: BTreeMap::new(),
            choke_points: Vec::new(),
            accessible_neighbors: Vec::new(),
            minerals: Vec::new(),
            geysers: Vec::new(),
            bases: Vec::new(),
        }
    }

    pub fn id(&self) -> AreaId {
        self.id
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// The mini tile of highest altitude.
    pub fn top(&self) -> WalkPosition {
        self.top
    }

    /// Top left tile of the bounding box of the tiles of this area.
    pub fn top_left(&self) -> TilePosition {
        self.top_left
    }

    pub fn bottom_right(&self) -> TilePosition {
        self.bottom_right
    }

    /// Zero for an area that covers no tile.
    pub fn bounding_box_size(&self) -> TilePosition {
        if self.tiles == 0 {
            return TilePosition::new(0, 0);
        }
        self.bottom_right - self.top_left + 1
    }

    pub fn max_altitude(&self) -> Altitude {
        self.max_altitude
    }

    pub fn mini_tiles(&self) -> i32 {
        self.mini_tiles
    }

    /// Tiles whose mini tiles all belong to this area.
    pub fn tiles(&self) -> i32 {
        self.tiles
    }

    pub fn buildable_tiles(&self) -> i32 {
        self.buildable_tiles
    }

    pub fn high_ground_tiles(&self) -> i32 {
        self.high_ground_tiles
    }

    pub fn very_high_ground_tiles(&self) -> i32 {
        self.very_high_ground_tiles
    }

    pub fn low_ground_percentage(&self) -> i32 {
        self.percentage_of_tiles(self.tiles - self.high_ground_tiles - self.very_high_ground_tiles)
    }

    pub fn high_ground_percentage(&self) -> i32 {
        self.percentage_of_tiles(self.high_ground_tiles)
    }

    pub fn very_high_ground_percentage(&self) -> i32 {
        self.percentage_of_tiles(self.very_high_ground_tiles)
    }

    fn percentage_of_tiles(&self, count: i32) -> i32 {
        if self.tiles == 0 {
            0
        } else {
            count * 100 / self.tiles
        }
    }

    /// Choke points to each neighbouring area, by ascending neighbour id.
    pub fn choke_points_by_area(&self) -> &BTreeMap<AreaId, Vec<ChokePointId>> {
        &self.choke_points_by_area
    }

    /// Choke points to `neighbor`, empty if the areas do not touch.
    pub fn choke_points_to(&self, neighbor: AreaId) -> &[ChokePointId] {
        self.choke_points_by_area
            .get(&neighbor)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn choke_points(&self) -> &[ChokePointId] {
        &self.choke_points
    }

    /// Neighbours sharing at least one unblocked choke point.
    pub fn accessible_neighbors(&self) -> &[AreaId] {
        &self.accessible_neighbors
    }

    pub fn accessible_from(&self, other: &Area) -> bool {
        self.group_id == other.group_id
    }

    pub fn minerals(&self) -> &[NeutralId] {
        &self.minerals
    }

    pub fn geysers(&self) -> &[NeutralId] {
        &self.geysers
    }

    pub fn bases(&self) -> &[BaseId] {
        &self.bases
    }

    pub(crate) fn add_choke_points(&mut self, neighbor: AreaId, choke_points: &[ChokePointId]) {
        debug_assert!(!self.choke_points_by_area.contains_key(&neighbor));
        self.choke_points_by_area.insert(neighbor, choke_points.to_vec());
        self.choke_points.extend_from_slice(choke_points);
    }

    pub(crate) fn set_accessible_neighbors(&mut self, neighbors: Vec<AreaId>) {
        self.accessible_neighbors = neighbors;
    }

    pub(crate) fn set_group_id(&mut self, group_id: GroupId) {
        self.group_id = group_id;
    }

    pub(crate) fn add_tile_information(&mut self, t: TilePosition, tile: &Tile) {
        self.tiles += 1;
        if tile.buildable() {
            self.buildable_tiles += 1;
        }
        match tile.ground_height() {
            1 => self.high_ground_tiles += 1,
            2 => self.very_high_ground_tiles += 1,
            _ => {}
        }

        include_in_bounding_box(&mut self.top_left, &mut self.bottom_right, t);
    }

    pub(crate) fn add_mineral(&mut self, id: NeutralId) {
        debug_assert!(!self.minerals.contains(&id));
        self.minerals.push(id);
    }

    pub(crate) fn add_geyser(&mut self, id: NeutralId) {
        debug_assert!(!self.geysers.contains(&id));
        self.geysers.push(id);
    }

    pub(crate) fn add_base(&mut self, id: BaseId) {
        self.bases.push(id);
    }

    pub(crate) fn on_mineral_destroyed(&mut self, id: NeutralId) {
        self.minerals.retain(|&m| m != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_information_accumulates() {
        let mut area = Area::new(AreaId::from_index(0), WalkPosition::new(4, 4), 40, 64);

        let mut low = Tile::default();
        low.set_buildable();
        let mut high = Tile::default();
        high.set_ground_height(1);

        area.add_tile_information(TilePosition::new(3, 2), &low);
        area.add_tile_information(TilePosition::new(5, 7), &high);
        area.add_tile_information(TilePosition::new(4, 4), &low);
        area.add_tile_information(TilePosition::new(6, 3), &low);

        assert_eq!(area.tiles(), 4);
        assert_eq!(area.buildable_tiles(), 3);
        assert_eq!(area.top_left(), TilePosition::new(3, 2));
        assert_eq!(area.bottom_right(), TilePosition::new(6, 7));
        assert_eq!(area.bounding_box_size(), TilePosition::new(4, 6));
        assert_eq!(area.low_ground_percentage(), 75);
        assert_eq!(area.high_ground_percentage(), 25);
        assert_eq!(area.very_high_ground_percentage(), 0);
    }

    #[test]
    fn area_without_tiles_has_an_empty_bounding_box() {
        let area = Area::new(AreaId::from_index(3), WalkPosition::new(9, 9), 8, 2);
        assert_eq!(area.tiles(), 0);
        assert_eq!(area.bounding_box_size(), TilePosition::new(0, 0));
        assert_eq!(area.low_ground_percentage(), 0);

        let mut area = area;
        area.add_tile_information(TilePosition::new(2, 7), &Tile::default());
        assert_eq!(area.bounding_box_size(), TilePosition::new(1, 1));
    }

    #[test]
    fn region_ids_map_to_area_ids() {
        assert_eq!(AreaId::from_region_id(3).map(AreaId::index), Some(2));
        assert_eq!(AreaId::from_region_id(0), None);
        assert_eq!(AreaId::from_region_id(-2), None);
        assert_eq!(AreaId::from_index(0).get(), 1);
    }

    #[test]
    fn choke_points_are_listed_by_neighbor() {
        let mut area = Area::new(AreaId::from_index(1), WalkPosition::new(0, 0), 8, 100);
        area.add_choke_points(AreaId::from_index(0), &[ChokePointId::new(0), ChokePointId::new(2)]);
        area.add_choke_points(AreaId::from_index(2), &[ChokePointId::new(1)]);

        assert_eq!(area.choke_points().len(), 3);
        assert_eq!(area.choke_points_to(AreaId::from_index(2)), &[ChokePointId::new(1)]);
        assert!(area.choke_points_to(AreaId::from_index(5)).is_empty());
    }
}
