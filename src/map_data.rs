//! Raw map input consumed by the analysis.

use crate::constants::*;
use crate::location::*;
use crate::neutral::*;

/// Read access to the static description of a map.
///
/// The game adapter implements this over its own map representation;
/// [`RawMapData`] is an in-memory implementation.
pub trait MapDataSource {
    /// Map size in tiles.
    fn size(&self) -> TilePosition;

    fn is_walkable(&self, pos: WalkPosition) -> bool;

    fn is_buildable(&self, pos: TilePosition) -> bool;

    /// Height class of a tile: 0 low ground, 1 high ground, 2 very high ground.
    fn ground_height(&self, _pos: TilePosition) -> u8 {
        0
    }

    fn is_doodad(&self, _pos: TilePosition) -> bool {
        false
    }

    fn starting_locations(&self) -> &[TilePosition];

    fn neutrals(&self) -> &[NeutralData];
}

/// Static description of one neutral unit.
#[derive(Clone, Debug, PartialEq)]
pub struct NeutralData {
    pub kind: NeutralKind,
    pub top_left: TilePosition,
    pub size: TilePosition,
    /// Center of the unit in pixels.
    pub pos: PixelPosition,
}

impl NeutralData {
    pub fn new(kind: NeutralKind, top_left: TilePosition, size: TilePosition) -> NeutralData {
        let pos = top_left.to_pixel() + PixelPosition::new(size.x * TILE_PIXEL_SIZE / 2, size.y * TILE_PIXEL_SIZE / 2);

        NeutralData {
            kind,
            top_left,
            size,
            pos,
        }
    }

    pub fn mineral(top_left: TilePosition, amount: i32) -> NeutralData {
        NeutralData::new(
            NeutralKind::Mineral { initial_amount: amount },
            top_left,
            TilePosition::new(2, 1),
        )
    }

    pub fn geyser(top_left: TilePosition, amount: i32) -> NeutralData {
        NeutralData::new(
            NeutralKind::Geyser { initial_amount: amount },
            top_left,
            TilePosition::new(4, 2),
        )
    }

    pub fn static_building(top_left: TilePosition, size: TilePosition) -> NeutralData {
        NeutralData::new(NeutralKind::StaticBuilding, top_left, size)
    }
}

/// A map held entirely in memory.
///
/// Every mini tile starts walkable and every tile starts unbuildable.
#[derive(Clone, Debug)]
pub struct RawMapData {
    size: TilePosition,
    walkable: Vec<bool>,
    buildable: Vec<bool>,
    ground_height: Vec<u8>,
    doodad: Vec<bool>,
    starting_locations: Vec<TilePosition>,
    neutrals: Vec<NeutralData>,
}

impl RawMapData {
    pub fn new(width: i32, height: i32) -> RawMapData {
        let tiles = (width.max(0) * height.max(0)) as usize;
        let walk_cells = tiles * (TILE_WALK_SIZE * TILE_WALK_SIZE) as usize;

        RawMapData {
            size: TilePosition::new(width, height),
            walkable: vec![true; walk_cells],
            buildable: vec![false; tiles],
            ground_height: vec![0; tiles],
            doodad: vec![false; tiles],
            starting_locations: Vec::new(),
            neutrals: Vec::new(),
        }
    }

    fn walk_index(&self, pos: WalkPosition) -> Option<usize> {
        let width = self.size.x * TILE_WALK_SIZE;
        let height = self.size.y * TILE_WALK_SIZE;

        if pos.x >= 0 && pos.y >= 0 && pos.x < width && pos.y < height {
            Some((pos.y * width + pos.x) as usize)
        } else {
            None
        }
    }

    fn tile_index(&self, pos: TilePosition) -> Option<usize> {
        if pos.x >= 0 && pos.y >= 0 && pos.x < self.size.x && pos.y < self.size.y {
            Some((pos.y * self.size.x + pos.x) as usize)
        } else {
            None
        }
    }

    /// Positions outside the map are ignored.
    pub fn set_walkable(&mut self, pos: WalkPosition, walkable: bool) {
        if let Some(index) = self.walk_index(pos) {
            self.walkable[index] = walkable;
        }
    }

    pub fn set_walkable_rect(&mut self, top_left: WalkPosition, size: WalkPosition, walkable: bool) {
        for y in top_left.y..top_left.y + size.y {
            for x in top_left.x..top_left.x + size.x {
                self.set_walkable(WalkPosition::new(x, y), walkable);
            }
        }
    }

    /// Sets the walkability of every mini tile in a rectangle of tiles.
    pub fn set_tile_rect_walkable(&mut self, top_left: TilePosition, size: TilePosition, walkable: bool) {
        self.set_walkable_rect(
            WalkPosition::from(top_left),
            WalkPosition::new(size.x * TILE_WALK_SIZE, size.y * TILE_WALK_SIZE),
            walkable,
        );
    }

    pub fn set_buildable(&mut self, pos: TilePosition, buildable: bool) {
        if let Some(index) = self.tile_index(pos) {
            self.buildable[index] = buildable;
        }
    }

    /// Marks every tile that is entirely walkable as buildable.
    pub fn set_walkable_tiles_buildable(&mut self) {
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                let tile = TilePosition::new(x, y);
                let top_left = WalkPosition::from(tile);
                let walkable = (0..TILE_WALK_SIZE).all(|dy| {
                    (0..TILE_WALK_SIZE).all(|dx| self.is_walkable(top_left.offset(dx, dy)))
                });

                self.set_buildable(tile, walkable);
            }
        }
    }

    pub fn set_ground_height(&mut self, pos: TilePosition, height: u8) {
        if let Some(index) = self.tile_index(pos) {
            self.ground_height[index] = height;
        }
    }

    pub fn set_doodad(&mut self, pos: TilePosition, doodad: bool) {
        if let Some(index) = self.tile_index(pos) {
            self.doodad[index] = doodad;
        }
    }

    pub fn add_starting_location(&mut self, pos: TilePosition) {
        self.starting_locations.push(pos);
    }

    /// Returns the index the neutral will have in the analysed map.
    pub fn add_neutral(&mut self, neutral: NeutralData) -> usize {
        self.neutrals.push(neutral);
        self.neutrals.len() - 1
    }
}

impl MapDataSource for RawMapData {
    fn size(&self) -> TilePosition {
        self.size
    }

    fn is_walkable(&self, pos: WalkPosition) -> bool {
        self.walk_index(pos).map(|i| self.walkable[i]).unwrap_or(false)
    }

    fn is_buildable(&self, pos: TilePosition) -> bool {
        self.tile_index(pos).map(|i| self.buildable[i]).unwrap_or(false)
    }

    fn ground_height(&self, pos: TilePosition) -> u8 {
        self.tile_index(pos).map(|i| self.ground_height[i]).unwrap_or(0)
    }

    fn is_doodad(&self, pos: TilePosition) -> bool {
        self.tile_index(pos).map(|i| self.doodad[i]).unwrap_or(false)
    }

    fn starting_locations(&self) -> &[TilePosition] {
        &self.starting_locations
    }

    fn neutrals(&self) -> &[NeutralData] {
        &self.neutrals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_center_is_footprint_center() {
        let mineral = NeutralData::mineral(TilePosition::new(3, 4), 1500);
        assert_eq!(mineral.pos, PixelPosition::new(3 * 32 + 32, 4 * 32 + 16));

        let geyser = NeutralData::geyser(TilePosition::new(0, 0), 5000);
        assert_eq!(geyser.size, TilePosition::new(4, 2));
        assert_eq!(geyser.pos, PixelPosition::new(64, 32));
    }

    #[test]
    fn painting_tiles_marks_sixteen_mini_tiles() {
        let mut data = RawMapData::new(4, 4);
        data.set_tile_rect_walkable(TilePosition::new(1, 1), TilePosition::new(1, 1), false);

        let unwalkable = (0..16)
            .flat_map(|y| (0..16).map(move |x| WalkPosition::new(x, y)))
            .filter(|w| !data.is_walkable(*w))
            .count();
        assert_eq!(unwalkable, 16);
        assert!(!data.is_walkable(WalkPosition::new(4, 7)));
        assert!(data.is_walkable(WalkPosition::new(8, 7)));
        assert!(!data.is_walkable(WalkPosition::new(-1, 0)));
    }

    #[test]
    fn buildable_follows_full_walkability() {
        let mut data = RawMapData::new(3, 1);
        data.set_walkable(WalkPosition::new(5, 2), false);
        data.set_walkable_tiles_buildable();

        assert!(data.is_buildable(TilePosition::new(0, 0)));
        assert!(!data.is_buildable(TilePosition::new(1, 0)));
        assert!(data.is_buildable(TilePosition::new(2, 0)));
    }
}
