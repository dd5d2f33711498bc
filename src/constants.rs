/// Mini tiles along one side of a tile.
pub const TILE_WALK_SIZE: i32 = 4;
/// Pixels along one side of a mini tile.
pub const WALK_PIXEL_SIZE: i32 = 8;
/// Pixels along one side of a tile.
pub const TILE_PIXEL_SIZE: i32 = TILE_WALK_SIZE * WALK_PIXEL_SIZE;

/// Altitude units per mini tile of distance.
pub const ALTITUDE_SCALE: i32 = 8;

pub type Altitude = i32;

/// Altitude of a cell that has not been reached by the distance transform yet.
pub const ALTITUDE_MISSING: Altitude = -1;

/// Region id of an unwalkable mini tile.
pub const AREA_ID_UNWALKABLE: i32 = 0;
/// Region id of a walkable mini tile not yet assigned to a region.
pub const AREA_ID_MISSING: i32 = -1;
/// Region id of a walkable mini tile covered by a blocking neutral.
pub const AREA_ID_BLOCKED: i32 = i32::MIN;
/// First id handed to regions too small to become areas. Later ones count down.
pub const FIRST_TINY_AREA_ID: i32 = -2;
/// Aggregate id of a tile whose mini tiles belong to several regions.
pub const TILE_AREA_ID_MIXED: i32 = -1;

/// Dijkstra cost of an orthogonal tile move.
pub const STRAIGHT_MOVE_COST: i32 = 10_000;
/// Dijkstra cost of a diagonal tile move.
pub const DIAGONAL_MOVE_COST: i32 = 14_142;

pub const NEIGHBORS_4: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

pub const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];
