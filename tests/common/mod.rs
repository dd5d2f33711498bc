#![allow(dead_code)]

use rts_terrain_analysis::*;

/// Rooms of 9x10 tiles side by side, separated by one tile walls.
///
/// `gaps[i]` opens a one tile gap at tile row 5 in the wall after room `i`.
pub fn rooms_in_a_row(gaps: &[bool]) -> RawMapData {
    let rooms = gaps.len() as i32 + 1;
    let mut data = RawMapData::new(rooms * 10 - 1, 10);

    for (i, &gap) in gaps.iter().enumerate() {
        let x = 9 + 10 * i as i32;
        data.set_tile_rect_walkable(TilePosition::new(x, 0), TilePosition::new(1, 10), false);
        if gap {
            data.set_tile_rect_walkable(TilePosition::new(x, 5), TilePosition::new(1, 1), true);
        }
    }

    data
}

/// Two 10x10 tile rooms joined by a corridor two tiles high and four tiles long.
pub fn rooms_with_corridor() -> RawMapData {
    let mut data = RawMapData::new(24, 10);
    data.set_tile_rect_walkable(TilePosition::new(10, 0), TilePosition::new(4, 4), false);
    data.set_tile_rect_walkable(TilePosition::new(10, 6), TilePosition::new(4, 4), false);
    data
}

/// An open buildable field with two mineral lines and a geyser in opposite corners.
pub fn field_with_resources() -> RawMapData {
    let mut data = RawMapData::new(48, 48);
    data.set_walkable_tiles_buildable();

    for i in 0..4 {
        data.add_neutral(NeutralData::mineral(TilePosition::new(4 + 2 * i, 3), 1500));
    }
    data.add_neutral(NeutralData::geyser(TilePosition::new(3, 10), 5000));

    for i in 0..4 {
        data.add_neutral(NeutralData::mineral(TilePosition::new(34 + 2 * i, 44), 1500));
    }

    data
}

pub fn analyze(data: &RawMapData) -> Map {
    analyze_map(data).expect("map should analyse")
}

/// Every choke point pair.
pub fn choke_point_pairs(map: &Map) -> Vec<(ChokePointId, ChokePointId)> {
    let ids: Vec<ChokePointId> = map.choke_points().iter().map(|cp| cp.id()).collect();
    ids.iter()
        .flat_map(|&a| ids.iter().map(move |&b| (a, b)))
        .collect()
}
