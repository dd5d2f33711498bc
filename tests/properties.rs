mod common;

use common::*;
use pathfinding::prelude::bfs_reach;
use rts_terrain_analysis::*;

fn lake_map() -> RawMapData {
    let mut data = RawMapData::new(20, 20);
    data.set_tile_rect_walkable(TilePosition::new(9, 9), TilePosition::new(2, 2), false);
    data
}

/// Two 10x20 tile rooms joined through a six tile gap in the wall between them.
fn wide_gap_map() -> RawMapData {
    let mut data = RawMapData::new(21, 20);
    data.set_tile_rect_walkable(TilePosition::new(10, 0), TilePosition::new(1, 20), false);
    data.set_tile_rect_walkable(TilePosition::new(10, 7), TilePosition::new(1, 6), true);
    data
}

fn sample_maps() -> Vec<(&'static str, Map)> {
    vec![
        ("rooms", analyze(&rooms_in_a_row(&[true, true, true]))),
        ("split rooms", analyze(&rooms_in_a_row(&[true, false, true]))),
        ("corridor", analyze(&rooms_with_corridor())),
        ("resources", analyze(&field_with_resources())),
        ("lake", analyze(&lake_map())),
        ("wide gap", analyze(&wide_gap_map())),
    ]
}

#[test]
fn area_ids_follow_walkability() {
    for (name, map) in sample_maps() {
        for (w, mini_tile) in map.grid().mini_tiles() {
            assert_eq!(mini_tile.walkable(), mini_tile.area_id() != 0, "{}: {}", name, w);
            if !mini_tile.walkable() {
                assert!(mini_tile.sea() || mini_tile.lake(), "{}: {}", name, w);
            }
        }
    }
}

#[test]
fn every_mini_tile_is_counted_once() {
    for (name, map) in sample_maps() {
        let total = (map.walk_size().x * map.walk_size().y) as usize;
        let unwalkable = map.grid().mini_tiles().filter(|(_, m)| m.area_id() == 0).count();
        let negative = map.grid().mini_tiles().filter(|(_, m)| m.area_id() < 0).count();
        let in_areas: usize = map.areas().iter().map(|a| a.mini_tiles() as usize).sum();

        assert_eq!(unwalkable + negative + in_areas, total, "{}", name);

        for area in map.areas() {
            let cells = map
                .grid()
                .mini_tiles()
                .filter(|(_, m)| m.area_id() == area.id().get())
                .count();
            assert_eq!(cells, area.mini_tiles() as usize, "{}: area {}", name, area.id());
        }
    }
}

#[test]
fn areas_are_connected_to_their_top() {
    for (name, map) in sample_maps() {
        for area in map.areas() {
            let id = area.id().get();
            assert_eq!(map.mini_tile(area.top()).area_id(), id);
            assert_eq!(map.mini_tile(area.top()).altitude(), area.max_altitude());

            let reached = bfs_reach(area.top(), |&w: &WalkPosition| {
                [(0, -1), (-1, 0), (1, 0), (0, 1)]
                    .iter()
                    .map(move |&(dx, dy)| w.offset(dx, dy))
                    .filter(|&next| map.valid_walk(next) && map.mini_tile(next).area_id() == id)
                    .collect::<Vec<_>>()
            })
            .count();

            assert_eq!(reached, area.mini_tiles() as usize, "{}: area {}", name, area.id());
        }
    }
}

#[test]
fn altitudes_grow_away_from_seas() {
    let map = analyze(&lake_map());

    let lake: Vec<WalkPosition> = map
        .grid()
        .mini_tiles()
        .filter(|(_, m)| m.lake())
        .map(|(w, _)| w)
        .collect();
    assert!(!lake.is_empty());
    assert!(lake.iter().all(|&w| map.mini_tile(w).altitude() > 0));
    assert!(map.grid().mini_tiles().all(|(_, m)| m.sea() || m.altitude() > 0));

    assert_eq!(map.areas().len(), 1);
    assert!(map.max_altitude() > 0);
    assert_eq!(
        map.max_altitude(),
        map.grid().mini_tiles().map(|(_, m)| m.altitude()).max().unwrap()
    );
}

#[test]
fn choke_point_middle_is_its_highest_cell() {
    for (name, map) in sample_maps() {
        for choke_point in map.choke_points() {
            let middle = map.mini_tile(choke_point.pos(Node::Middle)).altitude();
            for &w in choke_point.geometry() {
                assert!(middle >= map.mini_tile(w).altitude(), "{}: {} above the middle of {}", name, w, choke_point.id());
            }
            assert!(choke_point.geometry().contains(&choke_point.pos(Node::Middle)));
            assert_eq!(choke_point.pos(Node::End1), choke_point.geometry()[0]);
            assert_eq!(choke_point.pos(Node::End2), *choke_point.geometry().last().unwrap());
        }
    }
}

#[test]
fn wide_gap_middle_sits_inside_the_gap() {
    let map = analyze(&wide_gap_map());
    assert_eq!(map.areas().len(), 2);
    assert_eq!(map.choke_points().len(), 1);

    let choke_point = &map.choke_points()[0];
    assert!(choke_point.geometry().len() > 4);

    let middle = choke_point.pos(Node::Middle);
    let ends = (choke_point.pos(Node::End1), choke_point.pos(Node::End2));
    assert!(map.mini_tile(middle).altitude() > map.mini_tile(ends.0).altitude());
    assert!(map.mini_tile(middle).altitude() > map.mini_tile(ends.1).altitude());
    assert!(middle.y > ends.0.y.min(ends.1.y) && middle.y < ends.0.y.max(ends.1.y));
}

#[test]
fn choke_point_distances_are_consistent() {
    let map = analyze(&rooms_in_a_row(&[true, true, true]));
    assert_eq!(map.areas().len(), 4);
    assert_eq!(map.choke_points().len(), 3);

    for (a, b) in choke_point_pairs(&map) {
        let distance = map.distance(a, b);
        assert_eq!(distance, map.distance(b, a));

        if a == b {
            assert_eq!(distance, 0);
            assert_eq!(map.path_between(a, b), &[a]);
            continue;
        }

        assert!(distance > 0, "{} to {}", a, b);
        let path = map.path_between(a, b);
        assert_eq!(path.first(), Some(&a));
        assert_eq!(path.last(), Some(&b));

        let reversed: Vec<ChokePointId> = map.path_between(b, a).iter().rev().copied().collect();
        assert_eq!(path, reversed.as_slice());

        let walked: i32 = path.windows(2).map(|step| map.distance(step[0], step[1])).sum();
        assert_eq!(walked, distance, "{} to {}", a, b);
    }

    let longest = choke_point_pairs(&map)
        .into_iter()
        .max_by_key(|&(a, b)| map.distance(a, b))
        .unwrap();
    assert_eq!(map.path_between(longest.0, longest.1).len(), 3);
}

#[test]
fn ground_paths_cross_every_room_in_between() {
    let map = analyze(&rooms_in_a_row(&[true, true, true]));
    let first = TilePosition::new(4, 5).center();
    let last = TilePosition::new(34, 5).center();

    let (path, length) = map.path(first, last);
    assert_eq!(path.len(), 3);
    assert!(length >= first.approx_distance(last) / 2);
    assert_eq!(map.ground_distance(first, last), length);
    assert_eq!(map.ground_distance(last, first), length);

    let (path, length) = map.path(first, first.offset(10, 10));
    assert!(path.is_empty());
    assert_eq!(length, first.approx_distance(first.offset(10, 10)));

    assert_eq!(map.path(first, PixelPosition::new(-5, 0)), (&[][..], -1));
}

#[test]
fn groups_match_accessibility() {
    let map = analyze(&rooms_in_a_row(&[true, false, true]));
    let areas = map.areas();
    assert_eq!(areas.len(), 4);

    let mut groups: Vec<GroupId> = areas.iter().map(|a| a.group_id()).collect();
    groups.sort_unstable();
    groups.dedup();
    assert_eq!(groups.len(), 2);

    let mut rng = fastrand::Rng::with_seed(17);
    for _ in 0..200 {
        let a = &areas[rng.usize(..areas.len())];
        let b = &areas[rng.usize(..areas.len())];
        let c = &areas[rng.usize(..areas.len())];

        assert!(a.accessible_from(a));
        assert_eq!(a.accessible_from(b), b.accessible_from(a));
        if a.accessible_from(b) && b.accessible_from(c) {
            assert!(a.accessible_from(c));
        }
        assert_eq!(a.accessible_from(b), a.group_id() == b.group_id());
    }

    let first = TilePosition::new(4, 5).center();
    let last = TilePosition::new(34, 5).center();
    assert_eq!(map.ground_distance(first, last), -1);

    for (a, b) in choke_point_pairs(&map) {
        let same_group = {
            let (area, _) = map.choke_point(a).areas();
            let (other, _) = map.choke_point(b).areas();
            map.area(area).group_id() == map.area(other).group_id()
        };
        if !same_group {
            assert_eq!(map.distance(a, b), -1);
            assert!(map.path_between(a, b).is_empty());
        }
    }
}

#[test]
fn bases_keep_apart_and_share_no_resource() {
    let map = analyze(&field_with_resources());
    let bases = map.bases();
    assert!(bases.len() >= 2);

    let mut seen: Vec<NeutralId> = Vec::new();
    for base in bases {
        assert!(base.resources().count() > 0);
        for resource in base.resources() {
            assert!(!seen.contains(&resource), "{} assigned twice", resource);
            seen.push(resource);
        }

        for dy in 0..base.footprint().y {
            for dx in 0..base.footprint().x {
                let t = base.location().offset(dx, dy);
                assert!(map.tile(t).buildable());
                assert_eq!(map.tile(t).area_id(), base.area().get());
            }
        }
    }

    for (i, a) in bases.iter().enumerate() {
        for b in bases[..i].iter().filter(|b| b.area() == a.area()) {
            assert!(a.location().rounded_distance(b.location()) >= map.config().min_tiles_between_bases);
        }
    }
}

#[test]
fn analysis_is_deterministic() {
    for data in [rooms_in_a_row(&[true, false, true]), field_with_resources(), rooms_with_corridor()].iter() {
        let first = analyze(data);
        let second = analyze(data);

        let area_ids = |map: &Map| -> Vec<i32> { map.grid().mini_tiles().map(|(_, m)| m.area_id()).collect() };
        assert_eq!(area_ids(&first), area_ids(&second));

        let areas = |map: &Map| -> Vec<(AreaId, WalkPosition, i32, GroupId)> {
            map.areas()
                .iter()
                .map(|a| (a.id(), a.top(), a.mini_tiles(), a.group_id()))
                .collect()
        };
        assert_eq!(areas(&first), areas(&second));

        let choke_points = |map: &Map| -> Vec<((AreaId, AreaId), Vec<WalkPosition>)> {
            map.choke_points()
                .iter()
                .map(|cp| (cp.areas(), cp.geometry().to_vec()))
                .collect()
        };
        assert_eq!(choke_points(&first), choke_points(&second));

        let bases = |map: &Map| -> Vec<(TilePosition, Vec<NeutralId>)> {
            map.bases().iter().map(|b| (b.location(), b.resources().collect())).collect()
        };
        assert_eq!(bases(&first), bases(&second));
    }
}
