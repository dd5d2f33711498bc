//! Distance of every cell to the nearest sea.
//!
//! Unwalkable blobs are first split into seas and lakes. Seas keep altitude 0
//! and act as the sources of the distance transform, together with the ring of
//! cells just outside the map. Lakes are filled in like walkable ground, so a
//! small pond does not split the land around it.

use crate::config::*;
use crate::constants::*;
use crate::grid::*;
use crate::location::*;
use log::*;

/// Turns every small unwalkable blob that keeps away from the map edges into a lake.
///
/// Returns the number of seas and lakes found.
pub fn decide_seas_or_lakes(grid: &mut Grid, config: &AnalysisConfig) -> (usize, usize) {
    let walk_size = grid.walk_size();
    let mut visited = vec![false; (walk_size.x * walk_size.y) as usize];
    let mut seas = 0;
    let mut lakes = 0;

    for y in 0..walk_size.y {
        for x in 0..walk_size.x {
            let origin = WalkPosition::new(x, y);
            if !grid.mini_tile(origin).sea() || visited[grid.walk_index(origin)] {
                continue;
            }

            let mut to_search = vec![origin];
            let mut extent = vec![origin];
            visited[grid.walk_index(origin)] = true;

            let mut top_left = origin;
            let mut bottom_right = origin;

            while let Some(current) = to_search.pop() {
                top_left.x = top_left.x.min(current.x);
                top_left.y = top_left.y.min(current.y);
                bottom_right.x = bottom_right.x.max(current.x);
                bottom_right.y = bottom_right.y.max(current.y);

                for &(dx, dy) in NEIGHBORS_4.iter() {
                    let next = current.offset(dx, dy);
                    if !grid.valid_walk(next) {
                        continue;
                    }

                    let index = grid.walk_index(next);
                    if visited[index] || !grid.mini_tile(next).sea() {
                        continue;
                    }

                    visited[index] = true;
                    to_search.push(next);

                    if extent.len() <= config.lake_max_mini_tiles {
                        extent.push(next);
                    }
                }
            }

            let is_lake = extent.len() <= config.lake_max_mini_tiles
                && bottom_right.x - top_left.x <= config.lake_max_width_in_mini_tiles
                && bottom_right.y - top_left.y <= config.lake_max_width_in_mini_tiles
                && top_left.x >= 2
                && top_left.y >= 2
                && bottom_right.x < walk_size.x - 2
                && bottom_right.y < walk_size.y - 2;

            if is_lake {
                for w in extent {
                    grid.mini_tile_mut(w).set_lake();
                }
                lakes += 1;
            } else {
                seas += 1;
            }
        }
    }

    (seas, lakes)
}

/// Offsets of the first octant, sorted by the altitude they stand for.
fn deltas_by_ascending_altitude(range: i32) -> Vec<(WalkPosition, Altitude)> {
    let mut deltas = Vec::new();

    for dy in 0..=range {
        for dx in dy..=range {
            if dx != 0 || dy != 0 {
                let delta = WalkPosition::new(dx, dy);
                let altitude = (0.5 + delta.distance(WalkPosition::new(0, 0)) * ALTITUDE_SCALE as f64) as Altitude;
                deltas.push((delta, altitude));
            }
        }
    }

    deltas.sort_by_key(|&(_, altitude)| altitude);
    deltas
}

struct ActiveSeaSide {
    origin: WalkPosition,
    last_altitude_generated: Altitude,
}

/// Assigns an altitude to every mini tile that is not sea and returns the highest one.
pub fn compute_altitude(grid: &mut Grid) -> Altitude {
    let walk_size = grid.walk_size();
    let range = walk_size.x.max(walk_size.y) / 2 + 3;
    let deltas = deltas_by_ascending_altitude(range);

    let mut active: Vec<ActiveSeaSide> = Vec::new();
    for y in -1..=walk_size.y {
        for x in -1..=walk_size.x {
            let w = WalkPosition::new(x, y);
            if !grid.valid_walk(w) || grid.sea_side(w) {
                active.push(ActiveSeaSide {
                    origin: w,
                    last_altitude_generated: 0,
                });
            }
        }
    }

    let source_count = active.len();
    let mut max_altitude = 0;

    for &(delta, altitude) in deltas.iter() {
        let mut i = 0;
        while i < active.len() {
            if altitude - active[i].last_altitude_generated >= 2 * ALTITUDE_SCALE {
                active.swap_remove(i);
                continue;
            }

            let origin = active[i].origin;
            let mirrored = [
                (delta.x, delta.y),
                (-delta.x, delta.y),
                (delta.x, -delta.y),
                (-delta.x, -delta.y),
                (delta.y, delta.x),
                (-delta.y, delta.x),
                (delta.y, -delta.x),
                (-delta.y, -delta.x),
            ];

            for &(dx, dy) in mirrored.iter() {
                let w = origin.offset(dx, dy);
                if grid.valid_walk(w) && grid.mini_tile(w).altitude_missing() {
                    grid.mini_tile_mut(w).set_altitude(altitude);
                    active[i].last_altitude_generated = altitude;
                    max_altitude = max_altitude.max(altitude);
                }
            }

            i += 1;
        }

        if active.is_empty() {
            break;
        }
    }

    trace!(
        "altitude: {} sources over {} offsets, max altitude {}",
        source_count,
        deltas.len(),
        max_altitude
    );

    max_altitude
}
