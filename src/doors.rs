//! Detection of neutrals that separate walkable ground.
//!
//! The ring of walkable cells around a neutral is split into doors: runs of
//! cells hugging the neutral or a lake. A neutral with at least two doors that
//! each open onto a sizeable region is blocking. The cells under it are
//! marked blocked, so region building cannot see through it.

use crate::config::*;
use crate::constants::*;
use crate::grid::*;
use crate::location::*;
use crate::neutral::*;
use fnv::FnvHashSet;
use log::*;
use pathfinding::prelude::bfs_reach;

fn adjoins_8_some_lake_or_neutral(grid: &Grid, w: WalkPosition) -> bool {
    NEIGHBORS_8.iter().any(|&(dx, dy)| {
        let next = w.offset(dx, dy);
        grid.valid_walk(next)
            && (grid.tile(TilePosition::from(next)).neutral().is_some() || grid.mini_tile(next).lake())
    })
}

fn walkable_and_free(grid: &Grid, w: WalkPosition) -> bool {
    grid.valid_walk(w) && grid.mini_tile(w).walkable() && grid.tile(TilePosition::from(w)).neutral().is_none()
}

fn walkable_and_free_neighbors(grid: &Grid, w: WalkPosition) -> impl Iterator<Item = WalkPosition> + '_ {
    NEIGHBORS_4
        .iter()
        .map(move |&(dx, dy)| w.offset(dx, dy))
        .filter(move |&next| walkable_and_free(grid, next))
}

/// Splits the walkable ring around `neutral` into doors, returning one seed cell per door.
pub(crate) fn find_doors(grid: &Grid, neutral: &Neutral) -> Vec<WalkPosition> {
    let size = WalkPosition::new(neutral.size().x * TILE_WALK_SIZE, neutral.size().y * TILE_WALK_SIZE);

    let mut border: Vec<WalkPosition> = outer_border(WalkPosition::from(neutral.top_left()), size)
        .into_iter()
        .filter(|&w| walkable_and_free(grid, w))
        .collect();

    let mut doors = Vec::new();

    while let Some(door) = border.pop() {
        doors.push(door);

        let reached: FnvHashSet<WalkPosition> = bfs_reach(door, |&current| {
            walkable_and_free_neighbors(grid, current)
                .filter(|&next| adjoins_8_some_lake_or_neutral(grid, next))
                .collect::<Vec<_>>()
        })
        .collect();

        border.retain(|w| !reached.contains(w));
    }

    doors
}

/// Whether open ground of at least `cap` cells can be reached from `door` without crossing a neutral.
pub(crate) fn leads_to_open_ground(grid: &Grid, door: WalkPosition, cap: usize) -> bool {
    bfs_reach(door, |&current| walkable_and_free_neighbors(grid, current).collect::<Vec<_>>())
        .take(cap)
        .count()
        >= cap
}

/// Marks every neutral that separates walkable ground as blocking and blocks the cells under it.
///
/// Returns the number of stacks found blocking.
pub fn process_blocking_neutrals(grid: &mut Grid, neutrals: &mut Neutrals, config: &AnalysisConfig) -> usize {
    let candidates: Vec<NeutralId> = neutrals
        .static_buildings()
        .chain(neutrals.minerals())
        .filter(|n| n.next_stacked().is_none())
        .map(|n| n.id())
        .collect();

    let mut blocking_stacks = 0;

    for id in candidates {
        let (doors, top_left, size) = {
            let candidate = neutrals.get(id);
            (find_doors(grid, candidate), candidate.top_left(), candidate.size())
        };

        if doors.len() < 2 {
            continue;
        }

        let cap = if neutrals.get(id).is_static_building() {
            config.static_building_door_cap
        } else {
            config.resource_door_cap
        };

        let true_doors: Vec<WalkPosition> = doors
            .into_iter()
            .filter(|&door| leads_to_open_ground(grid, door, cap))
            .collect();

        if true_doors.len() < 2 {
            continue;
        }

        let bottom = match grid.tile(top_left).neutral() {
            Some(bottom) => bottom,
            None => continue,
        };

        let stack: Vec<NeutralId> = neutrals.stack(bottom).collect();
        for &stacked in stack.iter() {
            neutrals.get_mut(stacked).set_blocking(true_doors.clone());
        }

        let walk_top_left = WalkPosition::from(top_left);
        for dy in 0..size.y * TILE_WALK_SIZE {
            for dx in 0..size.x * TILE_WALK_SIZE {
                let w = walk_top_left.offset(dx, dy);
                if grid.mini_tile(w).walkable() {
                    grid.mini_tile_mut(w).set_blocked();
                }
            }
        }

        trace!(
            "neutral stack {:?} at {} is blocking with doors {:?}",
            stack,
            top_left,
            true_doors
        );

        blocking_stacks += 1;
    }

    blocking_stacks
}
