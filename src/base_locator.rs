//! Placement of bases near the resources of an area.
//!
//! Every remaining resource paints a score that decays with distance onto the
//! tiles around it, and forbids the tiles right next to it. The best scoring
//! valid footprint becomes a base, takes the resources in range, and the
//! search repeats with what is left.

use crate::area::*;
use crate::config::*;
use crate::grid::*;
use crate::location::*;
use crate::neutral::*;
use log::*;

/// Per tile scratch for base placement.
///
/// Both layers are cleared over the touched rectangles after each placement.
#[derive(Clone, Debug)]
pub struct PotentialField {
    size: TilePosition,
    scores: Vec<i32>,
    forbidden: Vec<bool>,
}

impl PotentialField {
    pub fn new(size: TilePosition) -> PotentialField {
        let count = (size.x.max(0) * size.y.max(0)) as usize;
        PotentialField {
            size,
            scores: vec![0; count],
            forbidden: vec![false; count],
        }
    }

    #[inline]
    fn index(&self, t: TilePosition) -> Option<usize> {
        if t.x >= 0 && t.y >= 0 && t.x < self.size.x && t.y < self.size.y {
            Some((t.y * self.size.x + t.x) as usize)
        } else {
            None
        }
    }

    pub fn score(&self, t: TilePosition) -> i32 {
        self.index(t).map(|i| self.scores[i]).unwrap_or(0)
    }

    pub fn forbidden(&self, t: TilePosition) -> bool {
        self.index(t).map(|i| self.forbidden[i]).unwrap_or(false)
    }

    fn add_score(&mut self, t: TilePosition, score: i32) {
        if let Some(i) = self.index(t) {
            self.scores[i] += score;
        }
    }

    fn forbid(&mut self, t: TilePosition) {
        if let Some(i) = self.index(t) {
            self.forbidden[i] = true;
        }
    }

    fn clear_rectangle(&mut self, top_left: TilePosition, bottom_right_exclusive: TilePosition) {
        for y in top_left.y..bottom_right_exclusive.y {
            for x in top_left.x..bottom_right_exclusive.x {
                if let Some(i) = self.index(TilePosition::new(x, y)) {
                    self.scores[i] = 0;
                    self.forbidden[i] = false;
                }
            }
        }
    }

    pub fn is_clear(&self) -> bool {
        self.scores.iter().all(|&s| s == 0) && self.forbidden.iter().all(|&f| !f)
    }
}

#[derive(Copy, Clone, Debug)]
struct Resource {
    id: NeutralId,
    geyser: bool,
    top_left: TilePosition,
    size: TilePosition,
    pos: PixelPosition,
}

impl Resource {
    fn new(neutral: &Neutral) -> Resource {
        Resource {
            id: neutral.id(),
            geyser: neutral.is_geyser(),
            top_left: neutral.top_left(),
            size: neutral.size(),
            pos: neutral.pos(),
        }
    }

    /// Rectangle painted with scores: the resource grown by a footprint and the search radius.
    fn paint_rectangle(&self, config: &AnalysisConfig) -> (TilePosition, TilePosition) {
        let margin = config.base_footprint + config.max_tiles_between_command_center_and_resources;
        (self.top_left - margin, self.top_left + self.size + margin)
    }

    fn exclusion_rectangle(&self, config: &AnalysisConfig) -> (TilePosition, TilePosition) {
        let radius = config.resource_exclusion_radius;
        (self.top_left - radius, self.top_left + self.size + radius)
    }
}

/// A base location chosen for an area, with the resources it takes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasePlacement {
    pub location: TilePosition,
    pub minerals: Vec<NeutralId>,
    pub geysers: Vec<NeutralId>,
    pub blocking_minerals: Vec<NeutralId>,
}

struct BaseLocator<'a> {
    area: &'a Area,
    grid: &'a Grid,
    neutrals: &'a Neutrals,
    config: &'a AnalysisConfig,
    field: &'a mut PotentialField,
}

impl<'a> BaseLocator<'a> {
    fn paint(&mut self, resources: &[Resource]) {
        let max_tiles = self.config.max_tiles_between_command_center_and_resources;
        let area_id = self.area.id().get();

        for resource in resources {
            let (top_left, bottom_right) = resource.paint_rectangle(self.config);
            for y in top_left.y..bottom_right.y {
                for x in top_left.x..bottom_right.x {
                    let t = TilePosition::new(x, y);
                    if !self.grid.valid_tile(t) || self.grid.tile(t).area_id() != area_id {
                        continue;
                    }

                    let dist = (t.center().distance_to_rectangle(resource.top_left, resource.size) + 16) / 32;
                    let mut score = (max_tiles + 3 - dist).max(0);
                    if resource.geyser {
                        score *= self.config.geyser_weight;
                    }

                    self.field.add_score(t, score);
                }
            }
        }

        for resource in resources {
            let (top_left, bottom_right) = resource.exclusion_rectangle(self.config);
            for y in top_left.y..bottom_right.y {
                for x in top_left.x..bottom_right.x {
                    self.field.forbid(TilePosition::new(x, y));
                }
            }
        }
    }

    fn clear(&mut self, resources: &[Resource]) {
        for resource in resources {
            let (top_left, bottom_right) = resource.paint_rectangle(self.config);
            self.field.clear_rectangle(top_left, bottom_right);
            let (top_left, bottom_right) = resource.exclusion_rectangle(self.config);
            self.field.clear_rectangle(top_left, bottom_right);
        }
    }

    /// Sum of the scores under a footprint at `location`, None if a depot cannot stand there.
    fn location_score(&self, location: TilePosition) -> Option<i32> {
        let footprint = self.config.base_footprint;
        let mut sum = 0;

        for dy in 0..footprint.y {
            for dx in 0..footprint.x {
                let t = location.offset(dx, dy);
                if !self.grid.valid_tile(t) {
                    return None;
                }

                let tile = self.grid.tile(t);
                if !tile.buildable() || self.field.forbidden(t) || tile.area_id() != self.area.id().get() {
                    return None;
                }

                let on_static_building = tile
                    .neutral()
                    .map(|id| self.neutrals.get(id).is_static_building())
                    .unwrap_or(false);
                if on_static_building {
                    return None;
                }

                sum += self.field.score(t);
            }
        }

        Some(sum)
    }

    /// Checks the surroundings of `location` and returns the small minerals that would have to be cleared.
    fn validate(&self, location: TilePosition, placed: &[BasePlacement]) -> Option<Vec<NeutralId>> {
        let footprint = self.config.base_footprint;
        let radius = self.config.resource_exclusion_radius;
        let mut blocking_minerals = Vec::new();

        for dy in -radius..footprint.y + radius {
            for dx in -radius..footprint.x + radius {
                let t = location.offset(dx, dy);
                if !self.grid.valid_tile(t) {
                    continue;
                }

                let neutral = match self.grid.tile(t).neutral() {
                    Some(id) => self.neutrals.get(id),
                    None => continue,
                };

                if neutral.is_geyser() {
                    return None;
                }

                if neutral.is_mineral() {
                    if neutral.initial_amount() > self.config.max_blocking_mineral_amount {
                        return None;
                    }
                    if !blocking_minerals.contains(&neutral.id()) {
                        blocking_minerals.push(neutral.id());
                    }
                }
            }
        }

        let too_close = placed
            .iter()
            .any(|base| base.location.rounded_distance(location) < self.config.min_tiles_between_bases);
        if too_close {
            return None;
        }

        Some(blocking_minerals)
    }

    fn search_box(&self, resources: &[Resource]) -> (TilePosition, TilePosition) {
        let footprint = self.config.base_footprint;
        let max_tiles = self.config.max_tiles_between_command_center_and_resources;

        let mut resources_top_left = TilePosition::new(i32::MAX, i32::MAX);
        let mut resources_bottom_right = TilePosition::new(i32::MIN, i32::MIN);
        for resource in resources {
            include_in_bounding_box(&mut resources_top_left, &mut resources_bottom_right, resource.top_left);
            include_in_bounding_box(
                &mut resources_top_left,
                &mut resources_bottom_right,
                resource.top_left + resource.size - 1,
            );
        }

        let mut top_left = resources_top_left - footprint - max_tiles;
        let mut bottom_right = resources_bottom_right + 1 + max_tiles;

        let limit_top_left = self.area.top_left();
        let limit_bottom_right = self.area.bottom_right() - footprint + 1;
        fit_to_bounding_box(&mut top_left, limit_top_left, limit_bottom_right);
        fit_to_bounding_box(&mut bottom_right, limit_top_left, limit_bottom_right);

        (top_left, bottom_right)
    }

    fn run(&mut self) -> Vec<BasePlacement> {
        let config = self.config;
        let mut remaining: Vec<Resource> = self
            .area
            .minerals()
            .iter()
            .map(|&id| self.neutrals.get(id))
            .filter(|m| m.initial_amount() >= config.min_mineral_amount && !m.blocking())
            .chain(
                self.area
                    .geysers()
                    .iter()
                    .map(|&id| self.neutrals.get(id))
                    .filter(|g| g.initial_amount() >= config.min_geyser_amount && !g.blocking()),
            )
            .map(Resource::new)
            .collect();

        let mut placed: Vec<BasePlacement> = Vec::new();

        while !remaining.is_empty() {
            let (top_left, bottom_right) = self.search_box(&remaining);

            self.paint(&remaining);

            let mut best: Option<(TilePosition, Vec<NeutralId>)> = None;
            let mut best_score = 0;

            for y in top_left.y..=bottom_right.y {
                for x in top_left.x..=bottom_right.x {
                    let location = TilePosition::new(x, y);
                    let score = match self.location_score(location) {
                        Some(score) if score > best_score => score,
                        _ => continue,
                    };

                    if let Some(blocking_minerals) = self.validate(location, &placed) {
                        best_score = score;
                        best = Some((location, blocking_minerals));
                    }
                }
            }

            self.clear(&remaining);

            let (location, blocking_minerals) = match best {
                Some(best) => best,
                None => break,
            };

            let footprint = config.base_footprint;
            let max_distance = config.max_tiles_between_command_center_and_resources * 32;
            let (assigned, rest): (Vec<Resource>, Vec<Resource>) = remaining
                .into_iter()
                .partition(|r| r.pos.distance_to_rectangle(location, footprint) + 2 <= max_distance);
            remaining = rest;

            if assigned.is_empty() {
                break;
            }

            let placement = BasePlacement {
                location,
                minerals: assigned.iter().filter(|r| !r.geyser).map(|r| r.id).collect(),
                geysers: assigned.iter().filter(|r| r.geyser).map(|r| r.id).collect(),
                blocking_minerals,
            };

            trace!(
                "area {}: base at {} scoring {} with {} minerals, {} geysers",
                self.area.id(),
                location,
                best_score,
                placement.minerals.len(),
                placement.geysers.len()
            );

            placed.push(placement);
        }

        placed
    }
}

/// Places bases in `area` until no remaining resource can be served.
///
/// `field` must be clear on entry and is left clear.
pub fn locate_bases(
    area: &Area,
    grid: &Grid,
    neutrals: &Neutrals,
    config: &AnalysisConfig,
    field: &mut PotentialField,
) -> Vec<BasePlacement> {
    BaseLocator {
        area,
        grid,
        neutrals,
        config,
        field,
    }
    .run()
}
