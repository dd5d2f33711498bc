//! Tuning knobs for the analysis pipeline.

use crate::constants::*;
use crate::location::*;
use serde::{Deserialize, Serialize};

/// Thresholds used while analysing a map.
///
/// Every field has a default, so a serialized configuration only needs to
/// name the values it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Largest unwalkable blob, in mini tiles, that may become a lake.
    pub lake_max_mini_tiles: usize,
    /// Largest bounding box side, in mini tiles, of a lake.
    pub lake_max_width_in_mini_tiles: i32,
    /// Regions smaller than this are not turned into areas.
    pub area_min_mini_tiles: i32,

    /// A region smaller than this is always merged into its neighbour.
    pub merge_max_size: i32,
    /// A region whose peak is lower than this is always merged into its neighbour.
    pub merge_max_altitude: Altitude,
    /// Regions are merged when the boundary cell reaches this fraction of either peak.
    pub merge_altitude_ratio: f64,
    /// Regions are merged around declared starting locations within this many tiles.
    pub starting_location_merge_radius: f64,

    /// Cells a door of a static building must reach to lead somewhere.
    pub static_building_door_cap: usize,
    /// Cells a door of a mineral must reach to lead somewhere.
    pub resource_door_cap: usize,

    pub max_tiles_between_command_center_and_resources: i32,
    pub min_tiles_between_bases: i32,
    pub max_tiles_between_starting_location_and_its_base: i32,
    /// Minerals below this amount are ignored by base placement.
    pub min_mineral_amount: i32,
    /// Geysers below this amount are ignored by base placement.
    pub min_geyser_amount: i32,
    /// Minerals at or below this amount inside a base's surroundings are recorded as blocking.
    pub max_blocking_mineral_amount: i32,
    pub geyser_weight: i32,
    /// Tiles around a resource on which no base may be placed.
    pub resource_exclusion_radius: i32,
    /// Size of a base building in tiles.
    pub base_footprint: TilePosition,

    /// Treat every neighbour of an unwalkable input mini tile as unwalkable.
    pub dilate_unwalkable: bool,
}

impl AnalysisConfig {
    /// Queen-wise distance under which frontier points join the same choke point.
    pub fn cluster_min_distance(&self) -> i32 {
        (self.lake_max_mini_tiles as f64).sqrt() as i32
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            lake_max_mini_tiles: 300,
            lake_max_width_in_mini_tiles: 8 * 4,
            area_min_mini_tiles: 64,
            merge_max_size: 80,
            merge_max_altitude: 80,
            merge_altitude_ratio: 0.90,
            starting_location_merge_radius: 3.0,
            static_building_door_cap: 10,
            resource_door_cap: 400,
            max_tiles_between_command_center_and_resources: 10,
            min_tiles_between_bases: 10,
            max_tiles_between_starting_location_and_its_base: 3,
            min_mineral_amount: 40,
            min_geyser_amount: 300,
            max_blocking_mineral_amount: 8,
            geyser_weight: 3,
            resource_exclusion_radius: 3,
            base_footprint: TilePosition::new(4, 3),
            dilate_unwalkable: true,
        }
    }
}
