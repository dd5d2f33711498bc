//! Resource harvesting locations.

use crate::area::*;
use crate::constants::*;
use crate::location::*;
use crate::neutral::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaseId(usize);

impl BaseId {
    pub(crate) fn new(index: usize) -> BaseId {
        BaseId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "base{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Base {
    id: BaseId,
    area: AreaId,
    location: TilePosition,
    center: PixelPosition,
    footprint: TilePosition,
    minerals: Vec<NeutralId>,
    geysers: Vec<NeutralId>,
    blocking_minerals: Vec<NeutralId>,
    starting: bool,
}

impl Base {
    pub(crate) fn new(
        id: BaseId,
        area: AreaId,
        location: TilePosition,
        footprint: TilePosition,
        minerals: Vec<NeutralId>,
        geysers: Vec<NeutralId>,
        blocking_minerals: Vec<NeutralId>,
    ) -> Base {
        Base {
            id,
            area,
            location,
            center: footprint_center(location, footprint),
            footprint,
            minerals,
            geysers,
            blocking_minerals,
            starting: false,
        }
    }

    pub fn id(&self) -> BaseId {
        self.id
    }

    pub fn area(&self) -> AreaId {
        self.area
    }

    /// Top left tile of the depot footprint.
    pub fn location(&self) -> TilePosition {
        self.location
    }

    pub fn center(&self) -> PixelPosition {
        self.center
    }

    pub fn footprint(&self) -> TilePosition {
        self.footprint
    }

    pub fn minerals(&self) -> &[NeutralId] {
        &self.minerals
    }

    pub fn geysers(&self) -> &[NeutralId] {
        &self.geysers
    }

    /// Minerals then geysers assigned to this base.
    pub fn resources(&self) -> impl Iterator<Item = NeutralId> + '_ {
        self.minerals.iter().chain(self.geysers.iter()).copied()
    }

    /// Small minerals lying around the footprint that must be mined out before building.
    pub fn blocking_minerals(&self) -> &[NeutralId] {
        &self.blocking_minerals
    }

    pub fn starting(&self) -> bool {
        self.starting
    }

    pub(crate) fn set_starting_location(&mut self, location: TilePosition) {
        self.starting = true;
        self.location = location;
        self.center = footprint_center(location, self.footprint);
    }

    pub(crate) fn on_mineral_destroyed(&mut self, id: NeutralId) {
        self.minerals.retain(|&m| m != id);
        self.blocking_minerals.retain(|&m| m != id);
    }
}

fn footprint_center(location: TilePosition, footprint: TilePosition) -> PixelPosition {
    location.to_pixel()
        + PixelPosition::new(footprint.x * TILE_PIXEL_SIZE / 2, footprint.y * TILE_PIXEL_SIZE / 2)
}
