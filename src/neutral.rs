//! Minerals, geysers and static buildings.
//!
//! Neutrals are put on the tiles they cover. A tile references a single
//! neutral; neutrals of the same kind placed at the same position are linked
//! into a stack through [`Neutral::next_stacked`], bottom first.

use crate::error::*;
use crate::grid::*;
use crate::location::*;
use crate::map_data::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NeutralId(usize);

impl NeutralId {
    pub(crate) fn new(index: usize) -> NeutralId {
        NeutralId(index)
    }

    /// Position of the neutral in the input list.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NeutralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeutralKind {
    Mineral { initial_amount: i32 },
    Geyser { initial_amount: i32 },
    StaticBuilding,
}

impl NeutralKind {
    pub fn name(&self) -> &'static str {
        match self {
            NeutralKind::Mineral { .. } => "mineral",
            NeutralKind::Geyser { .. } => "geyser",
            NeutralKind::StaticBuilding => "static building",
        }
    }

    fn same_kind(&self, other: &NeutralKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Clone, Debug)]
pub struct Neutral {
    id: NeutralId,
    kind: NeutralKind,
    pos: PixelPosition,
    top_left: TilePosition,
    size: TilePosition,
    next_stacked: Option<NeutralId>,
    blocking: bool,
    doors: Vec<WalkPosition>,
    removed: bool,
}

impl Neutral {
    fn new(id: NeutralId, data: &NeutralData) -> Neutral {
        Neutral {
            id,
            kind: data.kind,
            pos: data.pos,
            top_left: data.top_left,
            size: data.size,
            next_stacked: None,
            blocking: false,
            doors: Vec::new(),
            removed: false,
        }
    }

    pub fn id(&self) -> NeutralId {
        self.id
    }

    pub fn kind(&self) -> NeutralKind {
        self.kind
    }

    pub fn is_mineral(&self) -> bool {
        matches!(self.kind, NeutralKind::Mineral { .. })
    }

    pub fn is_geyser(&self) -> bool {
        matches!(self.kind, NeutralKind::Geyser { .. })
    }

    pub fn is_static_building(&self) -> bool {
        matches!(self.kind, NeutralKind::StaticBuilding)
    }

    pub fn is_resource(&self) -> bool {
        !self.is_static_building()
    }

    /// Resource amount the neutral started with, 0 for static buildings.
    pub fn initial_amount(&self) -> i32 {
        match self.kind {
            NeutralKind::Mineral { initial_amount } | NeutralKind::Geyser { initial_amount } => initial_amount,
            NeutralKind::StaticBuilding => 0,
        }
    }

    /// Center in pixels.
    pub fn pos(&self) -> PixelPosition {
        self.pos
    }

    pub fn top_left(&self) -> TilePosition {
        self.top_left
    }

    /// Footprint in tiles.
    pub fn size(&self) -> TilePosition {
        self.size
    }

    pub fn bottom_right(&self) -> TilePosition {
        self.top_left + self.size - 1
    }

    pub fn next_stacked(&self) -> Option<NeutralId> {
        self.next_stacked
    }

    /// Whether the neutral separates areas that would be connected without it.
    pub fn blocking(&self) -> bool {
        self.blocking
    }

    /// One walkable mini tile per side of the neutral leading to open ground. Empty unless blocking.
    pub fn doors(&self) -> &[WalkPosition] {
        &self.doors
    }

    /// Whether the neutral has been destroyed.
    pub fn removed(&self) -> bool {
        self.removed
    }

    pub(crate) fn set_blocking(&mut self, doors: Vec<WalkPosition>) {
        debug_assert!(!self.blocking && !self.removed);
        self.blocking = true;
        self.doors = doors;
    }
}

/// Registry of every neutral of a map, indexed by [`NeutralId`].
#[derive(Clone, Debug, Default)]
pub struct Neutrals {
    list: Vec<Neutral>,
}

impl Neutrals {
    /// Registers `data` and puts every neutral on the tiles of `grid` it covers.
    pub(crate) fn place(data: &[NeutralData], grid: &mut Grid) -> Result<Neutrals, MapError> {
        let mut neutrals = Neutrals {
            list: Vec::with_capacity(data.len()),
        };

        for (index, neutral_data) in data.iter().enumerate() {
            let in_bounds = neutral_data.size.x > 0
                && neutral_data.size.y > 0
                && grid.valid_tile(neutral_data.top_left)
                && grid.valid_tile(neutral_data.top_left + neutral_data.size - 1);

            if !in_bounds {
                return Err(MapError::NeutralOutOfBounds {
                    index,
                    top_left: neutral_data.top_left,
                    size: neutral_data.size,
                });
            }

            let id = NeutralId::new(index);
            neutrals.list.push(Neutral::new(id, neutral_data));
            neutrals.put_on_tiles(id, grid)?;
        }

        Ok(neutrals)
    }

    fn put_on_tiles(&mut self, id: NeutralId, grid: &mut Grid) -> Result<(), MapError> {
        let (kind, top_left, size) = {
            let neutral = &self.list[id.0];
            (neutral.kind, neutral.top_left, neutral.size)
        };

        for dy in 0..size.y {
            for dx in 0..size.x {
                let pos = top_left.offset(dx, dy);

                let below = match grid.tile(pos).neutral() {
                    None => {
                        grid.tile_mut(pos).set_neutral(Some(id));
                        continue;
                    }
                    Some(below) => below,
                };

                let top = self.last_stacked(below);
                let top_neutral = &self.list[top.0];

                let reason = if top_neutral.is_geyser() {
                    Some("geysers cannot be stacked on")
                } else if !top_neutral.kind.same_kind(&kind) {
                    Some("kinds differ")
                } else if top_neutral.top_left != top_left || dx != 0 || dy != 0 {
                    Some("positions differ")
                } else if top_neutral.size != size {
                    Some("sizes differ")
                } else {
                    None
                };

                if let Some(reason) = reason {
                    return Err(MapError::InvalidStacking {
                        index: id.0,
                        below: below.0,
                        top_left,
                        reason,
                    });
                }

                self.list[top.0].next_stacked = Some(id);

                return Ok(());
            }
        }

        Ok(())
    }

    /// Takes a neutral off the map. The next neutral of its stack, if any, takes its place on the tiles.
    pub(crate) fn remove_from_tiles(&mut self, id: NeutralId, grid: &mut Grid) {
        let (top_left, size, next) = {
            let neutral = &self.list[id.0];
            (neutral.top_left, neutral.size, neutral.next_stacked)
        };

        for dy in 0..size.y {
            for dx in 0..size.x {
                let pos = top_left.offset(dx, dy);

                match grid.tile(pos).neutral() {
                    Some(on_tile) if on_tile == id => {
                        grid.tile_mut(pos).set_neutral(next);
                    }
                    Some(bottom) => {
                        let mut previous = bottom;
                        while let Some(candidate) = self.list[previous.0].next_stacked {
                            if candidate == id {
                                break;
                            }
                            previous = candidate;
                        }

                        self.list[previous.0].next_stacked = next;
                        self.list[id.0].next_stacked = None;
                        self.list[id.0].removed = true;
                        return;
                    }
                    None => {}
                }
            }
        }

        self.list[id.0].next_stacked = None;
        self.list[id.0].removed = true;
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this registry.
    pub fn get(&self, id: NeutralId) -> &Neutral {
        assert!(id.0 < self.list.len(), "unknown neutral {}", id);
        &self.list[id.0]
    }

    pub fn try_get(&self, id: NeutralId) -> Option<&Neutral> {
        self.list.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: NeutralId) -> &mut Neutral {
        &mut self.list[id.0]
    }

    /// Neutrals that have not been removed, in input order.
    pub fn iter(&self) -> impl Iterator<Item = &Neutral> {
        self.list.iter().filter(|n| !n.removed)
    }

    pub fn minerals(&self) -> impl Iterator<Item = &Neutral> {
        self.iter().filter(|n| n.is_mineral())
    }

    pub fn geysers(&self) -> impl Iterator<Item = &Neutral> {
        self.iter().filter(|n| n.is_geyser())
    }

    pub fn static_buildings(&self) -> impl Iterator<Item = &Neutral> {
        self.iter().filter(|n| n.is_static_building())
    }

    /// `id` followed by every neutral stacked above it.
    pub fn stack(&self, id: NeutralId) -> impl Iterator<Item = NeutralId> + '_ {
        std::iter::successors(Some(id), move |current| self.list[current.0].next_stacked)
    }

    pub fn last_stacked(&self, id: NeutralId) -> NeutralId {
        self.stack(id).last().unwrap_or(id)
    }
}
