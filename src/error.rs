use crate::location::*;
use crate::neutral::*;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("map size {0} has no tiles")]
    EmptyMap(TilePosition),

    #[error("starting location {0} lies outside the map")]
    StartingLocationOutOfBounds(TilePosition),

    #[error("ground height {height} of tile {tile} is not a height class (0..=2)")]
    InvalidGroundHeight { tile: TilePosition, height: u8 },

    #[error("neutral #{index} at {top_left} with size {size} does not fit on the map")]
    NeutralOutOfBounds {
        index: usize,
        top_left: TilePosition,
        size: TilePosition,
    },

    #[error("neutral #{index} at {top_left} cannot stack onto neutral #{below}: {reason}")]
    InvalidStacking {
        index: usize,
        below: usize,
        top_left: TilePosition,
        reason: &'static str,
    },

    #[error("no live neutral with id {0}")]
    UnknownNeutral(NeutralId),

    #[error("neutral {id} is not a {expected}")]
    UnexpectedNeutralKind { id: NeutralId, expected: &'static str },
}
