pub mod altitude;
pub mod area;
pub mod base;
pub mod base_locator;
pub mod choke_point;
pub mod config;
pub mod constants;
pub mod doors;
pub mod error;
pub mod graph;
pub mod grid;
pub mod location;
pub mod map;
pub mod map_data;
pub mod neutral;
pub mod regions;
pub mod search;
pub mod visual;

pub use area::{Area, AreaId, GroupId};
pub use base::{Base, BaseId};
pub use choke_point::{ChokePoint, ChokePointId, Node};
pub use config::AnalysisConfig;
pub use error::MapError;
pub use grid::{MiniTile, MiniTileKind, Tile};
pub use location::{PixelPosition, TilePosition, WalkPosition};
pub use map::*;
pub use map_data::{MapDataSource, NeutralData, RawMapData};
pub use neutral::{Neutral, NeutralId, NeutralKind};
pub use visual::*;
