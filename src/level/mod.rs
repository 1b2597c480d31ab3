pub mod level;
pub mod tile;

pub use level::{ExtraData, Layer, Level, TileDescriptor, DEFAULT_USE_TILE_COUNT, DOCK_CAPACITY, MAX_LAYERS};
pub use tile::{Direction, EffectTag, GoalKind, Pos, TileKind, TileToken};
