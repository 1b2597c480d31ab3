pub mod dock;
pub mod expand;
pub mod state;
pub mod tile_state;

pub use expand::build_state;
pub use state::{DockEntry, FailReason, SimulationState, StateSnapshot, TileKey};
pub use tile_state::{BoxFamily, Effect, TileBody, TileState};
