pub mod apply_move;
pub mod available_moves;
pub mod effects;
pub mod terminal;

pub use apply_move::{apply_move, MoveOutcome};
pub use available_moves::{available_moves, is_accessible, CandidateMove};
