//! Termination: evaluated at every commit point of an episode.

use crate::board::state::{FailReason, SimulationState};

/// Set the terminal flags when the state warrants them. Cleared requires all
/// goal counters at zero, an empty board and an empty dock; exhaustion of
/// the move budget fails. Both flags are monotonic and mutually exclusive.
pub fn evaluate(state: &mut SimulationState) {
    if state.is_terminal() {
        return;
    }
    if !state.has_open_goals() && state.unpicked_count() == 0 && state.dock.is_empty() {
        state.mark_cleared();
        return;
    }
    if state.moves_used >= state.max_moves {
        state.mark_failed(FailReason::OutOfMoves);
    }
}
