//! The dock: a bounded queue of picked tiles with consume-on-three matching.

use crate::board::state::{DockEntry, SimulationState};
use crate::level::tile::GoalKind;

/// Insert a picked tile, keeping same-kind runs contiguous: the entry lands
/// at the end of the first run of its kind, or at the right edge when no run
/// exists. Three-in-a-row detection stays a purely local scan because of
/// this grouping.
pub fn push_to_dock(state: &mut SimulationState, entry: DockEntry) {
    let mut insert_at = state.dock.len();
    for (i, existing) in state.dock.iter().enumerate() {
        if existing.kind == entry.kind {
            let mut end = i + 1;
            while end < state.dock.len() && state.dock[end].kind == entry.kind {
                end += 1;
            }
            insert_at = end;
            break;
        }
    }
    state.dock.insert(insert_at, entry);
}

/// Consume every contiguous run of three same-kind entries, leftmost first,
/// until the dock has no run of three. Exactly three entries leave per
/// match; extras beyond three stay queued. Each match decrements the goal
/// counter of its kind when the level tracks one.
///
/// Returns the removed entries in removal order.
pub fn resolve_matches(state: &mut SimulationState) -> Vec<DockEntry> {
    let mut removed = Vec::new();
    loop {
        let Some(run_start) = leftmost_triple(&state.dock) else {
            break;
        };
        let kind = state.dock[run_start].kind;
        for _ in 0..3 {
            removed.push(state.dock.remove(run_start));
        }
        if let Some(count) = state.goals_remaining.get_mut(&GoalKind::Kind(kind)) {
            *count = count.saturating_sub(1);
        }
    }
    removed
}

fn leftmost_triple(dock: &[DockEntry]) -> Option<usize> {
    let mut i = 0;
    while i < dock.len() {
        let kind = dock[i].kind;
        let mut run = 1;
        while i + run < dock.len() && dock[i + run].kind == kind {
            run += 1;
        }
        if run >= 3 {
            return Some(i);
        }
        i += run;
    }
    None
}
