//! Atomic move application: pick → dock → match resolution → effect
//! propagation → box emission → termination.

use crate::board::dock::{push_to_dock, resolve_matches};
use crate::board::state::{DockEntry, FailReason, SimulationState, TileKey};
use crate::board::tile_state::Effect;
use crate::level::tile::TileKind;
use crate::rules::available_moves::CandidateMove;
use crate::rules::{effects, terminal};
use crate::{Result, TileLabError};

/// What one move did, for traces and statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    /// Board tiles removed by this move (primary pick plus companions).
    pub picked: Vec<TileKey>,
    /// Dock entries consumed by match resolution, in removal order.
    pub matched: Vec<DockEntry>,
    /// Tiles emitted by craft/stack boxes, as `(target, kind)` pairs.
    pub emitted: Vec<(TileKey, TileKind)>,
    /// A teleport shuffle fired during this move.
    pub shuffled: bool,
}

/// Apply one enumerated move. Internal errors mean the move no longer
/// matches the state (a rules bug, never a gameplay outcome) and abort the
/// episode with diagnostics.
pub fn apply_move(state: &mut SimulationState, mv: &CandidateMove) -> Result<MoveOutcome> {
    if state.is_terminal() {
        return Err(TileLabError::Invariant("move applied to a terminal state".to_string()));
    }

    // Freeze which effects react to this move: tiles uncovered by the move
    // itself must not tick, toggle or detonate until the next one.
    let exposed_bombs = effects::exposed_keys(state, &state.bomb_tiles);
    let exposed_curtains = effects::exposed_keys(state, &state.curtain_tiles);
    let clicks_before = state.teleport_click_count;

    let mut picked = Vec::with_capacity(1 + mv.linked.len());
    picked.push(mv.key());
    picked.extend(mv.linked.iter().copied());

    for key in &picked {
        let tile = state.tile_mut(*key).ok_or_else(|| {
            TileLabError::Invariant(format!("picked tile {key} vanished mid-move"))
        })?;
        if tile.picked {
            return Err(TileLabError::Invariant(format!("tile {key} picked twice")));
        }
        let kind = tile.kind().ok_or_else(|| {
            TileLabError::Invariant(format!("tile {key} is not a matchable piece"))
        })?;
        let effect = tile.effect();
        tile.picked = true;

        if matches!(effect, Effect::Teleport) {
            state.teleport_click_count += 1;
        }
        state.bomb_tiles.remove(key);
        state.curtain_tiles.remove(key);
        push_to_dock(state, DockEntry { kind, layer: key.layer, pos: key.pos });
        state.tiles_cleared += 1;
    }

    let matched = resolve_matches(state);
    if matched.len() >= 4 {
        state.combo_count += 1;
    }

    // The failing move still counts toward move statistics.
    state.moves_used += 1;

    if state.dock.len() > state.dock_capacity {
        state.mark_failed(FailReason::DockOverflow);
        return Ok(MoveOutcome { picked, matched, emitted: Vec::new(), shuffled: false });
    }

    effects::tick_bombs(state, &exposed_bombs);
    if state.failed {
        return Ok(MoveOutcome { picked, matched, emitted: Vec::new(), shuffled: false });
    }

    effects::spread_removals(state, &picked);
    effects::toggle_curtains(state, &exposed_curtains);
    if !matched.is_empty() {
        effects::step_frogs(state);
    }
    let shuffled = effects::teleport_shuffles(state, clicks_before);

    let emitted = effects::fire_boxes(state);

    terminal::evaluate(state);

    Ok(MoveOutcome { picked, matched, emitted, shuffled })
}
