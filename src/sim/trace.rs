//! Move traces for visual replay, and trace replay verification.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::board::expand::build_state;
use crate::board::state::{SimulationState, TileKey};
use crate::board::tile_state::Effect;
use crate::bot::selection::DecisionReason;
use crate::level::level::Level;
use crate::level::tile::{GoalKind, Pos, TileKind};
use crate::rules::apply_move::{apply_move, MoveOutcome};
use crate::rules::available_moves::{available_moves, CandidateMove};
use crate::{Result, TileLabError};

/// Everything a frontend needs to play one move back: the pick, what it
/// removed, and the post-move snapshot of every obstacle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveTrace {
    pub move_number: u32,
    pub layer: u8,
    pub pos: Pos,
    pub kind: TileKind,
    pub decision_reason: DecisionReason,
    pub linked_positions: Vec<TileKey>,
    /// Board origins of the dock entries consumed by this move.
    pub matched_positions: Vec<TileKey>,
    /// Box emissions this move, as `(target, kind)` pairs.
    pub emitted: Vec<(TileKey, TileKind)>,
    pub dock_after: Vec<TileKind>,
    pub goals_after: BTreeMap<GoalKind, u32>,
    pub frog_positions_after: Vec<TileKey>,
    pub bomb_states_after: BTreeMap<TileKey, u8>,
    pub curtain_states_after: BTreeMap<TileKey, bool>,
    pub ice_states_after: BTreeMap<TileKey, u8>,
    pub chain_states_after: BTreeMap<TileKey, bool>,
    pub grass_states_after: BTreeMap<TileKey, u8>,
    pub link_states_after: BTreeMap<TileKey, Vec<TileKey>>,
    pub teleport_click_count_after: u32,
    pub tile_type_overrides: BTreeMap<TileKey, TileKind>,
}

/// Build the trace record for a move that was just applied.
pub fn record_move(
    state: &SimulationState,
    mv: &CandidateMove,
    outcome: &MoveOutcome,
    reason: DecisionReason,
    move_number: u32,
) -> MoveTrace {
    let mut frog_positions_after = Vec::new();
    let mut bomb_states_after = BTreeMap::new();
    let mut curtain_states_after = BTreeMap::new();
    let mut ice_states_after = BTreeMap::new();
    let mut chain_states_after = BTreeMap::new();
    let mut grass_states_after = BTreeMap::new();
    let mut link_states_after = BTreeMap::new();

    for (layer_idx, layer) in state.layers.iter().enumerate() {
        for (pos, tile) in layer {
            if tile.picked {
                continue;
            }
            let key = TileKey::new(layer_idx as u8, *pos);
            if tile.frogged {
                frog_positions_after.push(key);
            }
            match tile.effect() {
                Effect::Bomb { countdown } => {
                    bomb_states_after.insert(key, countdown);
                }
                Effect::Curtain { open } => {
                    curtain_states_after.insert(key, open);
                }
                Effect::Ice { remaining } => {
                    ice_states_after.insert(key, remaining);
                }
                Effect::Chain { unlocked } => {
                    chain_states_after.insert(key, unlocked);
                }
                Effect::Grass { remaining } => {
                    grass_states_after.insert(key, remaining);
                }
                Effect::Link { partner: Some(partner), .. } => {
                    link_states_after.insert(key, vec![TileKey::new(layer_idx as u8, partner)]);
                }
                _ => {}
            }
        }
    }

    MoveTrace {
        move_number,
        layer: mv.layer,
        pos: mv.pos,
        kind: mv.kind,
        decision_reason: reason,
        linked_positions: mv.linked.clone(),
        matched_positions: outcome
            .matched
            .iter()
            .map(|entry| TileKey::new(entry.layer, entry.pos))
            .collect(),
        emitted: outcome.emitted.clone(),
        dock_after: state.dock.iter().map(|entry| entry.kind).collect(),
        goals_after: state.goals_remaining.clone(),
        frog_positions_after,
        bomb_states_after,
        curtain_states_after,
        ice_states_after,
        chain_states_after,
        grass_states_after,
        link_states_after,
        teleport_click_count_after: state.teleport_click_count,
        tile_type_overrides: state.tile_type_overrides.clone(),
    }
}

/// Re-run a recorded trace against a freshly constructed state with the same
/// seed. Every recorded pick must be legal at its turn; the returned state
/// is the final state after the last move.
pub fn replay_trace(level: &Level, state_seed: u64, trace: &[MoveTrace]) -> Result<SimulationState> {
    let mut state = build_state(level, state_seed)?;
    for record in trace {
        let mv = available_moves(&state)
            .into_iter()
            .find(|candidate| candidate.layer == record.layer && candidate.pos == record.pos)
            .ok_or_else(|| {
                TileLabError::Replay(format!(
                    "move #{} at {}_{} is not legal in the replayed state",
                    record.move_number, record.layer, record.pos
                ))
            })?;
        apply_move(&mut state, &mv)?;
    }
    Ok(state)
}
