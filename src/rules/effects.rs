//! Obstacle effect propagation: bombs, ice, grass, chains, curtains, frogs,
//! teleport shuffles and craft/stack box emission.
//!
//! Callers snapshot which bombs and curtains are exposed *before* applying a
//! move; only those react to the move, never tiles it just uncovered.

use rand::seq::SliceRandom;
use std::collections::BTreeSet;

use crate::board::state::{FailReason, SimulationState, TileKey};
use crate::board::tile_state::{BoxFamily, Effect, TileBody, TileState};
use crate::level::tile::{Direction, GoalKind, TileKind};
use crate::rules::available_moves::{is_accessible, is_pickable};

/// Every N-th teleport click triggers a board shuffle.
pub const TELEPORT_SHUFFLE_INTERVAL: u32 = 3;

/// Exposed members of a tracked-tile index: unpicked and accessible.
pub fn exposed_keys(state: &SimulationState, index: &BTreeSet<TileKey>) -> BTreeSet<TileKey> {
    index
        .iter()
        .copied()
        .filter(|key| is_accessible(state, *key))
        .collect()
}

/// Tick every pre-snapshotted bomb that is still on the board and exposed.
/// A countdown reaching zero fails the episode.
pub fn tick_bombs(state: &mut SimulationState, exposed_before: &BTreeSet<TileKey>) {
    for key in exposed_before {
        if !state.bomb_tiles.contains(key) || !is_accessible(state, *key) {
            continue;
        }
        let Some(tile) = state.tile_mut(*key) else {
            continue;
        };
        if let Effect::Bomb { countdown } = tile.effect() {
            let next = countdown.saturating_sub(1);
            tile.set_effect(Effect::Bomb { countdown: next });
            if next == 0 {
                state.mark_failed(FailReason::BombDetonated);
                return;
            }
        }
    }
}

/// Ice, grass and chain react to board removals: each 4-connected neighbor
/// of a tile removed this turn loses one ice/grass layer or unlocks its
/// chain. Ice and grass become plain matchables at zero.
pub fn spread_removals(state: &mut SimulationState, removed: &[TileKey]) {
    for key in removed {
        for dir in Direction::CARDINAL {
            let Some(neighbor_pos) = key.pos.step(dir) else {
                continue;
            };
            let neighbor = TileKey::new(key.layer, neighbor_pos);
            let Some(tile) = state.tile_mut(neighbor) else {
                continue;
            };
            if tile.picked {
                continue;
            }
            match tile.effect() {
                Effect::Ice { remaining } => {
                    let next = remaining.saturating_sub(1);
                    tile.set_effect(if next == 0 {
                        Effect::None
                    } else {
                        Effect::Ice { remaining: next }
                    });
                }
                Effect::Grass { remaining } => {
                    let next = remaining.saturating_sub(1);
                    tile.set_effect(if next == 0 {
                        Effect::None
                    } else {
                        Effect::Grass { remaining: next }
                    });
                }
                Effect::Chain { unlocked: false } => {
                    tile.set_effect(Effect::Chain { unlocked: true });
                }
                _ => {}
            }
        }
    }
}

/// Toggle every pre-snapshotted curtain that survived the move.
pub fn toggle_curtains(state: &mut SimulationState, exposed_before: &BTreeSet<TileKey>) {
    for key in exposed_before {
        if !state.curtain_tiles.contains(key) {
            continue;
        }
        let Some(tile) = state.tile_mut(*key) else {
            continue;
        };
        if tile.picked {
            continue;
        }
        if let Effect::Curtain { open } = tile.effect() {
            tile.set_effect(Effect::Curtain { open: !open });
        }
    }
}

/// Move each frog one step after a move that resolved a match: the first
/// accessible, unoccupied 4-neighbor in canonical order, or stay put. The
/// vacated tile becomes pickable again; the destination is frog-blocked.
pub fn step_frogs(state: &mut SimulationState) {
    let frogs: Vec<TileKey> = state.frog_tiles.iter().copied().collect();
    for frog in frogs {
        let mut destinations: Vec<TileKey> = Vec::new();
        for dir in Direction::CARDINAL {
            let Some(next_pos) = frog.pos.step(dir) else {
                continue;
            };
            let next = TileKey::new(frog.layer, next_pos);
            let candidate_ok = state
                .tile(next)
                .is_some_and(|tile| !tile.picked && !tile.frogged && !tile.is_box());
            if candidate_ok && is_accessible(state, next) {
                destinations.push(next);
            }
        }
        let Some(destination) = destinations.into_iter().min() else {
            continue;
        };
        if let Some(tile) = state.tile_mut(frog) {
            tile.frogged = false;
        }
        if let Some(tile) = state.tile_mut(destination) {
            tile.frogged = true;
        }
        state.frog_tiles.remove(&frog);
        state.frog_tiles.insert(destination);
    }
}

/// Run the teleport shuffle for every click that landed on a multiple of
/// [`TELEPORT_SHUFFLE_INTERVAL`] during this move. Returns whether any
/// shuffle happened.
pub fn teleport_shuffles(state: &mut SimulationState, clicks_before: u32) -> bool {
    let mut shuffled = false;
    for click in clicks_before + 1..=state.teleport_click_count {
        if click % TELEPORT_SHUFFLE_INTERVAL == 0 {
            shuffle_board(state);
            shuffled = true;
        }
    }
    shuffled
}

/// Permute the kinds of all currently accessible non-obstacle tiles with the
/// rules RNG, recording the permanent rewrites in `tile_type_overrides`.
fn shuffle_board(state: &mut SimulationState) {
    let mut keys: Vec<TileKey> = Vec::new();
    for (layer_idx, layer) in state.layers.iter().enumerate() {
        for (pos, tile) in layer {
            let key = TileKey::new(layer_idx as u8, *pos);
            if is_pickable(tile) && is_accessible(state, key) {
                keys.push(key);
            }
        }
    }
    let mut kinds: Vec<TileKind> = keys
        .iter()
        .filter_map(|key| state.tile(*key).and_then(TileState::kind))
        .collect();
    kinds.shuffle(&mut state.rng);

    for (key, kind) in keys.iter().zip(kinds) {
        if let Some(tile) = state.tile_mut(*key) {
            tile.set_kind(kind);
        }
        state.tile_type_overrides.insert(*key, kind);
    }
}

/// Fire craft/stack boxes whose target cell is empty, repeating until a full
/// pass fires nothing. Each firing pops the interior top onto the target
/// cell as a fresh matchable and decrements the box goal; a box with an
/// exhausted interior leaves the board.
///
/// Returns the emissions as `(target, kind)` pairs.
pub fn fire_boxes(state: &mut SimulationState) -> Vec<(TileKey, TileKind)> {
    let mut emitted = Vec::new();
    loop {
        let mut fired = false;
        let boxes: Vec<TileKey> = state.craft_boxes.iter().copied().collect();
        for key in boxes {
            let Some((family, dir)) = box_family_dir(state, key) else {
                continue;
            };
            let Some(target_pos) = key.pos.step(dir) else {
                continue;
            };
            let (cols, rows) = state.layer_extents[key.layer as usize];
            if target_pos.x >= cols || target_pos.y >= rows {
                continue;
            }
            let target = TileKey::new(key.layer, target_pos);
            let occupied = state.tile(target).is_some_and(|tile| !tile.picked);
            if occupied {
                continue;
            }

            let Some(kind) = pop_interior(state, key) else {
                continue;
            };
            state.layers[key.layer as usize].insert(target_pos, TileState::piece(kind, Effect::None));
            state.tiles_emitted += 1;
            fired = true;
            emitted.push((target, kind));

            let goal = match family {
                BoxFamily::Craft => GoalKind::Craft(dir),
                BoxFamily::Stack => GoalKind::Stack(dir),
            };
            if let Some(count) = state.goals_remaining.get_mut(&goal) {
                *count = count.saturating_sub(1);
            }

            let exhausted = matches!(
                state.tile(key).map(|t| &t.body),
                Some(TileBody::Box { interior, .. }) if interior.is_empty()
            );
            if exhausted {
                if let Some(tile) = state.tile_mut(key) {
                    tile.picked = true;
                }
                state.craft_boxes.remove(&key);
                state.tiles_cleared += 1;
            }
        }
        if !fired {
            break;
        }
    }
    emitted
}

fn box_family_dir(state: &SimulationState, key: TileKey) -> Option<(BoxFamily, Direction)> {
    match state.tile(key)? {
        TileState { picked: false, body: TileBody::Box { family, dir, .. }, .. } => {
            Some((*family, *dir))
        }
        _ => None,
    }
}

fn pop_interior(state: &mut SimulationState, key: TileKey) -> Option<TileKind> {
    match state.tile_mut(key)? {
        TileState { body: TileBody::Box { interior, .. }, .. } => interior.pop(),
        _ => None,
    }
}
