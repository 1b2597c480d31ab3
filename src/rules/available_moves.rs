//! Accessibility and legal-move enumeration.

use crate::board::state::{SimulationState, TileKey};
use crate::board::tile_state::{Effect, TileState};
use crate::level::tile::{Pos, TileKind};
use std::collections::BTreeMap;

/// A candidate pick, scored later by the bot policy.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMove {
    pub layer: u8,
    pub pos: Pos,
    pub kind: TileKind,
    /// Effect snapshot at enumeration time, for scoring and traces.
    pub effect: Effect,
    /// Linked companions picked simultaneously (at most one).
    pub linked: Vec<TileKey>,
    /// Accessible tiles of the same kind, a width hint for scoring.
    pub match_count: u32,
    /// Picking this tile completes a dock triple.
    pub will_match: bool,
    pub score: f64,
}

impl CandidateMove {
    pub fn key(&self) -> TileKey {
        TileKey::new(self.layer, self.pos)
    }
}

/// A tile is accessible iff it is unpicked and no unpicked tile in a strictly
/// higher layer occupies the same position.
pub fn is_accessible(state: &SimulationState, key: TileKey) -> bool {
    match state.tile(key) {
        Some(tile) if !tile.picked => {}
        _ => return false,
    }
    state.layers[key.layer as usize + 1..]
        .iter()
        .all(|layer| layer.get(&key.pos).is_none_or(|above| above.picked))
}

/// All accessible tiles in canonical order (ascending layer, then position
/// string order).
pub fn accessible_tiles(state: &SimulationState) -> Vec<TileKey> {
    let mut keys = Vec::new();
    for (layer_idx, layer) in state.layers.iter().enumerate() {
        for pos in layer.keys() {
            let key = TileKey::new(layer_idx as u8, *pos);
            if is_accessible(state, key) {
                keys.push(key);
            }
        }
    }
    keys
}

/// Whether an accessible tile may be picked this turn.
pub fn is_pickable(tile: &TileState) -> bool {
    if tile.picked || tile.frogged || tile.is_box() {
        return false;
    }
    match tile.effect() {
        Effect::Chain { unlocked } => unlocked,
        Effect::Ice { .. } | Effect::Grass { .. } => false,
        Effect::Curtain { open } => open,
        _ => true,
    }
}

/// Enumerate the legal moves of the current state in canonical order.
pub fn available_moves(state: &SimulationState) -> Vec<CandidateMove> {
    let accessible = accessible_tiles(state);

    let mut kind_counts: BTreeMap<TileKind, u32> = BTreeMap::new();
    for key in &accessible {
        if let Some(kind) = state.tile(*key).and_then(TileState::kind) {
            *kind_counts.entry(kind).or_insert(0) += 1;
        }
    }

    let mut moves = Vec::new();
    for key in &accessible {
        let tile = match state.tile(*key) {
            Some(tile) => tile,
            None => continue,
        };
        if !is_pickable(tile) {
            continue;
        }
        let kind = match tile.kind() {
            Some(kind) => kind,
            None => continue,
        };

        let linked = companion_of(state, *key, tile)
            .into_iter()
            .collect::<Vec<_>>();

        moves.push(CandidateMove {
            layer: key.layer,
            pos: key.pos,
            kind,
            effect: tile.effect(),
            linked,
            match_count: kind_counts.get(&kind).copied().unwrap_or(0),
            will_match: state.dock_count_of(kind) >= 2,
            score: 0.0,
        });
    }
    moves
}

/// Resolve the linked companion of a pick: either the tile this link points
/// at (forward), or the first accessible link source pointing here (reverse).
/// Companions must be accessible matchable pieces; anything else leaves the
/// link inert.
fn companion_of(state: &SimulationState, key: TileKey, tile: &TileState) -> Option<TileKey> {
    if let Effect::Link { partner: Some(partner), .. } = tile.effect() {
        let partner_key = TileKey::new(key.layer, partner);
        if is_accessible(state, partner_key)
            && state.tile(partner_key).is_some_and(|t| t.kind().is_some())
        {
            return Some(partner_key);
        }
        return None;
    }

    // Reverse lookup: a neighbor whose outgoing link lands on this tile.
    let mut sources: Vec<TileKey> = Vec::new();
    for dir in crate::level::tile::Direction::CARDINAL {
        let Some(source_pos) = key.pos.step(dir.opposite()) else {
            continue;
        };
        let source_key = TileKey::new(key.layer, source_pos);
        let Some(source) = state.tile(source_key) else {
            continue;
        };
        match source.effect() {
            Effect::Link { dir: link_dir, partner: Some(target) }
                if link_dir == dir && target == key.pos =>
            {
                if is_accessible(state, source_key) && source.kind().is_some() {
                    sources.push(source_key);
                }
            }
            _ => {}
        }
    }
    sources.into_iter().min()
}
