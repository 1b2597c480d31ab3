//! Level → SimulationState expansion: the only place that interprets tile
//! descriptors, resolves `t0` placeholders and seeds effect data.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngExt, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};

use crate::board::state::{SimulationState, TileKey};
use crate::board::tile_state::{BoxFamily, Effect, TileState};
use crate::level::level::{Layer, Level, TileDescriptor, DOCK_CAPACITY};
use crate::level::tile::{EffectTag, Pos, TileKind, TileToken};
use crate::{Result, TileLabError};

const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Build a fresh episode state from a level.
///
/// Construction is pure with respect to `(level, state_seed)`: the rules RNG
/// is seeded from the level's `rand_seed` mixed with `state_seed`, and the
/// canonical traversal (ascending layer, position string order) pins every
/// assignment. All bots of one assessment share the same `state_seed` and
/// therefore observe identical initial tiles.
pub fn build_state(level: &Level, state_seed: u64) -> Result<SimulationState> {
    let mut rng =
        StdRng::seed_from_u64(level.rand_seed.wrapping_add(state_seed.wrapping_mul(SEED_MIX)));
    let palette = palette_kinds(level.palette_size());

    let placeholder_count = level
        .layers
        .iter()
        .flat_map(|layer| layer.tiles.values())
        .filter(|descriptor| descriptor.tile == TileToken::Random)
        .count();
    let mut assignments = distribute_kinds(placeholder_count, &palette, &mut rng).into_iter();

    let mut layers: Vec<BTreeMap<Pos, TileState>> = Vec::with_capacity(level.layers.len());
    let mut bomb_tiles = BTreeSet::new();
    let mut curtain_tiles = BTreeSet::new();
    let mut craft_boxes = BTreeSet::new();
    let mut frog_tiles = BTreeSet::new();
    let mut initial_tile_count = 0u32;

    for (layer_idx, layer) in level.layers.iter().enumerate() {
        let mut tiles = BTreeMap::new();
        for (pos, descriptor) in &layer.tiles {
            let key = TileKey::new(layer_idx as u8, *pos);
            let tile = match descriptor.tile {
                TileToken::Random => {
                    let kind = assignments.next().ok_or_else(|| {
                        TileLabError::Invariant("t0 assignment pool exhausted".to_string())
                    })?;
                    piece_tile(kind, descriptor, *pos, layer)
                }
                TileToken::Kind(kind) => piece_tile(kind, descriptor, *pos, layer),
                TileToken::Craft(dir) => {
                    let interior =
                        distribute_kinds(descriptor.box_total_count() as usize, &palette, &mut rng);
                    TileState::boxed(BoxFamily::Craft, dir, interior)
                }
                TileToken::Stack(dir) => {
                    let interior =
                        distribute_kinds(descriptor.box_total_count() as usize, &palette, &mut rng);
                    TileState::boxed(BoxFamily::Stack, dir, interior)
                }
            };

            match tile.effect() {
                Effect::Bomb { .. } => {
                    bomb_tiles.insert(key);
                }
                Effect::Curtain { .. } => {
                    curtain_tiles.insert(key);
                }
                _ => {}
            }
            if tile.is_box() {
                craft_boxes.insert(key);
            }
            if tile.frogged {
                frog_tiles.insert(key);
            }
            initial_tile_count += 1;
            tiles.insert(*pos, tile);
        }
        layers.push(tiles);
    }

    Ok(SimulationState {
        layers,
        layer_extents: level.layers.iter().map(|layer| (layer.cols, layer.rows)).collect(),
        dock: Vec::with_capacity(DOCK_CAPACITY + 2),
        dock_capacity: DOCK_CAPACITY,
        goals_remaining: level.derived_goals(),
        moves_used: 0,
        max_moves: level.max_moves,
        teleport_click_count: 0,
        combo_count: 0,
        tiles_cleared: 0,
        tiles_emitted: 0,
        initial_tile_count,
        bomb_tiles,
        curtain_tiles,
        craft_boxes,
        frog_tiles,
        cleared: false,
        failed: false,
        fail_reason: None,
        tile_type_overrides: BTreeMap::new(),
        rng,
    })
}

fn palette_kinds(size: u8) -> Vec<TileKind> {
    (1..=size).filter_map(TileKind::new).collect()
}

/// Draw `n` kinds from the palette in triple-balanced groups: whole triples
/// of one kind plus `n mod 3` singles, shuffled. Keeps realized levels on
/// the multiple-of-3 clearability invariant.
fn distribute_kinds(n: usize, palette: &[TileKind], rng: &mut StdRng) -> Vec<TileKind> {
    let mut kinds = Vec::with_capacity(n);
    for _ in 0..n / 3 {
        let kind = palette[rng.random_range(0..palette.len())];
        kinds.extend([kind; 3]);
    }
    for _ in 0..n % 3 {
        kinds.push(palette[rng.random_range(0..palette.len())]);
    }
    kinds.shuffle(rng);
    kinds
}

fn piece_tile(kind: TileKind, descriptor: &TileDescriptor, pos: Pos, layer: &Layer) -> TileState {
    let extra = descriptor.extra.as_ref();
    let mut frogged = false;
    let effect = match descriptor.effect {
        None => Effect::None,
        Some(EffectTag::Chain) => Effect::Chain { unlocked: false },
        Some(EffectTag::Frog) => {
            frogged = true;
            Effect::Frog
        }
        Some(EffectTag::Ice(_)) => Effect::Ice { remaining: 3 },
        Some(EffectTag::Grass(suffix)) => {
            let remaining = extra
                .and_then(|e| e.grass_layer)
                .or(suffix)
                .unwrap_or(2)
                .clamp(1, 3);
            Effect::Grass { remaining }
        }
        Some(EffectTag::Link(dir)) => {
            let partner = pos
                .step(dir)
                .filter(|target| layer.contains(*target) && layer.tiles.contains_key(target));
            Effect::Link { dir, partner }
        }
        Some(EffectTag::Bomb(suffix)) => {
            let countdown = extra
                .and_then(|e| e.bomb_count)
                .or(suffix)
                .unwrap_or(4)
                .clamp(3, 5);
            Effect::Bomb { countdown }
        }
        Some(EffectTag::Curtain(tag_open)) => {
            let open = extra
                .and_then(|e| e.is_open)
                .unwrap_or(tag_open == Some(true));
            Effect::Curtain { open }
        }
        Some(EffectTag::Teleport) => Effect::Teleport,
        Some(EffectTag::Unknown) => Effect::Unknown,
    };
    let mut tile = TileState::piece(kind, effect);
    tile.frogged = frogged;
    tile
}
