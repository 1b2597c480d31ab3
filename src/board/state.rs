//! Mutable per-episode simulation state, exclusively owned by one episode
//! and mutated only by the rules engine.

use rand::rngs::StdRng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::board::tile_state::TileState;
use crate::level::tile::{GoalKind, Pos, TileKind};
use crate::TileLabError;

/// Addresses one cell across the stacked layers; `Ord` follows the canonical
/// ordering (ascending layer, then position string order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileKey {
    pub layer: u8,
    pub pos: Pos,
}

impl TileKey {
    pub fn new(layer: u8, pos: Pos) -> Self {
        Self { layer, pos }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.layer, self.pos)
    }
}

impl FromStr for TileKey {
    type Err = TileLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (layer, pos) = s
            .split_once('_')
            .ok_or_else(|| TileLabError::InvalidLevel(format!("invalid tile key '{s}'")))?;
        let layer = layer
            .parse::<u8>()
            .map_err(|_| TileLabError::InvalidLevel(format!("invalid tile key '{s}'")))?;
        Ok(TileKey::new(layer, pos.parse()?))
    }
}

impl Serialize for TileKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TileKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// One picked tile waiting in the matching queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockEntry {
    pub kind: TileKind,
    pub layer: u8,
    pub pos: Pos,
}

/// Why an episode ended in failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailReason {
    DockOverflow,
    BombDetonated,
    OutOfMoves,
    NoLegalMoves,
    InternalError,
}

/// Mutable state of one episode.
#[derive(Debug)]
pub struct SimulationState {
    /// One sparse grid per layer; picked tiles stay in the map with
    /// `picked = true` so traces can refer back to them.
    pub layers: Vec<BTreeMap<Pos, TileState>>,
    /// `(cols, rows)` extent of each layer, for emission bounds checks.
    pub layer_extents: Vec<(u16, u16)>,
    pub dock: Vec<DockEntry>,
    pub dock_capacity: usize,
    pub goals_remaining: BTreeMap<GoalKind, u32>,
    pub moves_used: u32,
    pub max_moves: u32,
    pub teleport_click_count: u32,
    pub combo_count: u32,
    /// Tiles removed from the board so far (picks plus exhausted boxes).
    pub tiles_cleared: u32,
    /// Tiles emitted onto the board by craft/stack boxes so far.
    pub tiles_emitted: u32,
    /// Unpicked tiles present right after expansion, for conservation checks.
    pub initial_tile_count: u32,
    pub bomb_tiles: BTreeSet<TileKey>,
    pub curtain_tiles: BTreeSet<TileKey>,
    pub craft_boxes: BTreeSet<TileKey>,
    pub frog_tiles: BTreeSet<TileKey>,
    pub cleared: bool,
    pub failed: bool,
    pub fail_reason: Option<FailReason>,
    /// Permanent kind rewrites caused by teleport shuffles.
    pub tile_type_overrides: BTreeMap<TileKey, TileKind>,
    /// Rules RNG: t0 resolution, box interiors and teleport shuffles. Bot
    /// behavior randomness never draws from this.
    pub(crate) rng: StdRng,
}

impl SimulationState {
    pub fn tile(&self, key: TileKey) -> Option<&TileState> {
        self.layers.get(key.layer as usize)?.get(&key.pos)
    }

    pub fn tile_mut(&mut self, key: TileKey) -> Option<&mut TileState> {
        self.layers.get_mut(key.layer as usize)?.get_mut(&key.pos)
    }

    pub fn is_terminal(&self) -> bool {
        self.cleared || self.failed
    }

    /// Count of tiles still on the board.
    pub fn unpicked_count(&self) -> u32 {
        self.layers
            .iter()
            .flat_map(|layer| layer.values())
            .filter(|tile| !tile.picked)
            .count() as u32
    }

    pub fn has_open_goals(&self) -> bool {
        self.goals_remaining.values().any(|count| *count > 0)
    }

    pub fn dock_count_of(&self, kind: TileKind) -> usize {
        self.dock.iter().filter(|entry| entry.kind == kind).count()
    }

    /// Terminal flags are monotonic: the first one set wins, later calls are
    /// ignored.
    pub fn mark_failed(&mut self, reason: FailReason) {
        if !self.is_terminal() {
            self.failed = true;
            self.fail_reason = Some(reason);
        }
    }

    pub fn mark_cleared(&mut self) {
        if !self.is_terminal() {
            self.cleared = true;
        }
    }

    /// Comparable digest of everything observable about the state, used by
    /// replay verification and determinism tests.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            unpicked: self
                .layers
                .iter()
                .enumerate()
                .flat_map(|(layer, tiles)| {
                    tiles.iter().filter(|(_, tile)| !tile.picked).map(move |(pos, tile)| {
                        (TileKey::new(layer as u8, *pos), tile.clone())
                    })
                })
                .collect(),
            dock: self.dock.clone(),
            goals_remaining: self.goals_remaining.clone(),
            moves_used: self.moves_used,
            teleport_click_count: self.teleport_click_count,
            combo_count: self.combo_count,
            tiles_cleared: self.tiles_cleared,
            tiles_emitted: self.tiles_emitted,
            cleared: self.cleared,
            failed: self.failed,
            fail_reason: self.fail_reason,
            tile_type_overrides: self.tile_type_overrides.clone(),
        }
    }
}

/// Owned, comparable view of a [`SimulationState`].
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub unpicked: BTreeMap<TileKey, TileState>,
    pub dock: Vec<DockEntry>,
    pub goals_remaining: BTreeMap<GoalKind, u32>,
    pub moves_used: u32,
    pub teleport_click_count: u32,
    pub combo_count: u32,
    pub tiles_cleared: u32,
    pub tiles_emitted: u32,
    pub cleared: bool,
    pub failed: bool,
    pub fail_reason: Option<FailReason>,
    pub tile_type_overrides: BTreeMap<TileKey, TileKind>,
}
