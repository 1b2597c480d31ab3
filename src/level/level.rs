//! Immutable level description: the only place that interprets the raw
//! descriptor encoding. Everything downstream works with the typed model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::level::tile::{EffectTag, GoalKind, Pos, TileKind, TileToken};
use crate::{Result, TileLabError};

/// Fixed dock size of the matching queue.
pub const DOCK_CAPACITY: usize = 7;

/// Hard cap on stacked layers.
pub const MAX_LAYERS: usize = 12;

/// Palette size used to resolve `t0` when the level does not specify one.
pub const DEFAULT_USE_TILE_COUNT: u8 = 6;

fn default_use_tile_count() -> u8 {
    DEFAULT_USE_TILE_COUNT
}

/// Optional structured payload of a tile descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraData {
    /// Interior size of a craft/stack box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grass_layer: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bomb_count: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,
}

/// One sparse cell of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDescriptor {
    pub tile: TileToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<EffectTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<ExtraData>,
}

impl TileDescriptor {
    pub fn new(tile: TileToken) -> Self {
        Self { tile, effect: None, extra: None }
    }

    pub fn with_effect(mut self, effect: EffectTag) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn with_extra(mut self, extra: ExtraData) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Interior size of a box descriptor (boxes without `totalCount` hold one tile).
    pub fn box_total_count(&self) -> u32 {
        self.extra.as_ref().and_then(|e| e.total_count).unwrap_or(1)
    }
}

/// One stacked layer: a grid extent plus a sparse tile mapping.
///
/// The `BTreeMap` key order is the canonical traversal order (see
/// [`Pos`](crate::level::Pos)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub cols: u16,
    pub rows: u16,
    #[serde(default)]
    pub tiles: BTreeMap<Pos, TileDescriptor>,
}

impl Layer {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows, tiles: BTreeMap::new() }
    }

    pub fn with_tile(mut self, pos: Pos, descriptor: TileDescriptor) -> Self {
        self.tiles.insert(pos, descriptor);
        self
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.cols && pos.y < self.rows
    }
}

/// Immutable level input, shared by reference across all episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub layers: Vec<Layer>,
    pub max_moves: u32,
    #[serde(default = "default_use_tile_count")]
    pub use_tile_count: u8,
    #[serde(default)]
    pub rand_seed: u64,
    /// Explicit goal table; when absent, goals derive from craft/stack boxes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_count: Option<BTreeMap<GoalKind, u32>>,
}

impl Level {
    /// Parse and validate a level from its structural JSON form.
    pub fn from_json(json: &str) -> Result<Level> {
        let level: Level = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Palette size for `t0` resolution, clamped to `[1, 15]`.
    pub fn palette_size(&self) -> u8 {
        self.use_tile_count.clamp(1, TileKind::MAX)
    }

    /// Validate structure before any episode runs. All problems here are
    /// fatal to the whole request, never per-episode outcomes.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(TileLabError::InvalidLevel(msg));

        if self.layers.is_empty() {
            return fail("level has no layers".to_string());
        }
        if self.layers.len() > MAX_LAYERS {
            return fail(format!(
                "level has {} layers, at most {MAX_LAYERS} are supported",
                self.layers.len()
            ));
        }
        if self.max_moves == 0 {
            return fail("maxMoves must be positive".to_string());
        }
        if let Some(goals) = &self.goal_count {
            for (goal, count) in goals {
                if *count == 0 {
                    return fail(format!("goal '{goal}' has a zero count"));
                }
            }
        }

        for (layer_idx, layer) in self.layers.iter().enumerate() {
            if layer.cols == 0 || layer.rows == 0 {
                return fail(format!("layer {layer_idx} has an empty grid extent"));
            }
            for (pos, descriptor) in &layer.tiles {
                if !layer.contains(*pos) {
                    return fail(format!(
                        "layer {layer_idx} tile at {pos} is outside the {}x{} extent",
                        layer.cols, layer.rows
                    ));
                }
                if descriptor.tile.is_box() && descriptor.box_total_count() == 0 {
                    return fail(format!(
                        "layer {layer_idx} box at {pos} has a zero interior count"
                    ));
                }
                if let Some(EffectTag::Link(dir)) = descriptor.effect {
                    match pos.step(dir) {
                        Some(target) if layer.contains(target) => {}
                        _ => {
                            return fail(format!(
                                "layer {layer_idx} link at {pos} points outside the extent"
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Total count of matchable tiles after expansion: plain pieces plus the
    /// realized interiors of every craft/stack box. A clearable level needs
    /// this to be a multiple of 3.
    pub fn total_matchable_tiles(&self) -> u32 {
        self.layers
            .iter()
            .flat_map(|layer| layer.tiles.values())
            .map(|descriptor| match descriptor.tile {
                TileToken::Random | TileToken::Kind(_) => 1,
                TileToken::Craft(_) | TileToken::Stack(_) => descriptor.box_total_count(),
            })
            .sum()
    }

    /// The goal table an episode starts from: the explicit `goalCount` when
    /// present, otherwise each box contributes its interior count to its
    /// goal kind.
    pub fn derived_goals(&self) -> BTreeMap<GoalKind, u32> {
        if let Some(goals) = &self.goal_count {
            return goals.clone();
        }
        let mut goals = BTreeMap::new();
        for layer in &self.layers {
            for descriptor in layer.tiles.values() {
                let goal = match descriptor.tile {
                    TileToken::Craft(dir) => GoalKind::Craft(dir),
                    TileToken::Stack(dir) => GoalKind::Stack(dir),
                    _ => continue,
                };
                *goals.entry(goal).or_insert(0) += descriptor.box_total_count();
            }
        }
        goals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::tile::Direction;

    fn kind(n: u8) -> TileToken {
        TileToken::Kind(TileKind::new(n).unwrap())
    }

    #[test]
    fn test_parse_structural_json() {
        let json = r#"{
            "layers": [
                {
                    "cols": 3,
                    "rows": 3,
                    "tiles": {
                        "0_0": {"tile": "t1"},
                        "1_0": {"tile": "t0", "effect": "ice_2"},
                        "2_2": {"tile": "craft_s", "extra": {"totalCount": 3}}
                    }
                }
            ],
            "maxMoves": 30,
            "useTileCount": 4,
            "randSeed": 42,
            "goalCount": {"craft_s": 3}
        }"#;

        let level = Level::from_json(json).expect("level should parse and validate");
        assert_eq!(level.layers.len(), 1);
        assert_eq!(level.palette_size(), 4);
        assert_eq!(level.total_matchable_tiles(), 5, "two pieces plus a 3-tile interior");

        let craft = level.layers[0].tiles.get(&Pos::new(2, 2)).unwrap();
        assert_eq!(craft.tile, TileToken::Craft(Direction::South));
        assert_eq!(craft.box_total_count(), 3);
    }

    #[test]
    fn test_validation_rejects_out_of_extent_tile() {
        let level = Level {
            layers: vec![Layer::new(2, 2).with_tile(Pos::new(5, 0), TileDescriptor::new(kind(1)))],
            max_moves: 10,
            use_tile_count: 6,
            rand_seed: 0,
            goal_count: None,
        };
        assert_matches::assert_matches!(level.validate(), Err(TileLabError::InvalidLevel(_)));
    }

    #[test]
    fn test_validation_rejects_link_out_of_bounds() {
        let level = Level {
            layers: vec![Layer::new(3, 3).with_tile(
                Pos::new(0, 0),
                TileDescriptor::new(kind(1)).with_effect(EffectTag::Link(Direction::North)),
            )],
            max_moves: 10,
            use_tile_count: 6,
            rand_seed: 0,
            goal_count: None,
        };
        let err = level.validate().unwrap_err();
        assert!(
            err.to_string().contains("points outside"),
            "expected a link-out-of-bounds error, got: {err}"
        );
    }

    #[test]
    fn test_derived_goals_from_boxes() {
        let level = Level {
            layers: vec![Layer::new(5, 5)
                .with_tile(
                    Pos::new(1, 1),
                    TileDescriptor::new(TileToken::Craft(Direction::South))
                        .with_extra(ExtraData { total_count: Some(3), ..Default::default() }),
                )
                .with_tile(
                    Pos::new(3, 3),
                    TileDescriptor::new(TileToken::Stack(Direction::East))
                        .with_extra(ExtraData { total_count: Some(6), ..Default::default() }),
                )],
            max_moves: 40,
            use_tile_count: 6,
            rand_seed: 0,
            goal_count: None,
        };
        let goals = level.derived_goals();
        assert_eq!(goals.get(&GoalKind::Craft(Direction::South)), Some(&3));
        assert_eq!(goals.get(&GoalKind::Stack(Direction::East)), Some(&6));
    }

    #[test]
    fn test_validation_rejects_layer_overflow() {
        let level = Level {
            layers: vec![Layer::new(1, 1); MAX_LAYERS + 1],
            max_moves: 10,
            use_tile_count: 6,
            rand_seed: 0,
            goal_count: None,
        };
        assert!(level.validate().is_err());
    }
}
