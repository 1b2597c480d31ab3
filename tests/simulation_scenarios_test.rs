//! End-to-end gameplay scenarios: trivial clears, dock starvation, ice
//! adjacency, bomb countdowns, craft emission and teleport shuffles.

use std::collections::BTreeMap;

use tilelab::board::{build_state, FailReason, TileKey};
use tilelab::bot::{BotKind, BotProfile};
use tilelab::level::level::{ExtraData, Layer, Level, TileDescriptor};
use tilelab::level::tile::{Direction, EffectTag, GoalKind, Pos, TileKind, TileToken};
use tilelab::rules::{apply_move, available_moves};
use tilelab::sim::{run_episode, run_episode_traced, simulate_profile, SimulationOptions};

const SEED: u64 = 42;

fn kind(n: u8) -> TileKind {
    TileKind::new(n).unwrap()
}

fn plain(n: u8) -> TileDescriptor {
    TileDescriptor::new(TileToken::Kind(kind(n)))
}

fn level_of(layers: Vec<Layer>, max_moves: u32) -> Level {
    Level { layers, max_moves, use_tile_count: 6, rand_seed: SEED, goal_count: None }
}

fn pick_at(state: &tilelab::board::SimulationState, pos: Pos) -> tilelab::rules::CandidateMove {
    available_moves(state)
        .into_iter()
        .find(|m| m.pos == pos)
        .expect("expected a legal move at the given position")
}

/// 3x3 board, three tiles each of three kinds, nine moves. Every skill tier
/// clears it: the dock can hold at most two of each kind before the third
/// arrives.
#[test]
fn scenario_trivial_level_clears_for_every_bot() {
    let mut layer = Layer::new(3, 3);
    for (i, n) in [1u8, 2, 3, 1, 2, 3, 1, 2, 3].iter().enumerate() {
        layer = layer.with_tile(Pos::new(i as u16 % 3, i as u16 / 3), plain(*n));
    }
    let level = level_of(vec![layer], 9);

    for bot in BotKind::ALL {
        let summary = simulate_profile(
            &level,
            &BotProfile::predefined(bot),
            SimulationOptions::seeded(100, SEED),
        )
        .unwrap();
        assert!(
            summary.clear_rate >= 0.98,
            "{bot} should clear the trivial level, got {}",
            summary.clear_rate
        );
        assert!(
            (7.0..=9.0).contains(&summary.avg_moves),
            "{bot} avg_moves out of range: {}",
            summary.avg_moves
        );
        assert_eq!(summary.internal_errors, 0);
    }
}

/// Seven distinct kinds, one tile each: no triple can ever form, every
/// episode ends without a legal move.
#[test]
fn scenario_seven_singles_never_clear() {
    let mut layer = Layer::new(7, 1);
    for n in 1..=7u8 {
        layer = layer.with_tile(Pos::new(u16::from(n) - 1, 0), plain(n));
    }
    let level = Level {
        layers: vec![layer],
        max_moves: 20,
        use_tile_count: 7,
        rand_seed: SEED,
        goal_count: None,
    };

    for bot in BotKind::ALL {
        let summary = simulate_profile(
            &level,
            &BotProfile::predefined(bot),
            SimulationOptions::seeded(50, SEED),
        )
        .unwrap();
        assert_eq!(summary.clear_rate, 0.0, "{bot} cannot clear a board of singles");
        assert_eq!(summary.episodes_failed, 50);
    }
}

fn ice_level() -> Level {
    // An iced t1 at 1_1 with two exposed t1 neighbors, a t1 pool on the
    // right edge, and a t2 triple whose members finish melting the ice.
    let layer = Layer::new(4, 4)
        .with_tile(Pos::new(1, 1), plain(1).with_effect(EffectTag::Ice(None)))
        .with_tile(Pos::new(0, 1), plain(1))
        .with_tile(Pos::new(1, 0), plain(1))
        .with_tile(Pos::new(3, 0), plain(1))
        .with_tile(Pos::new(3, 1), plain(1))
        .with_tile(Pos::new(3, 2), plain(1))
        .with_tile(Pos::new(1, 2), plain(2))
        .with_tile(Pos::new(2, 1), plain(2))
        .with_tile(Pos::new(3, 3), plain(2));
    level_of(vec![layer], 9)
}

/// The iced tile is never directly pickable; adjacent removals melt it layer
/// by layer until it rejoins the matchable pool.
#[test]
fn scenario_ice_melts_through_adjacent_matches() {
    let level = ice_level();
    let (outcome, trace) = run_episode_traced(
        &level,
        &BotProfile::predefined(BotKind::Optimal),
        SEED,
        SEED,
    );
    assert!(outcome.cleared, "optimal must clear the ice level: {outcome:?}");
    assert_eq!(outcome.moves_used, 9);

    let iced = TileKey::new(0, Pos::new(1, 1));
    assert_eq!(
        trace[0].ice_states_after.get(&iced),
        Some(&2),
        "the first adjacent removal melts one ice layer"
    );
    let melted_at = trace
        .iter()
        .position(|record| !record.ice_states_after.contains_key(&iced))
        .expect("the ice must melt before the episode ends");
    assert!(melted_at >= 2, "ice-3 needs three adjacent removals, melted after move {melted_at}");

    let picked_at = trace
        .iter()
        .position(|record| record.layer == 0 && record.pos == Pos::new(1, 1))
        .expect("the melted tile must eventually be picked");
    assert!(picked_at > melted_at, "the iced tile is only pickable once melted");
}

/// Eight kinds with three tiles each: enough open kinds to overflow the dock
/// under careless play. Skill tiers must separate.
#[test]
fn scenario_dock_hazard_separates_skill_tiers() {
    let mut layer = Layer::new(6, 4);
    let mut cells = (0..6u16).flat_map(|x| (0..4u16).map(move |y| Pos::new(x, y)));
    for n in 1..=8u8 {
        for _ in 0..3 {
            layer = layer.with_tile(cells.next().unwrap(), plain(n));
        }
    }
    let level = Level {
        layers: vec![layer],
        max_moves: 24,
        use_tile_count: 8,
        rand_seed: SEED,
        goal_count: None,
    };

    let rate = |bot: BotKind| {
        simulate_profile(
            &level,
            &BotProfile::predefined(bot),
            SimulationOptions::seeded(100, SEED),
        )
        .unwrap()
        .clear_rate
    };

    let novice = rate(BotKind::Novice);
    let expert = rate(BotKind::Expert);
    let optimal = rate(BotKind::Optimal);

    assert_eq!(optimal, 1.0, "optimal keeps the dock short and always clears");
    assert!(expert >= 0.9, "expert should almost always clear, got {expert}");
    assert!(novice <= 0.75, "novice should overflow the dock often, got {novice}");
    assert!(novice < expert, "skill tiers must separate ({novice} vs {expert})");
}

fn bomb_level() -> Level {
    let layer = Layer::new(3, 2)
        .with_tile(Pos::new(0, 0), plain(1).with_effect(EffectTag::Bomb(Some(3))))
        .with_tile(Pos::new(1, 0), plain(1))
        .with_tile(Pos::new(2, 0), plain(1))
        .with_tile(Pos::new(0, 1), plain(2))
        .with_tile(Pos::new(1, 1), plain(2))
        .with_tile(Pos::new(2, 1), plain(2));
    level_of(vec![layer], 10)
}

/// An exposed bomb at countdown 3 detonates on the third move that leaves it
/// on the board; defusing it in time survives. Reproducible under one seed.
#[test]
fn scenario_bomb_countdown() {
    // Ignoring the bomb for three moves detonates it.
    let level = bomb_level();
    let mut state = build_state(&level, SEED).unwrap();
    for pos in [Pos::new(0, 1), Pos::new(1, 1), Pos::new(2, 1)] {
        let mv = pick_at(&state, pos);
        apply_move(&mut state, &mv).unwrap();
        if state.failed {
            break;
        }
    }
    assert!(state.failed);
    assert_eq!(state.fail_reason, Some(FailReason::BombDetonated));
    assert_eq!(state.moves_used, 3, "the bomb detonates exactly on its third tick");

    // Picking the bomb before the countdown runs out disarms it.
    let mut state = build_state(&level, SEED).unwrap();
    for pos in [Pos::new(0, 1), Pos::new(1, 1), Pos::new(0, 0)] {
        let mv = pick_at(&state, pos);
        apply_move(&mut state, &mv).unwrap();
    }
    assert!(!state.failed, "a picked bomb cannot detonate");
    assert!(state.bomb_tiles.is_empty());

    // The full episode is deterministic: the optimal bot reaches the bomb
    // first (canonical tie-break) and clears.
    let a = run_episode(&level, &BotProfile::predefined(BotKind::Optimal), SEED, SEED);
    let b = run_episode(&level, &BotProfile::predefined(BotKind::Optimal), SEED, SEED);
    assert_eq!(a, b);
    assert!(a.cleared, "optimal defuses the bomb and clears: {a:?}");
}

/// A craft box fires once per emptied target cell; its goal counter hits
/// zero exactly on the last firing, and conservation holds.
#[test]
fn scenario_craft_box_goal() {
    let layer = Layer::new(3, 3)
        .with_tile(
            Pos::new(1, 0),
            TileDescriptor::new(TileToken::Craft(Direction::South))
                .with_extra(ExtraData { total_count: Some(3), ..Default::default() }),
        )
        .with_tile(Pos::new(1, 1), plain(1))
        .with_tile(Pos::new(0, 0), plain(1))
        .with_tile(Pos::new(2, 0), plain(1));
    // Palette of one kind keeps the emitted interior matchable with the
    // board tiles.
    let level = Level {
        layers: vec![layer],
        max_moves: 10,
        use_tile_count: 1,
        rand_seed: SEED,
        goal_count: None,
    };

    let (outcome, trace) = run_episode_traced(
        &level,
        &BotProfile::predefined(BotKind::Optimal),
        SEED,
        SEED,
    );
    assert!(outcome.cleared, "six t1 tiles in two triples must clear: {outcome:?}");

    let goal = GoalKind::Craft(Direction::South);
    let goal_history: Vec<u32> =
        trace.iter().map(|record| record.goals_after.get(&goal).copied().unwrap_or(0)).collect();
    let firings: usize = trace.iter().map(|record| record.emitted.len()).sum();
    assert_eq!(firings, 3, "the box fires exactly its interior count");
    let first_zero = goal_history
        .iter()
        .position(|count| *count == 0)
        .expect("the craft goal must be exhausted when the level clears");
    assert!(
        goal_history[first_zero..].iter().all(|count| *count == 0),
        "goal counters are non-increasing: {goal_history:?}"
    );

    // Conservation: picks plus the expired box equal initial tiles plus
    // emissions (4 on the board, 3 emitted, nothing left behind).
    assert_eq!(outcome.tiles_cleared, 7);
}

/// Three teleport picks trigger a shuffle that permutes the kinds of the
/// accessible matchables without changing their multiset.
#[test]
fn scenario_teleport_shuffle_records_permutation() {
    let mut layer = Layer::new(3, 3);
    for x in 0..3u16 {
        layer = layer.with_tile(Pos::new(x, 0), plain(1).with_effect(EffectTag::Teleport));
        layer = layer.with_tile(Pos::new(x, 1), plain(2));
        layer = layer.with_tile(Pos::new(x, 2), plain(3));
    }
    let level = level_of(vec![layer], 9);

    let mut state = build_state(&level, SEED).unwrap();
    let kinds_before: BTreeMap<TileKey, TileKind> = state
        .layers[0]
        .iter()
        .filter(|(pos, _)| pos.y > 0)
        .map(|(pos, tile)| (TileKey::new(0, *pos), tile.kind().unwrap()))
        .collect();

    for x in 0..3u16 {
        let mv = pick_at(&state, Pos::new(x, 0));
        apply_move(&mut state, &mv).unwrap();
    }
    assert_eq!(state.teleport_click_count, 3);
    assert_eq!(
        state.tile_type_overrides.len(),
        6,
        "the shuffle must cover the six remaining accessible tiles"
    );

    let mut shuffled: Vec<TileKind> = state.tile_type_overrides.values().copied().collect();
    let mut original: Vec<TileKind> = kinds_before.values().copied().collect();
    shuffled.sort();
    original.sort();
    assert_eq!(shuffled, original, "a shuffle is a permutation, kinds are conserved");

    // The level stays clearable after the shuffle.
    let outcome = run_episode(&level, &BotProfile::predefined(BotKind::Optimal), SEED, SEED);
    assert!(outcome.cleared, "the shuffled level keeps its triples: {outcome:?}");
}
