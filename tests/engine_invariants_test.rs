//! Cross-cutting engine invariants: determinism, conservation, bounded dock,
//! monotone counters, optimal purity and trace replay round-trips.

use rand::rngs::StdRng;
use rand::SeedableRng;

use tilelab::board::{build_state, SimulationState};
use tilelab::bot::{select_move, BotKind, BotProfile};
use tilelab::level::level::{ExtraData, Layer, Level, TileDescriptor};
use tilelab::level::tile::{Direction, EffectTag, Pos, TileKind, TileToken};
use tilelab::rules::{apply_move, available_moves};
use tilelab::sim::trace::record_move;
use tilelab::sim::{replay_trace, run_episode, MoveTrace};

const SEED: u64 = 42;

fn plain(n: u8) -> TileDescriptor {
    TileDescriptor::new(TileToken::Kind(TileKind::new(n).unwrap()))
}

/// A two-layer level mixing placeholders, obstacles and a craft box.
fn mixed_level() -> Level {
    let lower = Layer::new(4, 4)
        .with_tile(Pos::new(0, 0), TileDescriptor::new(TileToken::Random))
        .with_tile(Pos::new(1, 0), TileDescriptor::new(TileToken::Random))
        .with_tile(Pos::new(2, 0), TileDescriptor::new(TileToken::Random))
        .with_tile(Pos::new(0, 1), plain(1).with_effect(EffectTag::Ice(None)))
        .with_tile(Pos::new(1, 1), plain(1))
        .with_tile(Pos::new(2, 1), plain(1))
        .with_tile(
            Pos::new(0, 3),
            TileDescriptor::new(TileToken::Craft(Direction::East))
                .with_extra(ExtraData { total_count: Some(3), ..Default::default() }),
        )
        .with_tile(Pos::new(0, 2), plain(2).with_effect(EffectTag::Chain))
        .with_tile(Pos::new(1, 2), plain(2))
        .with_tile(Pos::new(2, 2), plain(2));
    let upper = Layer::new(4, 4)
        .with_tile(Pos::new(1, 1), plain(3))
        .with_tile(Pos::new(2, 1), plain(3))
        .with_tile(Pos::new(1, 2), plain(3));
    Level {
        layers: vec![lower, upper],
        max_moves: 40,
        use_tile_count: 3,
        rand_seed: SEED,
        goal_count: None,
    }
}

/// Drive a full episode by hand, checking the per-state invariants after
/// every move, and return the final state plus the recorded trace.
fn drive_checked(level: &Level, profile: &BotProfile, behavior_seed: u64) -> (SimulationState, Vec<MoveTrace>) {
    let mut state = build_state(level, SEED).unwrap();
    let mut rng = StdRng::seed_from_u64(behavior_seed);
    let mut trace = Vec::new();
    let mut last_moves_used = 0;
    let mut last_clicks = 0;

    while !state.is_terminal() {
        let moves = available_moves(&state);
        let Some((mv, reason)) = select_move(&state, moves, profile, &mut rng) else {
            break;
        };
        let outcome = apply_move(&mut state, &mv).unwrap();
        trace.push(record_move(&state, &mv, &outcome, reason, state.moves_used));

        if !state.failed {
            assert!(state.dock.len() <= state.dock_capacity, "dock bound violated");
        }
        assert!(state.moves_used > last_moves_used, "moves_used must increase");
        assert!(state.teleport_click_count >= last_clicks);
        assert!(!(state.cleared && state.failed), "terminals are mutually exclusive");
        last_moves_used = state.moves_used;
        last_clicks = state.teleport_click_count;
    }
    (state, trace)
}

#[test]
fn test_conservation_across_bots() {
    let level = mixed_level();
    for bot in [BotKind::Novice, BotKind::Average, BotKind::Optimal] {
        let (state, _) = drive_checked(&level, &BotProfile::predefined(bot), 7);
        assert_eq!(
            state.tiles_cleared,
            state.initial_tile_count - state.unpicked_count() + state.tiles_emitted,
            "conservation violated for {bot}"
        );
    }
}

#[test]
fn test_cleared_implies_empty() {
    let level = mixed_level();
    for behavior_seed in 0..8 {
        let (state, _) = drive_checked(&level, &BotProfile::predefined(BotKind::Expert), behavior_seed);
        if state.cleared {
            assert!(!state.has_open_goals());
            assert_eq!(state.unpicked_count(), 0);
            assert!(state.dock.is_empty());
        }
    }
}

#[test]
fn test_replay_round_trip() {
    let level = mixed_level();
    let (state, trace) = drive_checked(&level, &BotProfile::predefined(BotKind::Casual), 11);

    let replayed = replay_trace(&level, SEED, &trace).unwrap();
    assert_eq!(
        replayed.snapshot(),
        state.snapshot(),
        "replaying the recorded moves must rebuild the exact final state"
    );
}

#[test]
fn test_episode_determinism_bytewise() {
    let level = mixed_level();
    for bot in BotKind::ALL {
        let profile = BotProfile::predefined(bot);
        let a = run_episode(&level, &profile, SEED, 3);
        let b = run_episode(&level, &profile, SEED, 3);
        assert_eq!(a, b, "{bot} must replay identically under fixed seeds");

        let (state_a, trace_a) = drive_checked(&level, &profile, 3);
        let (state_b, trace_b) = drive_checked(&level, &profile, 3);
        assert_eq!(trace_a, trace_b);
        assert_eq!(state_a.snapshot(), state_b.snapshot());
    }
}

#[test]
fn test_optimal_outcome_ignores_behavior_seed() {
    let level = mixed_level();
    let profile = BotProfile::predefined(BotKind::Optimal);
    let baseline = run_episode(&level, &profile, SEED, 0);
    for behavior_seed in [1u64, 17, 900_001] {
        let outcome = run_episode(&level, &profile, SEED, behavior_seed);
        assert_eq!(
            outcome, baseline,
            "a draw-free bot's outcome may depend on the state seed only"
        );
    }
}

#[test]
fn test_different_state_seeds_resolve_placeholders_differently() {
    // Sanity check on the other direction: the state seed does matter.
    let level = mixed_level();
    let kinds = |state_seed: u64| {
        let state = build_state(&level, state_seed).unwrap();
        state.layers[0]
            .values()
            .filter_map(|tile| tile.kind())
            .collect::<Vec<_>>()
    };
    let distinct = (0..16).map(kinds).collect::<std::collections::BTreeSet<_>>();
    assert!(
        distinct.len() > 1,
        "sixteen state seeds should not all produce the same t0 resolution"
    );
}
