//! Weighted heuristic scoring of candidate moves.

use rand::rngs::StdRng;
use rand::RngExt;

use crate::board::state::SimulationState;
use crate::board::tile_state::Effect;
use crate::bot::profile::BotProfile;
use crate::rules::available_moves::CandidateMove;

/// Score one move under a profile. `rng` is `None` for draw-free bots, which
/// skip the noise term entirely instead of drawing a zero-weighted sample.
pub fn score_move(
    mv: &CandidateMove,
    state: &SimulationState,
    profile: &BotProfile,
    rng: Option<&mut StdRng>,
) -> f64 {
    let mut score = 1.0;

    // Dock progress dominates: completing a triple beats everything else.
    let dock_same = state.dock_count_of(mv.kind);
    if dock_same >= 2 {
        score += 10.0;
    } else if dock_same == 1 {
        score += 3.0;
    }

    if state.has_open_goals() {
        score += 2.0 * profile.goal_priority;
    }

    score += 0.3 * f64::from(mv.layer) * profile.blocking_awareness;

    if matches!(mv.effect, Effect::Chain { .. } | Effect::Frog | Effect::Link { .. }) {
        score += 1.5 * profile.chain_preference;
    }

    if mv.match_count > 3 {
        score += 0.5 * f64::from(mv.match_count - 3) * profile.pattern_recognition;
    }

    if !mv.linked.is_empty() {
        score += 2.0;
        for key in &mv.linked {
            let Some(kind) = state.tile(*key).and_then(|tile| tile.kind()) else {
                continue;
            };
            match state.dock_count_of(kind) {
                count if count >= 2 => score += 5.0,
                1 => score += 1.5,
                _ => {}
            }
        }
    }

    // Opening a new kind while the dock is nearly full risks the overflow.
    if dock_same == 0 {
        let adding = 1 + mv.linked.len();
        if state.dock.len() + adding > state.dock_capacity.saturating_sub(2) {
            score -= 3.0;
        }
    }

    if let Some(rng) = rng {
        score += (1.0 - profile.pattern_recognition) * rng.random_range(0.0..2.0);
    }

    score
}

/// Score a whole move set in place.
pub fn score_moves(
    moves: &mut [CandidateMove],
    state: &SimulationState,
    profile: &BotProfile,
    rng: &mut StdRng,
) {
    let draw_free = profile.is_draw_free();
    for mv in moves {
        let noise_rng = if draw_free { None } else { Some(&mut *rng) };
        mv.score = score_move(mv, state, profile, noise_rng);
    }
}
