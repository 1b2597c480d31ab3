//! Move selection: mistake rolls, patience cutoffs and one-ply lookahead
//! tie-breaking on top of the scored ranking.

use rand::rngs::StdRng;
use rand::RngExt;
use serde::{Deserialize, Serialize};

use crate::board::state::SimulationState;
use crate::board::tile_state::Effect;
use crate::bot::attention::filter_moves;
use crate::bot::profile::BotProfile;
use crate::bot::scoring::score_moves;
use crate::rules::available_moves::CandidateMove;

/// Candidates within this score distance of the best are near-ties for the
/// lookahead comparison.
const NEAR_TIE_WINDOW: f64 = 0.5;

/// At most this many top candidates enter the lookahead comparison.
const LOOKAHEAD_CANDIDATES: usize = 3;

/// Why the bot chose its move, recorded in move traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Random,
    Mistake,
    MatchCompletion,
    EffectClear,
    ChainPreference,
    BlockingRelief,
    DockSafety,
    GoalProgress,
    Lookahead,
}

/// Pick exactly one move from the legal set, or `None` when it is empty.
///
/// Draw-free bots (`pattern_recognition ≥ 0.99`) never touch `rng`: no
/// attention filter, no mistake roll, no noise, deterministic tie-breaks.
pub fn select_move(
    state: &SimulationState,
    moves: Vec<CandidateMove>,
    profile: &BotProfile,
    rng: &mut StdRng,
) -> Option<(CandidateMove, DecisionReason)> {
    if moves.is_empty() {
        return None;
    }

    let mut moves = filter_moves(moves, profile, rng);
    score_moves(&mut moves, state, profile, rng);

    if !profile.is_draw_free() && rng.random::<f64>() < profile.mistake_rate {
        let pick = moves[rng.random_range(0..moves.len())].clone();
        return Some((pick, DecisionReason::Mistake));
    }

    // Score descending, canonical order as the tie-break.
    moves.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key().cmp(&b.key()))
    });

    if profile.patience < 0.5 && moves.len() > 1 {
        let cutoff = ((moves.len() as f64) * profile.patience).ceil().max(1.0) as usize;
        let pick = moves[rng.random_range(0..cutoff.min(moves.len()))].clone();
        let reason = classify(&pick);
        return Some((pick, reason));
    }

    if profile.lookahead_depth > 0 && moves.len() > 1 {
        let best_score = moves[0].score;
        let candidates: Vec<&CandidateMove> = moves
            .iter()
            .take(LOOKAHEAD_CANDIDATES)
            .filter(|mv| best_score - mv.score <= NEAR_TIE_WINDOW)
            .collect();
        if candidates.len() > 1 {
            let mut best = candidates[0];
            let mut best_supply = future_supply(best);
            for mv in &candidates[1..] {
                let supply = future_supply(mv);
                if supply > best_supply {
                    best = *mv;
                    best_supply = supply;
                }
            }
            let chosen = best.clone();
            let reason = if chosen == moves[0] { classify(&chosen) } else { DecisionReason::Lookahead };
            return Some((chosen, reason));
        }
    }

    let pick = moves[0].clone();
    let reason = classify(&pick);
    Some((pick, reason))
}

/// Cheap one-ply heuristic: how many same-kind accessible tiles remain after
/// the move removes its own. A larger remaining supply keeps future matches
/// alive.
fn future_supply(mv: &CandidateMove) -> i64 {
    let removed = 1 + mv.linked.len() as i64;
    i64::from(mv.match_count) - removed
}

fn classify(mv: &CandidateMove) -> DecisionReason {
    if mv.will_match {
        return DecisionReason::MatchCompletion;
    }
    match mv.effect {
        Effect::Chain { .. } | Effect::Ice { .. } | Effect::Grass { .. } => {
            return DecisionReason::EffectClear;
        }
        Effect::Frog | Effect::Link { .. } => return DecisionReason::ChainPreference,
        _ => {}
    }
    if mv.layer >= 5 {
        return DecisionReason::BlockingRelief;
    }
    if mv.match_count == 2 {
        return DecisionReason::DockSafety;
    }
    DecisionReason::GoalProgress
}
