//! Attention-zone filter: weaker bots overlook deep non-matching moves.

use rand::rngs::StdRng;
use rand::RngExt;

use crate::bot::profile::BotProfile;
use crate::rules::available_moves::CandidateMove;

/// Per-layer survival factor: at depth `d` below the topmost occupied layer
/// a non-matching move stays visible with probability `(0.6 + 0.4·pr)^d`.
const BASE_VISIBILITY: f64 = 0.6;

/// Filter the move set through the bot's attention zone. Matching moves are
/// always visible; draw-free bots see everything. If the filter would blind
/// the bot completely, the full set is restored.
pub fn filter_moves(
    moves: Vec<CandidateMove>,
    profile: &BotProfile,
    rng: &mut StdRng,
) -> Vec<CandidateMove> {
    if profile.is_draw_free() {
        return moves;
    }
    let Some(topmost) = moves.iter().map(|mv| mv.layer).max() else {
        return moves;
    };

    let per_layer = BASE_VISIBILITY + (1.0 - BASE_VISIBILITY) * profile.pattern_recognition;
    let kept: Vec<CandidateMove> = moves
        .iter()
        .filter(|mv| {
            if mv.will_match {
                return true;
            }
            let depth = i32::from(topmost - mv.layer);
            let visibility = per_layer.powi(depth);
            rng.random::<f64>() < visibility
        })
        .cloned()
        .collect();

    if kept.is_empty() {
        moves
    } else {
        kept
    }
}
