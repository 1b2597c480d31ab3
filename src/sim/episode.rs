//! One end-to-end playthrough of a bot on a level.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::board::expand::build_state;
use crate::board::state::{FailReason, SimulationState};
use crate::bot::profile::BotProfile;
use crate::bot::selection::select_move;
use crate::level::level::Level;
use crate::level::tile::GoalKind;
use crate::rules::apply_move::apply_move;
use crate::rules::available_moves::available_moves;
use crate::sim::trace::{record_move, MoveTrace};

/// Result of one episode. Rules failures are regular outcomes; only
/// `fail_reason == InternalError` marks a bug, with `error` carrying the
/// diagnostic detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    pub cleared: bool,
    pub failed: bool,
    pub fail_reason: Option<FailReason>,
    pub moves_used: u32,
    pub combo_count: u32,
    pub tiles_cleared: u32,
    pub final_goals: BTreeMap<GoalKind, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EpisodeOutcome {
    fn from_state(state: &SimulationState) -> Self {
        EpisodeOutcome {
            cleared: state.cleared,
            failed: state.failed,
            fail_reason: state.fail_reason,
            moves_used: state.moves_used,
            combo_count: state.combo_count,
            tiles_cleared: state.tiles_cleared,
            final_goals: state.goals_remaining.clone(),
            error: None,
        }
    }

    pub fn is_internal_error(&self) -> bool {
        self.fail_reason == Some(FailReason::InternalError)
    }
}

/// Run one episode. The state is built from `(level, state_seed)`; all bot
/// randomness draws from a separate RNG seeded with `behavior_seed`.
pub fn run_episode(
    level: &Level,
    profile: &BotProfile,
    state_seed: u64,
    behavior_seed: u64,
) -> EpisodeOutcome {
    run(level, profile, state_seed, behavior_seed, None)
}

/// Like [`run_episode`], but records every move for visual playback.
pub fn run_episode_traced(
    level: &Level,
    profile: &BotProfile,
    state_seed: u64,
    behavior_seed: u64,
) -> (EpisodeOutcome, Vec<MoveTrace>) {
    let mut trace = Vec::new();
    let outcome = run(level, profile, state_seed, behavior_seed, Some(&mut trace));
    (outcome, trace)
}

fn run(
    level: &Level,
    profile: &BotProfile,
    state_seed: u64,
    behavior_seed: u64,
    mut trace: Option<&mut Vec<MoveTrace>>,
) -> EpisodeOutcome {
    let mut state = match build_state(level, state_seed) {
        Ok(state) => state,
        Err(error) => {
            return EpisodeOutcome {
                cleared: false,
                failed: true,
                fail_reason: Some(FailReason::InternalError),
                moves_used: 0,
                combo_count: 0,
                tiles_cleared: 0,
                final_goals: BTreeMap::new(),
                error: Some(error.to_string()),
            };
        }
    };
    let mut rng = StdRng::seed_from_u64(behavior_seed);
    let mut move_number = 0u32;

    // A level can be terminal before the first move (nothing to clear).
    crate::rules::terminal::evaluate(&mut state);

    while !state.is_terminal() {
        let moves = available_moves(&state);
        let Some((mv, reason)) = select_move(&state, moves, profile, &mut rng) else {
            state.mark_failed(FailReason::NoLegalMoves);
            break;
        };

        match apply_move(&mut state, &mv) {
            Ok(outcome) => {
                move_number += 1;
                if let Some(trace) = trace.as_mut() {
                    trace.push(record_move(&state, &mv, &outcome, reason, move_number));
                }
            }
            Err(error) => {
                log::warn!("episode aborted on move {}: {error}", move_number + 1);
                state.mark_failed(FailReason::InternalError);
                let mut outcome = EpisodeOutcome::from_state(&state);
                outcome.error = Some(error.to_string());
                return outcome;
            }
        }
    }

    EpisodeOutcome::from_state(&state)
}
