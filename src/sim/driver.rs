//! Monte Carlo batch driver: N independent episodes of one (level, bot)
//! pair, data-parallel over episodes, folded into summary statistics.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bot::profile::{BotKind, BotProfile};
use crate::level::level::Level;
use crate::sim::episode::{run_episode, EpisodeOutcome};
use crate::sim::stats::{mean, sample_std};
use crate::Result;

/// Batch parameters. Every episode builds its state from `state_seed` (the
/// whole batch shares one initial board) and draws behavior randomness from
/// `behavior_seed + episode_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOptions {
    pub iterations: u32,
    pub state_seed: u64,
    pub behavior_seed: u64,
}

impl SimulationOptions {
    pub fn seeded(iterations: u32, seed: u64) -> Self {
        Self { iterations, state_seed: seed, behavior_seed: seed }
    }
}

/// Aggregated outcome of one (level, bot) batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSimulation {
    pub bot: BotKind,
    pub bot_name: String,
    pub iterations: u32,
    pub clear_rate: f64,
    pub avg_moves: f64,
    pub min_moves: u32,
    pub max_moves_used: u32,
    pub std_moves: f64,
    pub avg_combo: f64,
    pub avg_tiles_cleared: f64,
    pub episodes_cleared: u32,
    pub episodes_failed: u32,
    /// Episodes aborted by a rules-engine invariant violation. These are
    /// excluded from the move statistics but still reported.
    pub internal_errors: u32,
}

/// Run the batch. Validation failures are fatal; per-episode failures are
/// absorbed into the aggregate.
pub fn simulate_profile(
    level: &Level,
    profile: &BotProfile,
    options: SimulationOptions,
) -> Result<ProfileSimulation> {
    level.validate()?;

    let outcomes: Vec<EpisodeOutcome> = (0..options.iterations)
        .into_par_iter()
        .map(|episode| {
            run_episode(level, profile, options.state_seed, options.behavior_seed + u64::from(episode))
        })
        .collect();

    let summary = aggregate(profile, options.iterations, &outcomes);
    log::debug!(
        "simulated {} x{}: clear_rate={:.3} avg_moves={:.1}",
        profile.name,
        options.iterations,
        summary.clear_rate,
        summary.avg_moves
    );
    Ok(summary)
}

fn aggregate(
    profile: &BotProfile,
    iterations: u32,
    outcomes: &[EpisodeOutcome],
) -> ProfileSimulation {
    let internal_errors = outcomes.iter().filter(|o| o.is_internal_error()).count() as u32;
    let completed: Vec<&EpisodeOutcome> =
        outcomes.iter().filter(|o| !o.is_internal_error()).collect();

    let episodes_cleared = completed.iter().filter(|o| o.cleared).count() as u32;
    let episodes_failed = completed.iter().filter(|o| o.failed).count() as u32;

    let moves: Vec<f64> = completed.iter().map(|o| f64::from(o.moves_used)).collect();
    let combos: Vec<f64> = completed.iter().map(|o| f64::from(o.combo_count)).collect();
    let tiles: Vec<f64> = completed.iter().map(|o| f64::from(o.tiles_cleared)).collect();

    ProfileSimulation {
        bot: profile.kind,
        bot_name: profile.name.clone(),
        iterations,
        clear_rate: if iterations == 0 {
            0.0
        } else {
            f64::from(episodes_cleared) / f64::from(iterations)
        },
        avg_moves: mean(&moves),
        min_moves: completed.iter().map(|o| o.moves_used).min().unwrap_or(0),
        max_moves_used: completed.iter().map(|o| o.moves_used).max().unwrap_or(0),
        std_moves: sample_std(&moves),
        avg_combo: mean(&combos),
        avg_tiles_cleared: mean(&tiles),
        episodes_cleared,
        episodes_failed,
        internal_errors,
    }
}
