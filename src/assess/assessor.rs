//! Multi-bot difficulty assessment: run the driver across a team, weight
//! the results into one difficulty score, grade it, and measure the fit
//! against a requested target difficulty.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::assess::target::{match_score, target_clear_rates};
use crate::bot::profile::{BotKind, BotTeam};
use crate::level::level::Level;
use crate::sim::driver::{simulate_profile, ProfileSimulation, SimulationOptions};
use crate::sim::stats::population_variance;
use crate::Result;

/// S (trivial) through D (brutal), from the 0-100 difficulty score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyGrade {
    S,
    A,
    B,
    C,
    D,
}

impl DifficultyGrade {
    pub fn from_score(score: f64) -> Self {
        if score <= 20.0 {
            DifficultyGrade::S
        } else if score <= 40.0 {
            DifficultyGrade::A
        } else if score <= 60.0 {
            DifficultyGrade::B
        } else if score <= 80.0 {
            DifficultyGrade::C
        } else {
            DifficultyGrade::D
        }
    }
}

impl fmt::Display for DifficultyGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DifficultyGrade::S => "S",
            DifficultyGrade::A => "A",
            DifficultyGrade::B => "B",
            DifficultyGrade::C => "C",
            DifficultyGrade::D => "D",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssessmentOptions {
    /// Base seed: the shared initial-state seed and the root of each bot's
    /// behavior seed stream.
    pub seed: u64,
    /// When set, the report includes the fit against the target clear-rate
    /// curve at this difficulty.
    pub target_difficulty: Option<f64>,
}

impl Default for AssessmentOptions {
    fn default() -> Self {
        Self { seed: 42, target_difficulty: None }
    }
}

/// One bot's batch plus its difficulty contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotAssessment {
    #[serde(flatten)]
    pub simulation: ProfileSimulation,
    pub difficulty: f64,
    pub weight: f64,
}

/// Fit against the target clear-rate curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetMatch {
    pub target_difficulty: f64,
    pub target_clear_rates: BTreeMap<BotKind, f64>,
    /// Average per-bot gap in percentage points.
    pub avg_gap: f64,
    pub max_gap: f64,
    /// 0-100; higher is a closer fit.
    pub match_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// Per-bot results in skill order.
    pub bot_results: Vec<BotAssessment>,
    pub overall_difficulty: f64,
    pub grade: DifficultyGrade,
    /// Spread of per-bot difficulty scores.
    pub difficulty_variance: f64,
    /// 0-1: how closely the per-bot clear rates track the ideal ladder.
    pub balance_score: f64,
    pub recommended_moves: u32,
    /// The archetype whose clear rate lands closest to 70%.
    pub target_audience: BotKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetMatch>,
    pub recommendations: Vec<String>,
}

/// Ideal per-tier clear rates for a well-balanced level.
const IDEAL_CLEAR_RATES: [(BotKind, f64); 5] = [
    (BotKind::Novice, 0.40),
    (BotKind::Casual, 0.60),
    (BotKind::Average, 0.75),
    (BotKind::Expert, 0.90),
    (BotKind::Optimal, 0.98),
];

/// Gaps beyond this many percentage points earn a per-bot callout.
const GAP_CALLOUT_THRESHOLD: f64 = 15.0;

/// Assess a level with a team of bots.
///
/// Every bot simulates against the same initial board (`options.seed` is the
/// shared state seed); bot `i` draws behavior randomness from a stream
/// rooted at `seed + i`.
pub fn assess_level(
    level: &Level,
    team: &BotTeam,
    options: AssessmentOptions,
) -> Result<AssessmentReport> {
    level.validate()?;

    let mut bot_results: Vec<BotAssessment> = team
        .profiles
        .par_iter()
        .enumerate()
        .map(|(index, profile)| {
            let simulation = simulate_profile(
                level,
                profile,
                SimulationOptions {
                    iterations: team.iterations_per_bot,
                    state_seed: options.seed,
                    behavior_seed: options.seed + index as u64,
                },
            )?;
            let difficulty = bot_difficulty(&simulation, level.max_moves);
            Ok(BotAssessment { simulation, difficulty, weight: profile.weight })
        })
        .collect::<Result<Vec<_>>>()?;
    bot_results.sort_by_key(|result| result.simulation.bot);

    let total_weight: f64 = bot_results.iter().map(|r| r.weight).sum();
    let overall_difficulty = if total_weight > 0.0 {
        bot_results.iter().map(|r| r.difficulty * r.weight).sum::<f64>() / total_weight
    } else {
        50.0
    };
    let difficulties: Vec<f64> = bot_results.iter().map(|r| r.difficulty).collect();

    let actual_rates: BTreeMap<BotKind, f64> = bot_results
        .iter()
        .map(|r| (r.simulation.bot, r.simulation.clear_rate))
        .collect();

    let target = options.target_difficulty.map(|difficulty| {
        let expected = target_clear_rates(difficulty);
        let (score, avg_gap, max_gap) = match_score(&actual_rates, &expected);
        TargetMatch {
            target_difficulty: difficulty,
            target_clear_rates: expected,
            avg_gap,
            max_gap,
            match_score: score,
        }
    });

    let report = AssessmentReport {
        recommendations: build_recommendations(&actual_rates, target.as_ref()),
        overall_difficulty,
        grade: DifficultyGrade::from_score(overall_difficulty),
        difficulty_variance: population_variance(&difficulties),
        balance_score: balance_score(&actual_rates),
        recommended_moves: recommended_moves(&bot_results, level.max_moves),
        target_audience: target_audience(&actual_rates),
        target,
        bot_results,
    };
    log::info!(
        "assessment finished: difficulty={:.1} grade={} balance={:.2}",
        report.overall_difficulty,
        report.grade,
        report.balance_score
    );
    Ok(report)
}

/// Quick assessment for live editing feedback: the casual-audience team with
/// a reduced iteration count.
pub fn quick_assess(level: &Level, iterations: u32, options: AssessmentOptions) -> Result<AssessmentReport> {
    assess_level(level, &BotTeam::casual_team(iterations), options)
}

/// High-confidence assessment before publishing: the full team with a high
/// iteration count.
pub fn detailed_assess(level: &Level, iterations: u32, options: AssessmentOptions) -> Result<AssessmentReport> {
    assess_level(level, &BotTeam::default_team(iterations), options)
}

/// Per-bot difficulty in `[0, 100]`: mostly the failure rate, plus move
/// budget usage and run-to-run variance.
fn bot_difficulty(simulation: &ProfileSimulation, max_moves: u32) -> f64 {
    let clear_part = (1.0 - simulation.clear_rate) * 60.0;
    let move_part = if simulation.avg_moves > 0.0 {
        (simulation.avg_moves / f64::from(max_moves)).min(1.0) * 30.0
    } else {
        30.0
    };
    let variance_part = (simulation.std_moves / 10.0).min(1.0) * 10.0;
    (clear_part + move_part + variance_part).min(100.0)
}

fn balance_score(actual_rates: &BTreeMap<BotKind, f64>) -> f64 {
    let deviations: Vec<f64> = IDEAL_CLEAR_RATES
        .iter()
        .filter_map(|(bot, ideal)| actual_rates.get(bot).map(|rate| (rate - ideal).abs()))
        .collect();
    if deviations.is_empty() {
        return 1.0;
    }
    let avg = deviations.iter().sum::<f64>() / deviations.len() as f64;
    (1.0 - avg * 2.0).max(0.0)
}

fn target_audience(actual_rates: &BTreeMap<BotKind, f64>) -> BotKind {
    actual_rates
        .iter()
        .min_by(|(_, a), (_, b)| {
            (*a - 0.7).abs().partial_cmp(&(*b - 0.7).abs()).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(bot, _)| *bot)
        .unwrap_or(BotKind::Average)
}

/// Recommended move budget, derived from the Average bot: trim it when the
/// level is comfortable, extend it when the tier struggles.
fn recommended_moves(bot_results: &[BotAssessment], max_moves: u32) -> u32 {
    for result in bot_results {
        if result.simulation.bot == BotKind::Average {
            let avg = result.simulation.avg_moves;
            return if result.simulation.clear_rate > 0.8 {
                ((avg * 0.9) as u32).max(15)
            } else if result.simulation.clear_rate < 0.6 {
                ((avg * 1.2) as u32).min(50)
            } else {
                avg as u32
            };
        }
    }
    if bot_results.is_empty() {
        return max_moves;
    }
    let avg =
        bot_results.iter().map(|r| r.simulation.avg_moves).sum::<f64>() / bot_results.len() as f64;
    avg as u32
}

fn build_recommendations(
    actual_rates: &BTreeMap<BotKind, f64>,
    target: Option<&TargetMatch>,
) -> Vec<String> {
    let mut recommendations = Vec::new();
    let rate = |bot: BotKind| actual_rates.get(&bot).copied();

    if rate(BotKind::Expert).is_some_and(|r| r > 0.95) {
        recommendations.push("Level may be too easy for expert players.".to_string());
    }
    if rate(BotKind::Casual).is_some_and(|r| r < 0.3) {
        recommendations.push("Level may be too hard for casual players.".to_string());
    }
    if let (Some(novice), Some(average)) = (rate(BotKind::Novice), rate(BotKind::Average)) {
        if average - novice > 0.5 {
            recommendations.push(
                "Difficulty gap between novice and average players is large; consider softening the obstacle layering.".to_string(),
            );
        }
    }
    if let Some(average) = rate(BotKind::Average) {
        if average < 0.5 {
            recommendations.push(format!(
                "Average-player clear rate is low ({:.0}%); consider lowering the difficulty.",
                average * 100.0
            ));
        } else if average > 0.9 {
            recommendations.push(format!(
                "Average-player clear rate is high ({:.0}%); raise the difficulty for more challenge.",
                average * 100.0
            ));
        }
    }

    if let Some(target) = target {
        for (bot, expected) in &target.target_clear_rates {
            let Some(observed) = actual_rates.get(bot) else {
                continue;
            };
            let gap = (observed - expected) * 100.0;
            if gap.abs() > GAP_CALLOUT_THRESHOLD {
                let direction = if gap > 0.0 { "above" } else { "below" };
                recommendations.push(format!(
                    "{bot} clear rate is {:.0} points {direction} target ({:.0}% vs {:.0}%).",
                    gap.abs(),
                    observed * 100.0,
                    expected * 100.0
                ));
            }
        }
    }

    recommendations
}
