//! Target clear-rate curves: what each archetype should score on a level of
//! a requested difficulty, and how closely a simulated level matches.

use std::collections::BTreeMap;

use crate::bot::profile::BotKind;

/// Per-bot expected clear rates for a `target_difficulty` in `[0, 1]`.
///
/// Calibrated piecewise: easy levels push every tier toward 0.99, the
/// transition zone separates the tiers, and hard levels drop the weak tiers
/// steeply while optimal stays near its ceiling.
pub fn target_clear_rates(target_difficulty: f64) -> BTreeMap<BotKind, f64> {
    let difficulty = target_difficulty.clamp(0.0, 1.0);

    let rates: [(BotKind, f64); 5] = if difficulty <= 0.4 {
        let t = difficulty / 0.4;
        [
            (BotKind::Novice, 0.99 - t * 0.20),
            (BotKind::Casual, 0.99 - t * 0.15),
            (BotKind::Average, 0.99 - t * 0.10),
            (BotKind::Expert, 0.99 - t * 0.05),
            (BotKind::Optimal, 0.99 - t * 0.01),
        ]
    } else if difficulty <= 0.6 {
        let t = (difficulty - 0.4) / 0.2;
        [
            (BotKind::Novice, lerp(0.79, 0.55, t)),
            (BotKind::Casual, lerp(0.84, 0.70, t)),
            (BotKind::Average, lerp(0.89, 0.82, t)),
            (BotKind::Expert, lerp(0.94, 0.92, t)),
            (BotKind::Optimal, lerp(0.98, 0.98, t)),
        ]
    } else {
        let t = (difficulty - 0.6) / 0.4;
        [
            (BotKind::Novice, lerp(0.55, 0.10, t)),
            (BotKind::Casual, lerp(0.70, 0.25, t)),
            (BotKind::Average, lerp(0.82, 0.50, t)),
            (BotKind::Expert, lerp(0.92, 0.75, t)),
            (BotKind::Optimal, lerp(0.98, 0.88, t)),
        ]
    };

    rates
        .into_iter()
        .map(|(bot, rate)| (bot, rate.clamp(0.01, 0.99)))
        .collect()
}

fn lerp(start: f64, end: f64, t: f64) -> f64 {
    start - t * (start - end)
}

/// Match score between simulated and target clear rates.
///
/// Gaps are absolute differences in percentage points over the target's
/// bots. Returns `(match_score, avg_gap, max_gap)` with
/// `match_score = max(0, 100 − 2·(0.6·avg_gap + 0.4·max_gap))`.
pub fn match_score(
    actual: &BTreeMap<BotKind, f64>,
    target: &BTreeMap<BotKind, f64>,
) -> (f64, f64, f64) {
    let gaps: Vec<f64> = target
        .iter()
        .map(|(bot, expected)| {
            let observed = actual.get(bot).copied().unwrap_or(0.0);
            (observed - expected).abs() * 100.0
        })
        .collect();

    if gaps.is_empty() {
        return (100.0, 0.0, 0.0);
    }

    let avg_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;
    let max_gap = gaps.iter().fold(0.0f64, |a, b| a.max(*b));
    let weighted_gap = avg_gap * 0.6 + max_gap * 0.4;
    ((100.0 - weighted_gap * 2.0).max(0.0), avg_gap, max_gap)
}
