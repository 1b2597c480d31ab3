//! Bot archetypes: parameter profiles for the five simulated skill tiers.

use serde::{Deserialize, Serialize};

/// Player skill tier, ordered weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotKind {
    Novice,
    Casual,
    Average,
    Expert,
    Optimal,
}

impl BotKind {
    /// All tiers in skill order.
    pub const ALL: [BotKind; 5] = [
        BotKind::Novice,
        BotKind::Casual,
        BotKind::Average,
        BotKind::Expert,
        BotKind::Optimal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BotKind::Novice => "novice",
            BotKind::Casual => "casual",
            BotKind::Average => "average",
            BotKind::Expert => "expert",
            BotKind::Optimal => "optimal",
        }
    }
}

impl std::fmt::Display for BotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Behavior parameters of one simulated player archetype.
///
/// All rate-like fields live in `[0, 1]`; `lookahead_depth` is a small
/// non-negative integer. `weight` only matters downstream, when the
/// assessor folds per-bot results into one difficulty score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotProfile {
    pub name: String,
    pub kind: BotKind,

    /// Probability of discarding the scored ranking for a random legal move.
    pub mistake_rate: f64,
    /// One-ply tie-break depth; 0 disables the lookahead comparison.
    pub lookahead_depth: u32,
    pub goal_priority: f64,
    pub blocking_awareness: f64,
    pub chain_preference: f64,
    /// Below 0.5 the bot settles for one of the top `ceil(n·patience)` moves.
    pub patience: f64,
    pub risk_tolerance: f64,
    /// Drives the attention filter, the match-width bonus and the noise
    /// term; at 0.99 and above the bot makes no RNG draw at all.
    pub pattern_recognition: f64,
    /// Assessor weight of this archetype.
    pub weight: f64,
}

impl BotProfile {
    /// The predefined profile of a skill tier.
    pub fn predefined(kind: BotKind) -> BotProfile {
        match kind {
            BotKind::Novice => BotProfile {
                name: "Novice Bot".to_string(),
                kind,
                mistake_rate: 0.40,
                lookahead_depth: 0,
                goal_priority: 0.30,
                blocking_awareness: 0.20,
                chain_preference: 0.10,
                patience: 0.30,
                risk_tolerance: 0.70,
                pattern_recognition: 0.20,
                weight: 0.5,
            },
            BotKind::Casual => BotProfile {
                name: "Casual Bot".to_string(),
                kind,
                mistake_rate: 0.20,
                lookahead_depth: 1,
                goal_priority: 0.50,
                blocking_awareness: 0.40,
                chain_preference: 0.30,
                patience: 0.40,
                risk_tolerance: 0.50,
                pattern_recognition: 0.40,
                weight: 1.0,
            },
            BotKind::Average => BotProfile {
                name: "Average Bot".to_string(),
                kind,
                mistake_rate: 0.10,
                lookahead_depth: 2,
                goal_priority: 0.70,
                blocking_awareness: 0.70,
                chain_preference: 0.60,
                patience: 0.50,
                risk_tolerance: 0.40,
                pattern_recognition: 0.60,
                weight: 1.5,
            },
            BotKind::Expert => BotProfile {
                name: "Expert Bot".to_string(),
                kind,
                mistake_rate: 0.03,
                lookahead_depth: 4,
                goal_priority: 0.90,
                blocking_awareness: 0.90,
                chain_preference: 0.80,
                patience: 0.70,
                risk_tolerance: 0.30,
                pattern_recognition: 0.80,
                weight: 0.8,
            },
            BotKind::Optimal => BotProfile {
                name: "Optimal Bot".to_string(),
                kind,
                mistake_rate: 0.0,
                lookahead_depth: 8,
                goal_priority: 1.0,
                blocking_awareness: 1.0,
                chain_preference: 1.0,
                patience: 1.0,
                risk_tolerance: 0.20,
                pattern_recognition: 1.0,
                weight: 0.3,
            },
        }
    }

    /// A renamed copy of a predefined profile, ready for field overrides.
    pub fn derived(name: &str, base: BotKind) -> BotProfile {
        BotProfile { name: name.to_string(), ..BotProfile::predefined(base) }
    }

    /// A draw-free bot is a pure function of the state: no mistake roll, no
    /// attention filter, no noise term.
    pub fn is_draw_free(&self) -> bool {
        self.pattern_recognition >= 0.99
    }
}

/// The set of bots one assessment runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotTeam {
    pub profiles: Vec<BotProfile>,
    pub iterations_per_bot: u32,
}

impl BotTeam {
    /// All five archetypes.
    pub fn default_team(iterations_per_bot: u32) -> BotTeam {
        BotTeam {
            profiles: BotKind::ALL.iter().map(|kind| BotProfile::predefined(*kind)).collect(),
            iterations_per_bot,
        }
    }

    /// The three tiers a casual-audience level targets.
    pub fn casual_team(iterations_per_bot: u32) -> BotTeam {
        BotTeam {
            profiles: [BotKind::Novice, BotKind::Casual, BotKind::Average]
                .iter()
                .map(|kind| BotProfile::predefined(*kind))
                .collect(),
            iterations_per_bot,
        }
    }

    /// The three strongest tiers.
    pub fn hardcore_team(iterations_per_bot: u32) -> BotTeam {
        BotTeam {
            profiles: [BotKind::Average, BotKind::Expert, BotKind::Optimal]
                .iter()
                .map(|kind| BotProfile::predefined(*kind))
                .collect(),
            iterations_per_bot,
        }
    }

    pub fn total_iterations(&self) -> u32 {
        self.profiles.len() as u32 * self.iterations_per_bot
    }
}
