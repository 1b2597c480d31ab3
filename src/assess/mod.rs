pub mod assessor;
pub mod target;

pub use assessor::{
    assess_level, detailed_assess, quick_assess, AssessmentOptions, AssessmentReport,
    BotAssessment, DifficultyGrade, TargetMatch,
};
pub use target::{match_score, target_clear_rates};
