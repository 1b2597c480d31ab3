pub mod attention;
pub mod profile;
pub mod scoring;
pub mod selection;

pub use profile::{BotKind, BotProfile, BotTeam};
pub use selection::{select_move, DecisionReason};
