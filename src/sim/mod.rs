pub mod driver;
pub mod episode;
pub mod stats;
pub mod trace;

pub use driver::{simulate_profile, ProfileSimulation, SimulationOptions};
pub use episode::{run_episode, run_episode_traced, EpisodeOutcome};
pub use trace::{replay_trace, MoveTrace};
