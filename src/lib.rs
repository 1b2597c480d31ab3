//! # tilelab Core Library
//!
//! Deterministic rules engine and Monte Carlo multi-bot simulator for a layered
//! tile-matching puzzle, used as the core of a level-design workbench.
//!
//! ## Features
//!
//! - **Board Model**: Immutable level descriptions and per-episode simulation state
//! - **Rules Engine**: Move enumeration, dock-based matching and obstacle propagation
//! - **Bot Policy**: Five player archetypes with weighted heuristic move selection
//! - **Simulation Driver**: Reproducible, data-parallel episode batches
//! - **Assessor**: Difficulty grading and target clear-rate matching
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tilelab::{
//!     assess::{assess_level, AssessmentOptions},
//!     bot::BotTeam,
//!     level::Level,
//! };
//!
//! let json = r#"{"layers": [{"cols": 1, "rows": 1, "tiles": {}}], "maxMoves": 10}"#;
//! let level = Level::from_json(json).unwrap();
//! let report = assess_level(&level, &BotTeam::default_team(100), AssessmentOptions::default());
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Immutable level description, parsing and validation
pub mod level;

/// Mutable simulation state and level expansion
pub mod board;

/// Game rules: move enumeration, application and termination
pub mod rules;

/// Bot archetypes and move selection policy
pub mod bot;

/// Monte Carlo episode driver and move traces
pub mod sim;

/// Multi-bot difficulty assessment
pub mod assess;

/// Logging setup
pub mod logging;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the tilelab library
#[derive(Debug, thiserror::Error)]
pub enum TileLabError {
    #[error("invalid level: {0}")]
    InvalidLevel(String),

    #[error("internal invariant violation: {0}")]
    Invariant(String),

    #[error("trace replay mismatch: {0}")]
    Replay(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TileLabError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
