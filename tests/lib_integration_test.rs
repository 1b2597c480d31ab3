//! Integration tests for the tilelab library public API

use assert_matches::assert_matches;
use tilelab::{
    assess::{assess_level, AssessmentOptions, DifficultyGrade},
    bot::BotTeam,
    level::Level,
    Result, TileLabError, DESCRIPTION, NAME, VERSION,
};

#[test]
fn test_library_metadata() {
    assert!(!VERSION.is_empty());
    assert_eq!(NAME, "tilelab");
    assert!(!DESCRIPTION.is_empty());
}

#[test]
fn test_error_types() {
    let level_error = TileLabError::InvalidLevel("test level error".to_string());
    assert_matches!(level_error, TileLabError::InvalidLevel(_));

    let invariant_error = TileLabError::Invariant("test invariant error".to_string());
    assert_matches!(invariant_error, TileLabError::Invariant(_));

    let replay_error = TileLabError::Replay("test replay error".to_string());
    assert_matches!(replay_error, TileLabError::Replay(_));
}

#[test]
fn test_result_type_alias() {
    let success: Result<i32> = Ok(42);
    assert!(success.is_ok());
    assert_eq!(success.unwrap(), 42);

    let failure: Result<i32> = Err(TileLabError::InvalidLevel("test".to_string()));
    assert!(failure.is_err());
}

#[test]
fn test_assess_from_json_level() {
    let json = r#"{
        "layers": [
            {
                "cols": 3,
                "rows": 3,
                "tiles": {
                    "0_0": {"tile": "t1"}, "1_0": {"tile": "t2"}, "2_0": {"tile": "t3"},
                    "0_1": {"tile": "t1"}, "1_1": {"tile": "t2"}, "2_1": {"tile": "t3"},
                    "0_2": {"tile": "t1"}, "1_2": {"tile": "t2"}, "2_2": {"tile": "t3"}
                }
            }
        ],
        "maxMoves": 9,
        "useTileCount": 3,
        "randSeed": 42
    }"#;
    let level = Level::from_json(json).expect("the level JSON should parse");

    let report = assess_level(&level, &BotTeam::default_team(25), AssessmentOptions::default())
        .expect("assessment should run");
    assert_eq!(report.bot_results.len(), 5);
    assert_eq!(report.grade, DifficultyGrade::from_score(report.overall_difficulty));

    let serialized = serde_json::to_string(&report).expect("reports serialize");
    assert!(serialized.contains("overall_difficulty"));
}

#[test]
fn test_malformed_level_is_rejected_up_front() {
    let level = Level::from_json(r#"{"layers": [], "maxMoves": 10}"#);
    assert_matches!(level, Err(TileLabError::InvalidLevel(_)));
}
