//! Unit tests for configuration parsing.

use motion_planner::config::{parse_config, MachineConfig, PlannerSettings};
use motion_planner::error::{ConfigError, Error};
use motion_planner::Planner;

const PRINTER: &str = r#"
junction_deviation_mm = 0.05

[[axis]]
name = "X"
steps_per_mm = 80.0
max_rate_mm_per_min = 12000.0
acceleration_mm_per_sec2 = 1500.0

[[axis]]
name = "Y"
steps_per_mm = 80.0
max_rate_mm_per_min = 12000.0
acceleration_mm_per_sec2 = 1500.0

[[axis]]
name = "Z"
steps_per_mm = 400.0
max_rate_mm_per_min = 600.0
acceleration_mm_per_sec2 = 100.0

[[axis]]
name = "E"
steps_per_mm = 93.0
max_rate_mm_per_min = 3000.0
acceleration_mm_per_sec2 = 5000.0
"#;

/// Test a full printer configuration parses into planner units.
#[test]
fn test_parse_printer_config() {
    let config = parse_config(PRINTER).expect("printer config should parse");

    assert_eq!(config.axis_names().collect::<Vec<_>>(), ["X", "Y", "Z", "E"]);
    assert_eq!(config.axis_index("Z"), Some(2));
    assert!((config.junction_deviation.0 - 0.05).abs() < 1e-6);

    let settings = PlannerSettings::from_config(&config);
    assert!((settings.acceleration[2] - 100.0 * 3600.0).abs() < 1e-2);
    assert!((settings.max_rate[0] - 12000.0).abs() < 1e-3);
    assert_eq!(settings.mm_to_steps(&[1.0, 1.0, 1.0, 1.0]), [80, 80, 400, 93]);
}

/// Test a parsed configuration drives the planner.
#[test]
fn test_parsed_config_builds_planner() {
    let config = parse_config(PRINTER).unwrap();
    let mut planner = Planner::from_config(&config).unwrap();
    let (mut tx, rx) = planner.split();

    tx.buffer_line(
        &[0.0, 0.0, 1.0, 0.0],
        &motion_planner::PlanLineData::rapid(),
    )
    .unwrap();
    let block = rx.current_block().unwrap();
    assert_eq!(block.steps(), &[0, 0, 400, 0]);
    assert!((block.rapid_rate() - 600.0).abs() < 1e-3);
}

/// Test a missing `[[axis]]` table is a parse error.
#[test]
fn test_too_few_axes() {
    let three_axes = PRINTER.rsplit_once("[[axis]]").unwrap().0;
    let result = parse_config(three_axes);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ParseError(_)))
    ));
}

/// Test a non-numeric value is a parse error.
#[test]
fn test_wrong_value_type() {
    let bad = PRINTER.replace("steps_per_mm = 400.0", "steps_per_mm = \"fast\"");
    assert!(matches!(
        parse_config(&bad),
        Err(Error::Config(ConfigError::ParseError(_)))
    ));
}

/// Test the default configuration matches the documented machine.
#[test]
fn test_default_config() {
    let config = MachineConfig::default();
    assert_eq!(config.axes.len(), motion_planner::N_AXIS);
    assert!(config.axis("X").is_some());
    assert!(config.axis("W").is_none());
    assert!(motion_planner::validate_config(&config).is_ok());
}
