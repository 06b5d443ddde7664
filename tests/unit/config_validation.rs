//! Unit tests for configuration validation.

use motion_planner::config::{parse_config, validate_config, MachineConfig};
use motion_planner::config::units::{MmPerMin, MmPerSec2};
use motion_planner::error::{ConfigError, Error};

fn config_with_axis_line(axis: &str, line: &str) -> String {
    let mut toml_str = String::from("junction_deviation_mm = 0.01\n");
    for name in ["X", "Y", "Z", "E"] {
        toml_str.push_str("\n[[axis]]\n");
        toml_str.push_str(&format!("name = \"{name}\"\n"));
        if name == axis {
            toml_str.push_str(line);
        } else {
            toml_str.push_str("steps_per_mm = 250.0\n");
            toml_str.push_str("max_rate_mm_per_min = 500.0\n");
            toml_str.push_str("acceleration_mm_per_sec2 = 10.0\n");
        }
    }
    toml_str
}

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    let config = MachineConfig::default();
    assert!(validate_config(&config).is_ok());
}

/// Test a zero max rate is reported with its axis.
#[test]
fn test_zero_max_rate() {
    let toml_str = config_with_axis_line(
        "Y",
        "steps_per_mm = 250.0\nmax_rate_mm_per_min = 0.0\nacceleration_mm_per_sec2 = 10.0\n",
    );
    let result = parse_config(&toml_str);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidMaxRate { axis: 1, .. }))
    ));
}

/// Test a negative acceleration is reported with its axis.
#[test]
fn test_negative_acceleration() {
    let mut config = MachineConfig::default();
    config.axes[3].acceleration = MmPerSec2(-5.0);
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidAcceleration { axis: 3, .. }))
    ));
}

/// Test a non-finite rate is rejected.
#[test]
fn test_infinite_max_rate() {
    let mut config = MachineConfig::default();
    config.axes[0].max_rate = MmPerMin(f32::INFINITY);
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidMaxRate { axis: 0, .. }))
    ));
}

/// Test steps per mm is checked while deserializing.
#[test]
fn test_negative_steps_per_mm() {
    let toml_str = config_with_axis_line(
        "Z",
        "steps_per_mm = -1.0\nmax_rate_mm_per_min = 500.0\nacceleration_mm_per_sec2 = 10.0\n",
    );
    assert!(parse_config(&toml_str).is_err());
}

/// Test junction deviation bounds: zero is allowed, negative is not.
#[test]
fn test_junction_deviation_bounds() {
    let zero = config_with_axis_line("", "").replace("0.01", "0.0");
    assert!(parse_config(&zero).is_ok());

    let negative = config_with_axis_line("", "").replace("0.01", "-0.01");
    assert!(matches!(
        parse_config(&negative),
        Err(Error::Config(ConfigError::InvalidJunctionDeviation(_)))
    ));
}
