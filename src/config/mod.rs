//! Configuration module for motion-planner.
//!
//! Provides types for loading and validating machine axis settings from
//! TOML files (with `std` feature) or pre-built values, and the derived
//! [`PlannerSettings`] the planner reads.

mod axis;
#[cfg(feature = "std")]
mod loader;
mod machine;
mod settings;
pub mod units;
mod validation;

pub use axis::AxisConfig;
pub use machine::MachineConfig;
pub use settings::PlannerSettings;
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Millimeters, MmPerMin, MmPerSec2, StepsPerMm};
