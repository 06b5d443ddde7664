//! # motion-planner
//!
//! Look-ahead velocity planning for multi-axis CNC and 3D-printer motion,
//! `no_std` and allocation free.
//!
//! ## Features
//!
//! - **Look-ahead planning**: Entry speeds optimized over a fixed ring of
//!   queued line motions with incremental re-planning
//! - **Junction deviation cornering**: Corner speeds limited by a virtual
//!   arc and the per-axis acceleration limits
//! - **Lock-free SPSC**: Producer and consumer handles that share the ring
//!   through atomics only, safe for interrupt contexts
//! - **Runtime overrides**: Feed and rapid overrides re-plan queued blocks
//! - **Configuration-driven**: Axis limits from TOML files
//!
//! ## Quick Start
//!
//! ```rust
//! use motion_planner::{Planner, PlanLineData, PlannerSettings};
//!
//! let mut planner = Planner::new(PlannerSettings::default());
//! let (mut producer, consumer) = planner.split();
//!
//! producer.buffer_line(&[20.0, 0.0, 0.0, 0.0], &PlanLineData::feed(400.0))?;
//! producer.buffer_line(&[20.0, 20.0, 0.0, 0.0], &PlanLineData::rapid())?;
//!
//! let profile = consumer.current_profile().unwrap();
//! assert!(profile.peak_speed <= 400.0);
//! # Ok::<(), motion_planner::PlanError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets
//! - `line-numbers`: Carries a program line number in every block

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod config;
pub mod error;
pub mod motion;
pub mod planner;

/// Number of axes the planner controls.
pub const N_AXIS: usize = 4;
/// Index of the X axis.
pub const X_AXIS: usize = 0;
/// Index of the Y axis.
pub const Y_AXIS: usize = 1;
/// Index of the Z axis.
pub const Z_AXIS: usize = 2;
/// Index of the extruder axis.
pub const E_AXIS: usize = 3;

// Re-exports for ergonomic API
pub use config::{validate_config, AxisConfig, MachineConfig, PlannerSettings};
pub use error::{ConfigError, Error, PlanError, Result};
pub use motion::{BlockProfile, MotionPhase};
pub use planner::{
    Condition, ConditionFlag, Consumer, HoldPoint, PlanBlock, PlanLineData, Planner, Producer,
};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Millimeters, MmPerMin, MmPerSec2, StepsPerMm};
