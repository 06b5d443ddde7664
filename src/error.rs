//! Error types for motion-planner.
//!
//! Planning rejections are ordinary results, not faults: the caller decides
//! whether to retry. Configuration errors only occur while loading settings.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all motion-planner operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Block was rejected by the planner
    Plan(PlanError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Steps per millimeter must be > 0
    InvalidStepsPerMm {
        /// Axis index
        axis: usize,
        /// Offending value
        value: f32,
    },
    /// Maximum rate must be > 0
    InvalidMaxRate {
        /// Axis index
        axis: usize,
        /// Offending value
        value: f32,
    },
    /// Acceleration must be > 0
    InvalidAcceleration {
        /// Axis index
        axis: usize,
        /// Offending value
        value: f32,
    },
    /// Junction deviation must be >= 0
    InvalidJunctionDeviation(f32),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Reasons a line motion is not queued.
///
/// None is fatal and the planner state is untouched when one is
/// returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanError {
    /// No free slot in the block buffer; retry after a block completes.
    BufferFull,
    /// Target is the current position (zero steps on every axis); skip it.
    EmptyBlock,
    /// Target is too far from the current position to count in steps.
    TargetOutOfRange,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Plan(e) => write!(f, "Planner error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidStepsPerMm { axis, value } => {
                write!(f, "Invalid steps/mm on axis {}: {}. Must be > 0", axis, value)
            }
            ConfigError::InvalidMaxRate { axis, value } => {
                write!(f, "Invalid max rate on axis {}: {}. Must be > 0", axis, value)
            }
            ConfigError::InvalidAcceleration { axis, value } => {
                write!(f, "Invalid acceleration on axis {}: {}. Must be > 0", axis, value)
            }
            ConfigError::InvalidJunctionDeviation(v) => {
                write!(f, "Invalid junction deviation: {}. Must be >= 0", v)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::BufferFull => write!(f, "Block buffer is full"),
            PlanError::EmptyBlock => write!(f, "Zero-length block"),
            PlanError::TargetOutOfRange => write!(f, "Target out of step range"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<PlanError> for Error {
    fn from(e: PlanError) -> Self {
        Error::Plan(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for PlanError {}
